use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Local;
use serde::Deserialize;

use super::{parse_date_param, requester};
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{CenterAvailability, Role, User};
use crate::services::slots::GenerationReport;
use crate::services::{availability, booking, slots};
use crate::state::AppState;

/// Opening a center's calendar is reserved to its owner and to admins.
fn check_center_access(
    state: &Arc<AppState>,
    user: &User,
    center_id: i64,
) -> Result<(), AppError> {
    if user.role == Role::Admin {
        return Ok(());
    }

    let db = state.db.lock().unwrap();
    let center = queries::get_center(&db, center_id)?
        .ok_or_else(|| AppError::NotFound(format!("sport center {center_id} not found")))?;
    if user.role == Role::Owner && center.owner_id == user.id {
        Ok(())
    } else {
        Err(AppError::Permission(
            "only the center owner or an admin may generate slots".to_string(),
        ))
    }
}

// POST /api/booking/bulk-create-day
#[derive(Deserialize)]
pub struct BulkDayRequest {
    pub center_id: i64,
    pub booking_date: String,
}

pub async fn bulk_create_day(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<BulkDayRequest>,
) -> Result<Json<GenerationReport>, AppError> {
    let user = requester(&state, &headers)?;
    check_center_access(&state, &user, body.center_id)?;
    let date = parse_date_param(&body.booking_date, "booking_date")?;

    let mut db = state.db.lock().unwrap();
    let report = slots::generate_day(&mut db, body.center_id, date)?;
    Ok(Json(report))
}

// POST /api/booking/bulk-create-month
#[derive(Deserialize)]
pub struct BulkMonthRequest {
    pub center_id: i64,
    pub year: i32,
    pub month: u32,
}

pub async fn bulk_create_month(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<BulkMonthRequest>,
) -> Result<Json<GenerationReport>, AppError> {
    let user = requester(&state, &headers)?;
    check_center_access(&state, &user, body.center_id)?;

    let today = Local::now().date_naive();
    let mut db = state.db.lock().unwrap();
    let report = slots::generate_month(&mut db, body.center_id, body.year, body.month, today)?;
    Ok(Json(report))
}

// POST /api/booking/bulk-create-range
#[derive(Deserialize)]
pub struct BulkRangeRequest {
    pub center_id: i64,
    pub date_from: String,
    pub date_to: String,
}

pub async fn bulk_create_range(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<BulkRangeRequest>,
) -> Result<Json<GenerationReport>, AppError> {
    let user = requester(&state, &headers)?;
    check_center_access(&state, &user, body.center_id)?;
    let date_from = parse_date_param(&body.date_from, "date_from")?;
    let date_to = parse_date_param(&body.date_to, "date_to")?;

    let mut db = state.db.lock().unwrap();
    let report = slots::generate_range(&mut db, body.center_id, date_from, date_to)?;
    Ok(Json(report))
}

// GET /api/booking/available
#[derive(Deserialize)]
pub struct AvailableQuery {
    pub booking_date: Option<String>,
    pub address: Option<String>,
}

pub async fn available(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailableQuery>,
) -> Result<Json<Vec<CenterAvailability>>, AppError> {
    let date = match query.booking_date.as_deref() {
        Some(raw) => parse_date_param(raw, "booking_date")?,
        None => Local::now().date_naive(),
    };

    let db = state.db.lock().unwrap();
    let result = availability::availability(&db, date, query.address.as_deref())?;
    Ok(Json(result))
}

// POST /api/booking/:id/cancel
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = requester(&state, &headers)?;
    let db = state.db.lock().unwrap();

    if user.role == Role::Admin {
        // Administrative cancellation is terminal; the slot is not reopened.
        if queries::cancel_booking(&db, id)? {
            return Ok(Json(serde_json::json!({"ok": true, "status": "CANCELLED"})));
        }
        return Err(AppError::NotFound(format!(
            "booking {id} is not open or confirmed"
        )));
    }

    booking::release(&db, id, user.id)?;
    Ok(Json(serde_json::json!({"ok": true, "status": "PENDING"})))
}
