use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Local;
use serde::Deserialize;

use super::{parse_date_param, requester};
use crate::errors::AppError;
use crate::models::{BookingStats, BookingStatus};
use crate::services::stats::{self, StatsQuery};
use crate::state::AppState;

// GET /api/booking/stats
#[derive(Deserialize)]
pub struct StatsParams {
    pub preset: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    /// Comma-separated list, e.g. "CONFIRMED,COMPLETED".
    pub statuses: Option<String>,
    pub limit_top_fields: Option<u32>,
}

pub async fn booking_stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<StatsParams>,
) -> Result<Json<BookingStats>, AppError> {
    let user = requester(&state, &headers)?;

    let date_from = params
        .date_from
        .as_deref()
        .map(|raw| parse_date_param(raw, "date_from"))
        .transpose()?;
    let date_to = params
        .date_to
        .as_deref()
        .map(|raw| parse_date_param(raw, "date_to"))
        .transpose()?;
    let statuses = params
        .statuses
        .as_deref()
        .map(parse_statuses)
        .transpose()?;

    let query = StatsQuery {
        preset: params.preset,
        date_from,
        date_to,
        statuses,
        limit_top_fields: params.limit_top_fields,
    };

    let today = Local::now().date_naive();
    let db = state.db.lock().unwrap();
    let result = stats::booking_stats(&db, &user, &query, today)?;
    Ok(Json(result))
}

/// Unlike the lenient storage-side parse, an unknown status in a stats
/// filter is rejected instead of silently becoming PENDING.
fn parse_statuses(raw: &str) -> Result<Vec<BookingStatus>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s.to_uppercase().as_str() {
            "PENDING" => Ok(BookingStatus::Pending),
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            "COMPLETED" => Ok(BookingStatus::Completed),
            other => Err(AppError::Validation(format!(
                "unknown booking status: {other}"
            ))),
        })
        .collect()
}
