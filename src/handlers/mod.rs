pub mod bookings;
pub mod chat;
pub mod health;
pub mod stats;

use std::sync::Arc;

use axum::http::HeaderMap;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::User;
use crate::state::AppState;

/// The acting user, identified by the X-User-Id header the gateway sets
/// after authentication.
fn requester(state: &Arc<AppState>, headers: &HeaderMap) -> Result<User, AppError> {
    let id: i64 = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| AppError::Permission("missing or malformed X-User-Id header".to_string()))?;

    let db = state.db.lock().unwrap();
    queries::get_user(&db, id)?
        .ok_or_else(|| AppError::Permission(format!("unknown user {id}")))
}

fn parse_date_param(value: &str, name: &str) -> Result<chrono::NaiveDate, AppError> {
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("{name} must be a YYYY-MM-DD date")))
}
