use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Local;
use serde::{Deserialize, Serialize};

use super::requester;
use crate::errors::AppError;
use crate::services::assistant;
use crate::state::AppState;

// POST /api/chat
#[derive(Deserialize)]
pub struct ChatRequest {
    pub q: String,
    pub session_id: Option<String>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub session_id: String,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let user = requester(&state, &headers)?;
    if body.q.trim().is_empty() {
        return Err(AppError::Validation("q must not be empty".to_string()));
    }

    let session_id = body
        .session_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let today = Local::now().date_naive();

    let reply = assistant::answer(&state, &user, &body.q, &session_id, today).await?;
    Ok(Json(ChatResponse { reply, session_id }))
}
