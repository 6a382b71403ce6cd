//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};

use crate::{infrastructure::dto::websocket::MessageDto, ui::state::AppState};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get the most recent messages, newest first
pub async fn get_messages(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MessageDto>>, (StatusCode, &'static str)> {
    match state.get_recent_messages_usecase.execute().await {
        Ok(messages) => {
            // Domain Model から DTO への変換
            let messages: Vec<MessageDto> = messages.into_iter().map(MessageDto::from).collect();
            Ok(Json(messages))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch recent messages");
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Failed to get messages"))
        }
    }
}
