//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::infrastructure::dto::http::StatusDto;

use super::super::state::AppState;

/// Status endpoint with process-wide counters
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusDto> {
    let stats = state.manager.stats().await;

    Json(StatusDto {
        message: "Parlor chat server is running".to_string(),
        status: "online".to_string(),
        users: stats.users,
        total_messages: stats.total_messages,
    })
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}
