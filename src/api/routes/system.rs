//! System handlers: health and version.

use crate::api::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

/// GET /health - Health check
pub async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// GET /version - Build metadata
pub async fn version(State(state): State<AppState>) -> impl IntoResponse {
    Json((*state.build).clone())
}
