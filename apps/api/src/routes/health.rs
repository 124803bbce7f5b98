use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status, version, and the active interview modes.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let sessions = state.interviewer.active_sessions().await;
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "interview-api",
        "question_source": state.config.question_source,
        "evaluation_mode": state.config.evaluation_mode,
        "archive_enabled": state.interviewer.archive_enabled(),
        "sessions": sessions
    }))
}
