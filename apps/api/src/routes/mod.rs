pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::interview::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/catalog", get(handlers::handle_catalog))
        .route("/api/v1/interviews", post(handlers::handle_start))
        .route(
            "/api/v1/interviews/:user_id",
            get(handlers::handle_status).delete(handlers::handle_abort),
        )
        .route(
            "/api/v1/interviews/:user_id/answers",
            post(handlers::handle_answer),
        )
        .route(
            "/api/v1/interviews/:user_id/history",
            get(handlers::handle_history),
        )
        .with_state(state)
}
