use std::sync::Arc;

use crate::config::Config;
use crate::interview::engine::Interviewer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub interviewer: Arc<Interviewer>,
    pub config: Config,
}
