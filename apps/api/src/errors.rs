use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::interview::InterviewError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Interview(#[from] InterviewError),
}

/// Malformed or mistyped request bodies get the same envelope as every other error.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Interview(e) => match e {
                InterviewError::ConfigurationInvalid(msg) => (
                    StatusCode::BAD_REQUEST,
                    "INVALID_CONFIGURATION",
                    format!("Sorry, that interview setup is not valid: {msg}."),
                ),
                InterviewError::EmptyAnswer => (
                    StatusCode::BAD_REQUEST,
                    "EMPTY_ANSWER",
                    "Your answer is empty. Please type a response to the question.".to_string(),
                ),
                InterviewError::NoActiveSession => (
                    StatusCode::CONFLICT,
                    "NO_ACTIVE_INTERVIEW",
                    "There is no interview in progress. Start a new one to continue.".to_string(),
                ),
                InterviewError::GenerationFailed { .. } => {
                    tracing::error!("Question generation failed: {e}");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "GENERATION_FAILED",
                        "Sorry, we could not prepare the next question. Please try again in a moment."
                            .to_string(),
                    )
                }
                InterviewError::InvalidTransition(detail) => {
                    tracing::error!("Invalid session transition: {detail}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INVALID_TRANSITION",
                        "Sorry, something went wrong with your interview. Please start a new one."
                            .to_string(),
                    )
                }
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
