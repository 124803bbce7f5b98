pub mod catalog;
pub mod engine;
pub mod handlers;
pub mod prompts;
pub mod question_bank;
pub mod session;
pub mod store;

use thiserror::Error;

use crate::llm_client::LlmError;

/// Failures of interview operations. None of them leave a session half-updated.
#[derive(Debug, Error)]
pub enum InterviewError {
    #[error("Invalid interview configuration: {0}")]
    ConfigurationInvalid(String),

    #[error("No interview in progress")]
    NoActiveSession,

    #[error("Answer is empty")]
    EmptyAnswer,

    #[error("Question generation failed after {attempts} attempts: {source}")]
    GenerationFailed {
        attempts: u32,
        #[source]
        source: LlmError,
    },

    #[error("Invalid session transition: {0}")]
    InvalidTransition(&'static str),
}
