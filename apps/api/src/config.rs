use anyhow::{Context, Result};

use crate::evaluation::EvaluationMode;
use crate::interview::question_bank::QuestionSource;
use crate::llm_client;

const DEFAULT_SCOPE: &str = "GIGACHAT_API_PERS";

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub gigachat_auth_key: String,
    pub gigachat_scope: String,
    pub gigachat_oauth_url: String,
    pub gigachat_completions_url: String,
    pub accept_invalid_certs: bool,
    /// Archival is disabled when unset.
    pub database_url: Option<String>,
    pub question_source: QuestionSource,
    pub evaluation_mode: EvaluationMode,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let question_source = match optional_env("QUESTION_SOURCE") {
            Some(raw) => raw
                .parse::<QuestionSource>()
                .map_err(anyhow::Error::msg)
                .context("QUESTION_SOURCE is invalid")?,
            None => QuestionSource::Generated,
        };

        let evaluation_mode = if flag_env("MULTI_PERSPECTIVE_EVALUATION")? {
            EvaluationMode::MultiPerspective
        } else {
            EvaluationMode::Single
        };

        Ok(Config {
            gigachat_auth_key: require_env("GIGACHAT_AUTH_KEY")?,
            gigachat_scope: optional_env("GIGACHAT_SCOPE")
                .unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
            gigachat_oauth_url: optional_env("GIGACHAT_OAUTH_URL")
                .unwrap_or_else(|| llm_client::OAUTH_URL.to_string()),
            gigachat_completions_url: optional_env("GIGACHAT_COMPLETIONS_URL")
                .unwrap_or_else(|| llm_client::COMPLETIONS_URL.to_string()),
            accept_invalid_certs: flag_env("GIGACHAT_ACCEPT_INVALID_CERTS")?,
            database_url: optional_env("DATABASE_URL"),
            question_source,
            evaluation_mode,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank values are treated alike.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn flag_env(key: &str) -> Result<bool> {
    match optional_env(key) {
        Some(raw) => parse_flag(&raw).with_context(|| format!("'{key}' must be true or false")),
        None => Ok(false),
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("unrecognised boolean '{other}'"),
    }
}
