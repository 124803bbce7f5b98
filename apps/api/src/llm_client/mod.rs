/// Completion gateway — the single point of entry for all GigaChat calls.
///
/// ARCHITECTURAL RULE: No other module may call the completion API directly.
/// Question generation and evaluation depend on the `CompletionGateway` trait only.
///
/// Model: GigaChat (hardcoded — do not make configurable to prevent drift)
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub mod prompts;
#[cfg(test)]
pub mod testing;

/// Default token endpoint.
pub const OAUTH_URL: &str = "https://ngw.devices.sberbank.ru:9443/api/v2/oauth";
/// Default completion endpoint.
pub const COMPLETIONS_URL: &str = "https://gigachat.devices.sberbank.ru/api/v1/chat/completions";
/// The model used for all completion calls.
pub const MODEL: &str = "GigaChat";
const TEMPERATURE: f32 = 0.7;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Used when the token endpoint omits both `expires_at` and `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 1800;
/// Tokens are renewed this long before the server-side expiry.
const TOKEN_EXPIRY_SKEW_SECS: i64 = 60;

/// Typed failure of a single completion call. Callers decide whether to retry.
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    #[error("credential exchange failed: {0}")]
    Auth(String),

    #[error("completion endpoint returned HTTP {status}")]
    Http { status: u16 },

    #[error("completion request timed out")]
    Timeout,

    #[error("malformed completion response: {0}")]
    Malformed(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else if e.is_decode() {
            LlmError::Malformed(e.to_string())
        } else {
            LlmError::Transport(e.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    System,
    User,
}

/// One role-tagged entry of a completion prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Speaker,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Speaker::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Speaker::User,
            content: content.into(),
        }
    }
}

/// Prompt in, text out. Implemented by `GigaChatClient` in production and by
/// scripted doubles in tests.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage], max_tokens: u32)
        -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

impl CompletionResponse {
    /// Extracts the text of the first choice. Empty content counts as malformed.
    fn into_text(self) -> Result<String, LlmError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| LlmError::Malformed("completion contained no text".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Epoch milliseconds.
    expires_at: Option<i64>,
    /// Seconds from now.
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_token(self, now: DateTime<Utc>) -> AccessToken {
        let expires_at = self
            .expires_at
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .or_else(|| {
                self.expires_in
                    .map(|secs| now + chrono::Duration::seconds(secs))
            })
            .unwrap_or_else(|| now + chrono::Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS));

        AccessToken {
            value: self.access_token,
            renew_after: expires_at - chrono::Duration::seconds(TOKEN_EXPIRY_SKEW_SECS),
        }
    }
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    renew_after: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.renew_after
    }
}

/// GigaChat client shared by every session in the process.
///
/// Holds the one bearer-token slot. The slot is renewed lazily: when empty,
/// when the token is about to expire, or after the completion endpoint
/// rejected it. Concurrent sessions may renew redundantly; the last write wins.
pub struct GigaChatClient {
    client: Client,
    auth_key: String,
    scope: String,
    oauth_url: String,
    completions_url: String,
    token: RwLock<Option<AccessToken>>,
}

impl GigaChatClient {
    pub fn new(
        auth_key: String,
        scope: String,
        accept_invalid_certs: bool,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .map_err(|e| LlmError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            auth_key,
            scope,
            oauth_url: OAUTH_URL.to_string(),
            completions_url: COMPLETIONS_URL.to_string(),
            token: RwLock::new(None),
        })
    }

    /// Points the client at other token and completion endpoints.
    pub fn with_endpoints(
        mut self,
        oauth_url: impl Into<String>,
        completions_url: impl Into<String>,
    ) -> Self {
        self.oauth_url = oauth_url.into();
        self.completions_url = completions_url.into();
        self
    }

    async fn bearer_token(&self) -> Result<String, LlmError> {
        if let Some(token) = self
            .token
            .read()
            .await
            .as_ref()
            .filter(|t| t.is_fresh(Utc::now()))
        {
            return Ok(token.value.clone());
        }

        let token = self.exchange_token().await?;
        let value = token.value.clone();
        *self.token.write().await = Some(token);
        Ok(value)
    }

    /// Exchanges the long-lived authorization key for a short-lived bearer token.
    async fn exchange_token(&self) -> Result<AccessToken, LlmError> {
        info!("Requesting GigaChat access token (scope: {})", self.scope);

        let response = self
            .client
            .post(&self.oauth_url)
            .header("Authorization", format!("Basic {}", self.auth_key))
            .header("RqUID", Uuid::new_v4().to_string())
            .header("Accept", "application/json")
            .form(&[("scope", self.scope.as_str())])
            .send()
            .await
            .map_err(|e| LlmError::Auth(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Token exchange returned {}: {}", status, body);
            return Err(LlmError::Auth(format!("token endpoint returned {status}")));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Auth(format!("unreadable token response: {e}")))?;

        Ok(body.into_token(Utc::now()))
    }

    async fn invalidate_token(&self) {
        *self.token.write().await = None;
    }
}

#[async_trait]
impl CompletionGateway for GigaChatClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let token = self.bearer_token().await?;

        let body = CompletionBody {
            model: MODEL,
            messages,
            temperature: TEMPERATURE,
            max_tokens,
        };

        let response = self
            .client
            .post(&self.completions_url)
            .bearer_auth(&token)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            warn!("Completion endpoint rejected the access token; renewing on next call");
            self.invalidate_token().await;
            return Err(LlmError::Auth("access token rejected".to_string()));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Completion endpoint returned {}: {}", status, body);
            return Err(LlmError::Http {
                status: status.as_u16(),
            });
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Malformed(e.to_string()))?;

        if let Some(usage) = &completion.usage {
            debug!(
                "Completion succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        completion.into_text()
    }
}

/// Decodes model output against a strict schema. The prompt must instruct the
/// model to return JSON; any mismatch is reported as `Malformed`.
pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    serde_json::from_str(strip_json_fences(text)).map_err(|e| LlmError::Malformed(e.to_string()))
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
