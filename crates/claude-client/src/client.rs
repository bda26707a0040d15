use tracing::debug;

use crate::limiter::RateLimiter;
use crate::types::{ApiErrorBody, ChatMessage, MessagesRequest, MessagesResponse};
use crate::{ClaudeClientError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Error bodies longer than this are cut before being folded into a message.
const ERROR_BODY_LIMIT: usize = 500;

// ─── ClaudeClient ─────────────────────────────────────────────────────────

/// Single-shot Messages API client. One call, one HTTP request, no retry.
#[derive(Clone)]
pub struct ClaudeClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
}

impl std::fmt::Debug for ClaudeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

impl ClaudeClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        ClaudeClient {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Point the client at a different host (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send `system` + `messages` and return the first text block of the reply.
    ///
    /// Every failure mode (connection, non-2xx status, undecodable body,
    /// missing text) comes back as a [`ClaudeClientError`] whose message is
    /// prefixed with `Claude API request failed:`.
    pub async fn complete(&self, system: &str, messages: &[ChatMessage]) -> Result<String> {
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system,
            messages,
        };

        debug!(model = %self.model, messages = messages.len(), "sending Claude request");

        let resp = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClaudeClientError::request(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ClaudeClientError::request(e.to_string()))?;

        if !status.is_success() {
            return Err(ClaudeClientError::request(describe_api_error(
                status.as_u16(),
                &text,
            )));
        }

        let parsed: MessagesResponse = serde_json::from_str(&text)
            .map_err(|e| ClaudeClientError::request(format!("invalid response body: {e}")))?;

        let usage = parsed.usage.clone().unwrap_or_default();
        debug!(
            id = parsed.id.as_deref().unwrap_or("-"),
            model = parsed.model.as_deref().unwrap_or(&self.model),
            stop_reason = parsed.stop_reason.as_deref().unwrap_or("-"),
            blocks = parsed.content.len(),
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "Claude response received"
        );

        parsed
            .first_text()
            .map(str::to_owned)
            .ok_or(ClaudeClientError::EmptyResponse)
    }
}

/// Turn a non-2xx response into a one-line message, preferring the API's own
/// error description when the body is the documented error envelope.
fn describe_api_error(status: u16, body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(err) => format!("{} (HTTP {status}): {}", err.error.kind, err.error.message),
        Err(_) => {
            let snippet: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            if snippet.trim().is_empty() {
                format!("HTTP {status}")
            } else {
                format!("HTTP {status}: {}", snippet.trim())
            }
        }
    }
}

// ─── RateLimitedClient ────────────────────────────────────────────────────

/// A [`ClaudeClient`] whose calls all pass through one [`RateLimiter`].
#[derive(Debug)]
pub struct RateLimitedClient {
    client: ClaudeClient,
    limiter: RateLimiter,
}

impl RateLimitedClient {
    pub fn new(client: ClaudeClient, limiter: RateLimiter) -> Self {
        RateLimitedClient { client, limiter }
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    pub async fn complete(&self, system: &str, messages: &[ChatMessage]) -> Result<String> {
        self.limiter
            .run(self.client.complete(system, messages))
            .await
    }
}
