use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClaudeClientError {
    /// Transport, HTTP status or API-level failure. The inner string is the
    /// original message; Display adds the fixed prefix.
    #[error("Claude API request failed: {0}")]
    Request(String),

    #[error("Claude API request failed: response contained no text content")]
    EmptyResponse,
}

impl ClaudeClientError {
    pub(crate) fn request(msg: impl Into<String>) -> Self {
        ClaudeClientError::Request(msg.into())
    }
}
