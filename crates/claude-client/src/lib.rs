//! `claude-client`: thin, rate-limited driver for the Claude Messages API.
//!
//! The migration pipeline only ever needs one shape of call: a system prompt
//! plus a short list of role-tagged messages in, one block of text out. This
//! crate provides exactly that, with a fixed-window throttle in front so a
//! component sweep cannot hammer the API.
//!
//! # Architecture
//!
//! ```text
//! RateLimitedClient::complete(system, messages)
//!     │
//!     ▼
//! RateLimiter     ← fixed window: at most N dispatches per W, FIFO queue
//!     │
//!     ▼
//! ClaudeClient    ← POST {base_url}/v1/messages, returns first text block
//!     │
//!     ▼
//! ClaudeClientError::Request("Claude API request failed: …") on any failure
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use claude_client::{ChatMessage, ClaudeClient, RateLimitedClient, RateLimiter};
//!
//! let client = RateLimitedClient::new(
//!     ClaudeClient::new(api_key, "claude-3-7-sonnet-latest"),
//!     RateLimiter::default(),
//! );
//! let text = client
//!     .complete("You write Drupal component schemas.", &[ChatMessage::user("…")])
//!     .await?;
//! ```

pub mod client;
pub mod error;
pub mod limiter;
pub mod types;


pub use client::{ClaudeClient, RateLimitedClient, ANTHROPIC_VERSION, DEFAULT_BASE_URL};
pub use error::ClaudeClientError;
pub use limiter::RateLimiter;
pub use types::{ChatMessage, ContentBlock, MessagesRequest, MessagesResponse, Role};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, ClaudeClientError>;
