//! Port trait for the chat model used to generate test code.
//!
//! This is deliberately the smallest possible seam around the dominant
//! blocking point of the system (one prompt in, one message out) so that
//! HTTP adapters, local model adapters, and test stubs all fit behind it.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

/// A message produced by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Raw text content; usually free-form prose wrapping a fenced code
    /// block.
    pub content: String,
}

impl ChatMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Errors from chat-model adapters.
#[derive(Error, Debug)]
pub enum ChatError {
    /// Rate limit hit; retry with backoff.
    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    /// Authentication failed (bad or missing API key).
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Network-level failure (connect, DNS, TLS).
    #[error("network error: {0}")]
    Network(String),

    /// The endpoint returned an error status.
    #[error("api error {status}: {message}")]
    Api { status: u16, message: String },

    /// The response body could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The request timed out.
    #[error("request timed out")]
    Timeout,
}

impl ChatError {
    /// Returns true if the call may succeed on retry.
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited(_) | Self::Network(_) | Self::Timeout => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Auth(_) | Self::InvalidResponse(_) => false,
        }
    }
}

/// Port trait for generating chat messages from a prompt.
///
/// Implementations must be `Send + Sync`; the schedulers call `generate`
/// concurrently across tasks.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate a response for the given prompt.
    async fn generate(&self, prompt: &str) -> Result<ChatMessage, ChatError>;
}
