//! askr LLM
//!
//! Chat completion boundary used by the search tier:
//! - [`CompletionProvider`]: one system + one user message in, text out
//! - [`ChatCompletionClient`]: reqwest client for OpenAI-compatible
//!   endpoints, in OpenAI or Azure deployment flavor
//!
//! Providers return whatever text the model produced, including an empty
//! string; deciding what an empty completion means is the caller's job.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod client;
mod wire;

pub use client::ChatCompletionClient;

use askr_core::{UpstreamFailure, UpstreamSource};
use async_trait::async_trait;

/// A single-turn chat completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// System message
    pub system: String,
    /// User message
    pub user: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Completion token cap
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Create request with temperature 0.2 and 800 max tokens
    #[must_use]
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: 0.2,
            max_tokens: 800,
        }
    }

    /// With temperature
    #[inline]
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// With max tokens
    #[inline]
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// LLM provider errors
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Could not reach the endpoint
    #[error("request failed: {0}")]
    Transport(String),

    /// Non-success HTTP status
    #[error("HTTP {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Provider error message
        message: String,
    },

    /// HTTP 429
    #[error("rate limited")]
    RateLimited {
        /// Server hint from `retry-after`
        retry_after_ms: Option<u64>,
    },

    /// Response body did not match the expected shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<LlmError> for UpstreamFailure {
    fn from(err: LlmError) -> Self {
        let upstream = UpstreamSource::Llm;
        match err {
            LlmError::Transport(message) => UpstreamFailure::Transport { upstream, message },
            LlmError::Status { status, message } => UpstreamFailure::Status {
                upstream,
                status,
                message,
            },
            LlmError::RateLimited { retry_after_ms } => UpstreamFailure::RateLimited {
                upstream,
                retry_after_ms,
            },
            LlmError::InvalidResponse(message) => {
                UpstreamFailure::MalformedResponse { upstream, message }
            }
        }
    }
}

/// Text generation boundary
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate a completion; may legitimately return an empty string
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
