//! Error types for askr
//!
//! Provides the shared error taxonomy:
//! - Access errors (unknown roles)
//! - Upstream failures (store, search index, LLM)
//! - Answer errors surfaced by the pipeline
//! - Configuration errors
//!
//! A content gap is not an error: tiers report it as `Ok(None)`.

use std::fmt;
use std::path::PathBuf;

/// Access policy errors
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// Role name is not one of the canonical names
    #[error("unknown role: '{0}'")]
    UnknownRole(String),
}

/// External collaborator an upstream call targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpstreamSource {
    /// Structured knowledge store
    KnowledgeStore,
    /// Search index
    SearchIndex,
    /// LLM completion service
    Llm,
}

impl UpstreamSource {
    /// Label used in logs and metrics
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            UpstreamSource::KnowledgeStore => "knowledge_store",
            UpstreamSource::SearchIndex => "search_index",
            UpstreamSource::Llm => "llm",
        }
    }
}

impl fmt::Display for UpstreamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fault raised by an external collaborator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamFailure {
    /// Call did not complete within its bound
    #[error("{upstream} timed out after {after_ms}ms")]
    Timeout {
        /// Target of the call
        upstream: UpstreamSource,
        /// Configured bound in milliseconds
        after_ms: u64,
    },

    /// Connection or transport failure
    #[error("{upstream} transport error: {message}")]
    Transport {
        /// Target of the call
        upstream: UpstreamSource,
        /// Transport detail
        message: String,
    },

    /// Non-success status returned by the service
    #[error("{upstream} returned status {status}: {message}")]
    Status {
        /// Target of the call
        upstream: UpstreamSource,
        /// HTTP status code
        status: u16,
        /// Service-provided message
        message: String,
    },

    /// Service asked the caller to slow down
    #[error("{upstream} rate limited")]
    RateLimited {
        /// Target of the call
        upstream: UpstreamSource,
        /// Suggested wait, if advertised
        retry_after_ms: Option<u64>,
    },

    /// Response could not be interpreted
    #[error("{upstream} returned a malformed response: {message}")]
    MalformedResponse {
        /// Target of the call
        upstream: UpstreamSource,
        /// Parse detail
        message: String,
    },

    /// Backend-specific failure
    #[error("{upstream} failed: {message}")]
    Backend {
        /// Target of the call
        upstream: UpstreamSource,
        /// Failure detail
        message: String,
    },
}

impl UpstreamFailure {
    /// Target of the failed call
    #[must_use]
    pub fn upstream(&self) -> UpstreamSource {
        match self {
            Self::Timeout { upstream, .. }
            | Self::Transport { upstream, .. }
            | Self::Status { upstream, .. }
            | Self::RateLimited { upstream, .. }
            | Self::MalformedResponse { upstream, .. }
            | Self::Backend { upstream, .. } => *upstream,
        }
    }

    /// Check if failure is transient and worth retrying
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Transport { .. } | Self::RateLimited { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            Self::MalformedResponse { .. } | Self::Backend { .. } => false,
        }
    }

    /// Check if failure is a timeout
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Error surfaced by the answer pipeline
///
/// Rendered as the generic system-error message at the boundary; the detail
/// is only ever logged.
#[derive(Debug, thiserror::Error)]
pub enum AnswerError {
    /// An upstream collaborator faulted
    #[error("upstream failure: {0}")]
    Upstream(#[from] UpstreamFailure),

    /// Resolution aborted unexpectedly (e.g. a panic inside a tier)
    #[error("internal error: {0}")]
    Internal(String),
}

impl AnswerError {
    /// Upstream failure, if that is what this is
    #[inline]
    #[must_use]
    pub fn as_upstream(&self) -> Option<&UpstreamFailure> {
        match self {
            Self::Upstream(failure) => Some(failure),
            Self::Internal(_) => None,
        }
    }
}

/// Configuration loading and validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading the config file
    #[error("io error reading {path}: {source}")]
    Io {
        /// Config file path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or shape error
    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config could not be rendered
    #[error("config serialization failed: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Config parsed but failed validation
    #[error("invalid config: {0}")]
    Invalid(String),

    /// Referenced secret is not set in the environment
    #[error("environment variable {0} is not set")]
    MissingSecret(String),
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
