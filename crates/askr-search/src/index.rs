//! Search index boundary
//!
//! A [`SearchIndex`] answers free-text queries with scored hits. The role
//! filter travels inside [`SearchRequest`] so that restricted documents are
//! excluded by the index itself and never reach the caller.

use askr_core::{RoleFilter, SearchableDocument, UpstreamFailure, UpstreamSource};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Document field holding the passage text
pub const CONTENT_FIELD: &str = "content";

/// Document field holding the allowed role names
pub const ALLOWED_ROLES_FIELD: &str = "allowedRoles";

/// Search index errors
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Could not reach the service
    #[error("request failed: {0}")]
    Transport(String),

    /// Non-success HTTP status
    #[error("HTTP {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Service error message
        message: String,
    },

    /// Response body did not match the expected shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Index refused some documents of an upload
    #[error("index rejected {rejected} document(s): {message}")]
    Rejected {
        /// Number of refused documents
        rejected: usize,
        /// First error message reported
        message: String,
    },
}

impl From<SearchError> for UpstreamFailure {
    fn from(err: SearchError) -> Self {
        let upstream = UpstreamSource::SearchIndex;
        match err {
            SearchError::Transport(message) => UpstreamFailure::Transport { upstream, message },
            SearchError::Status { status, message } if status == 429 => {
                tracing::debug!(%message, "Search service throttled");
                UpstreamFailure::RateLimited {
                    upstream,
                    retry_after_ms: None,
                }
            }
            SearchError::Status { status, message } => UpstreamFailure::Status {
                upstream,
                status,
                message,
            },
            SearchError::InvalidResponse(message) => {
                UpstreamFailure::MalformedResponse { upstream, message }
            }
            rejected @ SearchError::Rejected { .. } => UpstreamFailure::Backend {
                upstream,
                message: rejected.to_string(),
            },
        }
    }
}

/// Free-text query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Query text
    pub text: String,
    /// Maximum number of hits
    pub top: usize,
    /// Role filter applied by the index (`None`: unrestricted)
    pub filter: Option<RoleFilter>,
    /// Fields to return (empty: all)
    pub select: Vec<String>,
}

impl SearchRequest {
    /// Create unrestricted request for the top 5 hits, all fields
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            top: 5,
            filter: None,
            select: Vec::new(),
        }
    }

    /// With hit cap
    #[inline]
    #[must_use]
    pub fn with_top(mut self, top: usize) -> Self {
        self.top = top;
        self
    }

    /// With role filter
    #[inline]
    #[must_use]
    pub fn with_filter(mut self, filter: Option<RoleFilter>) -> Self {
        self.filter = filter;
        self
    }

    /// With selected fields
    #[must_use]
    pub fn with_select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = fields.into_iter().map(Into::into).collect();
        self
    }
}

/// One scored hit
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Relevance score, higher is better
    pub score: f64,
    /// Returned fields
    pub document: Map<String, Value>,
}

impl SearchHit {
    /// The `content` field, if present and textual
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.document.get(CONTENT_FIELD).and_then(Value::as_str)
    }

    /// The `allowedRoles` field as strings (empty if absent)
    #[must_use]
    pub fn allowed_roles(&self) -> Vec<&str> {
        self.document
            .get(ALLOWED_ROLES_FIELD)
            .and_then(Value::as_array)
            .map(|roles| roles.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// Hits in descending relevance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    /// Hits, at most `top`
    pub hits: Vec<SearchHit>,
    /// Total matching documents, when the index reports it
    pub total_count: Option<u64>,
}

/// Search index boundary
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Run a query; the filter must be evaluated by the index
    async fn search(&self, request: &SearchRequest) -> Result<SearchResults, SearchError>;

    /// Add or replace documents (by id)
    async fn upload(&self, documents: Vec<SearchableDocument>) -> Result<(), SearchError>;
}
