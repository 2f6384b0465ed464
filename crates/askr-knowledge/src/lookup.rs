//! Structured answer tier
//!
//! First stop for every question: a cached, role-filtered substring lookup
//! over curated entries. A miss is not an error; it lets the pipeline fall
//! through to the search tier.

use crate::store::{KnowledgeQuery, KnowledgeStore};
use askr_cache::AnswerCache;
use askr_core::{AnswerError, AskrConfig, Role, Tier, UpstreamGuard, UpstreamSource};
use std::sync::Arc;
use std::time::Duration;

/// Cached structured lookup
#[derive(Clone)]
pub struct StructuredLookup {
    store: Arc<dyn KnowledgeStore>,
    cache: AnswerCache,
    ttl: Duration,
    guard: UpstreamGuard,
}

impl StructuredLookup {
    /// Create lookup with default TTL (1 hour) and timeout (5 s)
    #[must_use]
    pub fn new(store: Arc<dyn KnowledgeStore>, cache: AnswerCache) -> Self {
        Self::from_config(store, cache, &AskrConfig::default())
    }

    /// Create lookup using TTL, timeout and retry policy from `config`
    #[must_use]
    pub fn from_config(
        store: Arc<dyn KnowledgeStore>,
        cache: AnswerCache,
        config: &AskrConfig,
    ) -> Self {
        Self {
            store,
            cache,
            ttl: config.cache.structured_ttl(),
            guard: UpstreamGuard::new(UpstreamSource::KnowledgeStore, config.timeouts.store())
                .with_retry(config.retry),
        }
    }

    /// With cache TTL
    #[inline]
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// With upstream guard
    #[inline]
    #[must_use]
    pub fn with_guard(mut self, guard: UpstreamGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Content of the first visible entry mentioning `question`
    ///
    /// # Errors
    /// Returns `AnswerError::Upstream` if the store faults or times out
    pub async fn find(&self, question: &str, role: Role) -> Result<Option<String>, AnswerError> {
        if let Some(cached) = self.cache.get(Tier::Structured, question, role).await {
            tracing::info!(role = %role, "Structured cache hit");
            return Ok(Some(cached));
        }

        tracing::info!(role = %role, "Structured cache miss, querying knowledge store");

        let query = KnowledgeQuery::visible_to(role)
            .containing(question)
            .with_limit(1);
        let entries = self.guard.call(|| self.store.query(&query)).await?;

        match entries.into_iter().next() {
            Some(entry) if entry.content.trim().is_empty() => {
                tracing::warn!(entry_id = %entry.id, "Structured entry has blank content, skipping");
                Ok(None)
            }
            Some(entry) => {
                tracing::debug!(entry_id = %entry.id, "Structured entry matched");
                self.cache
                    .put(Tier::Structured, question, role, entry.content.clone(), self.ttl)
                    .await;
                Ok(Some(entry.content))
            }
            None => {
                tracing::info!(role = %role, "No structured knowledge found");
                Ok(None)
            }
        }
    }
}

impl std::fmt::Debug for StructuredLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructuredLookup")
            .field("ttl", &self.ttl)
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}
