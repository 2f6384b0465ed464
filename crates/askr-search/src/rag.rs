//! Retrieval-augmented answer tier
//!
//! Fetches the top role-filtered hits for a question, joins their content
//! into a grounding block and asks the completion provider to answer from
//! that block alone. No completion is requested when nothing visible
//! matched.

use crate::index::{SearchHit, SearchIndex, SearchRequest, ALLOWED_ROLES_FIELD, CONTENT_FIELD};
use askr_cache::AnswerCache;
use askr_core::{
    access, AnswerError, AskrConfig, RetrievalConfig, Role, Tier, UpstreamGuard, UpstreamSource,
};
use askr_llm::{CompletionProvider, CompletionRequest};
use std::sync::Arc;
use std::time::Duration;

/// Delimiter written after every passage in the grounding block
pub const PASSAGE_DELIMITER: &str = "\n---\n";

/// Join the `content` of each hit into one grounding block
///
/// Hits without textual content, or with blank content, are skipped, so
/// the block is empty when no hit carries a passage.
#[must_use]
pub fn build_grounding(hits: &[SearchHit]) -> String {
    let mut block = String::new();
    for (position, hit) in hits.iter().enumerate() {
        match hit.content() {
            Some(content) if !content.trim().is_empty() => {
                block.push_str(content);
                block.push('\n');
                block.push_str(PASSAGE_DELIMITER);
                block.push('\n');
            }
            Some(_) => tracing::warn!(position, "Search hit has blank content"),
            None => tracing::warn!(position, "Search hit has no content field"),
        }
    }
    block
}

/// User message: grounding block, then the question
#[must_use]
pub fn build_prompt(grounding: &str, question: &str) -> String {
    format!(
        "Based on these relevant documents:\n\n{grounding}\nQuestion: {question}\n\n\
         Please provide a concise and helpful answer based only on the information provided above."
    )
}

/// Search + LLM answer tier
#[derive(Clone)]
pub struct RetrievalAugmentedSearch {
    index: Arc<dyn SearchIndex>,
    llm: Arc<dyn CompletionProvider>,
    cache: AnswerCache,
    ttl: Duration,
    retrieval: RetrievalConfig,
    search_guard: UpstreamGuard,
    llm_guard: UpstreamGuard,
}

impl RetrievalAugmentedSearch {
    /// Create tier with default settings (top 5, 30 minute TTL)
    #[must_use]
    pub fn new(
        index: Arc<dyn SearchIndex>,
        llm: Arc<dyn CompletionProvider>,
        cache: AnswerCache,
    ) -> Self {
        Self::from_config(index, llm, cache, &AskrConfig::default())
    }

    /// Create tier using retrieval, TTL, timeout and retry settings from `config`
    #[must_use]
    pub fn from_config(
        index: Arc<dyn SearchIndex>,
        llm: Arc<dyn CompletionProvider>,
        cache: AnswerCache,
        config: &AskrConfig,
    ) -> Self {
        Self {
            index,
            llm,
            cache,
            ttl: config.cache.search_ttl(),
            retrieval: config.retrieval.clone(),
            search_guard: UpstreamGuard::new(UpstreamSource::SearchIndex, config.timeouts.search())
                .with_retry(config.retry),
            llm_guard: UpstreamGuard::new(UpstreamSource::Llm, config.timeouts.llm())
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

    /// With retrieval settings
    #[must_use]
    pub fn with_retrieval(mut self, retrieval: RetrievalConfig) -> Self {
        self.retrieval = retrieval;
        self
    }

    /// With guards for the search and completion calls
    #[must_use]
    pub fn with_guards(mut self, search: UpstreamGuard, llm: UpstreamGuard) -> Self {
        self.search_guard = search;
        self.llm_guard = llm;
        self
    }

    /// Generated answer grounded in hits visible to `role`
    ///
    /// `Ok(None)` when nothing visible matched or the model produced no text.
    ///
    /// # Errors
    /// Returns `AnswerError::Upstream` if the index or the provider faults or
    /// times out
    pub async fn find(&self, question: &str, role: Role) -> Result<Option<String>, AnswerError> {
        if let Some(cached) = self.cache.get(Tier::Search, question, role).await {
            tracing::info!(role = %role, "Search cache hit");
            return Ok(Some(cached));
        }

        let request = SearchRequest::new(question)
            .with_top(self.retrieval.top_k)
            .with_filter(access::build_search_filter(role))
            .with_select([CONTENT_FIELD, ALLOWED_ROLES_FIELD]);
        let results = self
            .search_guard
            .call(|| self.index.search(&request))
            .await?;

        tracing::info!(
            role = %role,
            hits = results.hits.len(),
            total = ?results.total_count,
            "Search completed"
        );

        let grounding = build_grounding(&results.hits);
        if grounding.is_empty() {
            tracing::warn!(role = %role, "No search results visible to role");
            return Ok(None);
        }

        let completion = CompletionRequest::new(
            self.retrieval.system_prompt.clone(),
            build_prompt(&grounding, question),
        )
        .with_temperature(self.retrieval.temperature)
        .with_max_tokens(self.retrieval.max_tokens);

        tracing::debug!(len = completion.user.len(), "Requesting completion");
        let generated = self.llm_guard.call(|| self.llm.complete(&completion)).await?;

        let answer = generated.trim();
        tracing::info!(len = answer.len(), "Completion received");
        if answer.is_empty() {
            tracing::error!(role = %role, "Completion was empty despite grounding");
            return Ok(None);
        }

        self.cache
            .put(Tier::Search, question, role, answer, self.ttl)
            .await;
        Ok(Some(answer.to_string()))
    }
}

impl std::fmt::Debug for RetrievalAugmentedSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalAugmentedSearch")
            .field("ttl", &self.ttl)
            .field("top_k", &self.retrieval.top_k)
            .field("search_guard", &self.search_guard)
            .field("llm_guard", &self.llm_guard)
            .finish_non_exhaustive()
    }
}
