//! Answer orchestration
//!
//! `Start → Structured → (hit: Done) | (miss: Search) → (hit: Done) | (miss: NoAnswer)`,
//! with any fault, including a panic inside a tier, short-circuiting to the
//! system error message.

use askr_cache::AnswerCache;
use askr_core::{AnswerError, AskrConfig, Question, Role};
use askr_knowledge::{KnowledgeStore, StructuredLookup};
use askr_llm::CompletionProvider;
use askr_search::{RetrievalAugmentedSearch, SearchIndex};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Returned when neither tier has anything visible to the caller
pub const NO_ANSWER_MESSAGE: &str = "I couldn't find relevant information to answer your question.";

/// Returned when resolution faulted; the detail goes to the log only
pub const SYSTEM_ERROR_MESSAGE: &str =
    "Sorry, the system encountered an error while processing your request. Please try again later.";

/// How a question was resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Content of a structured entry
    Structured(String),
    /// Completion grounded in search hits
    Generated(String),
    /// Nothing visible at either tier
    NoAnswer,
}

impl Resolution {
    /// User-facing text
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Resolution::Structured(text) | Resolution::Generated(text) => text,
            Resolution::NoAnswer => NO_ANSWER_MESSAGE,
        }
    }

    /// Consume into user-facing text
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Resolution::Structured(text) | Resolution::Generated(text) => text,
            Resolution::NoAnswer => NO_ANSWER_MESSAGE.to_string(),
        }
    }

    /// Label used in logs and metrics
    #[must_use]
    pub const fn outcome(&self) -> &'static str {
        match self {
            Resolution::Structured(_) => "structured",
            Resolution::Generated(_) => "generated",
            Resolution::NoAnswer => "no_answer",
        }
    }
}

/// Tiered answer pipeline
#[derive(Debug, Clone)]
pub struct AnswerOrchestrator {
    structured: StructuredLookup,
    search: RetrievalAugmentedSearch,
}

impl AnswerOrchestrator {
    /// Create orchestrator over two prepared tiers
    #[must_use]
    pub fn new(structured: StructuredLookup, search: RetrievalAugmentedSearch) -> Self {
        Self { structured, search }
    }

    /// Wire both tiers over one shared cache sized from `config`
    #[must_use]
    pub fn from_backends(
        store: Arc<dyn KnowledgeStore>,
        index: Arc<dyn SearchIndex>,
        llm: Arc<dyn CompletionProvider>,
        config: &AskrConfig,
    ) -> Self {
        let cache = AnswerCache::new(config.cache.max_capacity);
        Self::new(
            StructuredLookup::from_config(store, cache.clone(), config),
            RetrievalAugmentedSearch::from_config(index, llm, cache, config),
        )
    }

    /// Resolve a question to a typed outcome
    ///
    /// # Errors
    /// Returns `AnswerError::Upstream` if any tier's collaborator faults
    pub async fn resolve(&self, question: &Question) -> Result<Resolution, AnswerError> {
        if let Some(content) = self.structured.find(&question.text, question.role).await? {
            tracing::info!(tier = "structured", "Answered from structured knowledge");
            return Ok(Resolution::Structured(content));
        }

        if let Some(generated) = self.search.find(&question.text, question.role).await? {
            tracing::info!(tier = "search", "Answered from search and completion");
            return Ok(Resolution::Generated(generated));
        }

        tracing::warn!(role = %question.role, "No information found at any tier");
        Ok(Resolution::NoAnswer)
    }

    /// [`resolve`](Self::resolve), with panics inside a tier turned into
    /// `AnswerError::Internal`
    ///
    /// # Errors
    /// As [`resolve`](Self::resolve), plus `Internal` for a caught panic
    pub async fn resolve_guarded(&self, question: &Question) -> Result<Resolution, AnswerError> {
        match AssertUnwindSafe(self.resolve(question)).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(AnswerError::Internal(panic_message(payload.as_ref()))),
        }
    }

    /// [`resolve_guarded`](Self::resolve_guarded) with the failure logged and
    /// the outcome counted; the typed form of [`answer`](Self::answer)
    ///
    /// # Errors
    /// As [`resolve_guarded`](Self::resolve_guarded)
    #[tracing::instrument(
        name = "answer",
        skip_all,
        fields(role = %question.role, user_id = %question.user_id, len = question.text.len())
    )]
    pub async fn respond(&self, question: &Question) -> Result<Resolution, AnswerError> {
        let result = self.resolve_guarded(question).await;

        let outcome = match &result {
            Ok(resolution) => resolution.outcome(),
            Err(err) => {
                tracing::error!(
                    error = %err,
                    upstream = ?err.as_upstream().map(askr_core::UpstreamFailure::upstream),
                    "Answer resolution failed"
                );
                "error"
            }
        };

        metrics::counter!("askr_answers_total", "outcome" => outcome).increment(1);
        result
    }

    /// Answer a question; always returns one of the four outcome texts
    pub async fn answer(&self, question: &str, role: Role, user_id: &str) -> String {
        render(self.respond(&Question::new(question, role, user_id)).await)
    }
}

/// User-facing text for a typed outcome; fault detail is dropped
#[must_use]
pub fn render(result: Result<Resolution, AnswerError>) -> String {
    match result {
        Ok(resolution) => resolution.into_text(),
        Err(_) => SYSTEM_ERROR_MESSAGE.to_string(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panic: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panic: {message}")
    } else {
        "panic with non-string payload".to_string()
    }
}
