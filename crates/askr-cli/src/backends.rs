//! Collaborator selection
//!
//! Remote services are used when configured; otherwise the in-memory
//! backends are filled from the seed file. The knowledge store is always
//! in-memory.

use anyhow::{bail, Context};
use askr_answer::AnswerOrchestrator;
use askr_core::{AskrConfig, Role};
use askr_knowledge::{Actor, KnowledgeService, KnowledgeStore, MemoryKnowledgeStore};
use askr_llm::{ChatCompletionClient, CompletionProvider, CompletionRequest, LlmError};
use askr_search::{DocumentIndexer, MemorySearchIndex, RestSearchIndex, SearchIndex};
use async_trait::async_trait;
use std::sync::Arc;

use crate::seed::SeedFile;

/// Name recorded as author of seeded entries
const SEED_ACTOR: &str = "seed";

/// The three collaborators behind the answer pipeline
pub struct Backends {
    /// Structured knowledge
    pub store: Arc<dyn KnowledgeStore>,
    /// Document search
    pub index: Arc<dyn SearchIndex>,
    /// Completion service
    pub llm: Arc<dyn CompletionProvider>,
}

impl Backends {
    /// Select collaborators from `config` and load `seed`
    ///
    /// # Errors
    /// Missing secrets for a configured service, or a seed item that could
    /// not be stored
    pub async fn build(config: &AskrConfig, seed: &SeedFile) -> anyhow::Result<Self> {
        let store: Arc<dyn KnowledgeStore> = Arc::new(MemoryKnowledgeStore::new());
        let curator = KnowledgeService::new(store.clone());
        let actor = Actor::new(SEED_ACTOR, Role::Admin);
        for draft in &seed.entries {
            curator
                .add(&actor, draft.clone())
                .await
                .with_context(|| format!("failed to seed entry '{}'", draft.title))?;
        }

        let index: Arc<dyn SearchIndex> = match &config.search_service {
            Some(service) => {
                if !seed.documents.is_empty() {
                    tracing::warn!(
                        documents = seed.documents.len(),
                        "Seed documents ignored while a search service is configured"
                    );
                }
                Arc::new(
                    RestSearchIndex::from_config(service)
                        .context("failed to configure search service")?,
                )
            }
            None => {
                let index: Arc<dyn SearchIndex> = Arc::new(MemorySearchIndex::new());
                let indexer = DocumentIndexer::new(index.clone());
                for document in &seed.documents {
                    if !indexer.index(&document.content, &document.allowed_roles).await {
                        bail!("failed to index seed document");
                    }
                }
                index
            }
        };

        let llm: Arc<dyn CompletionProvider> = match &config.llm {
            Some(llm) => Arc::new(
                ChatCompletionClient::from_config(llm).context("failed to configure LLM")?,
            ),
            None => {
                tracing::warn!("No LLM configured; search-tier questions will fail");
                Arc::new(UnconfiguredCompletion)
            }
        };

        tracing::info!(
            entries = seed.entries.len(),
            documents = seed.documents.len(),
            remote_search = config.search_service.is_some(),
            remote_llm = config.llm.is_some(),
            "Backends ready"
        );
        Ok(Self { store, index, llm })
    }

    /// Assemble the answer pipeline
    #[must_use]
    pub fn into_orchestrator(self, config: &AskrConfig) -> AnswerOrchestrator {
        AnswerOrchestrator::from_backends(self.store, self.index, self.llm, config)
    }
}

impl std::fmt::Debug for Backends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backends").finish_non_exhaustive()
    }
}

/// Stands in when no completion service is configured
#[derive(Debug)]
struct UnconfiguredCompletion;

#[async_trait]
impl CompletionProvider for UnconfiguredCompletion {
    async fn complete(&self, _: &CompletionRequest) -> Result<String, LlmError> {
        Err(LlmError::Transport("no completion service configured".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use askr_answer::{render, NO_ANSWER_MESSAGE, SYSTEM_ERROR_MESSAGE};
    use askr_core::{LlmConfig, Question};

    fn seed() -> SeedFile {
        SeedFile::from_json(
            r#"{
                "entries": [
                    { "title": "Leave Policy", "content": "20 days annual leave", "allowedRoles": ["IT"] }
                ],
                "documents": [
                    { "content": "VPN access requires WireGuard", "allowedRoles": ["IT"] }
                ]
            }"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn seeded_entries_answer_structured_questions() {
        let config = AskrConfig::default();
        let orchestrator = Backends::build(&config, &seed())
            .await
            .unwrap()
            .into_orchestrator(&config);

        assert_eq!(
            orchestrator.answer("Leave Policy", Role::It, "u1").await,
            "20 days annual leave"
        );
        assert_eq!(
            orchestrator.answer("Leave Policy", Role::User, "u2").await,
            NO_ANSWER_MESSAGE
        );
    }

    #[tokio::test]
    async fn seeded_entries_are_authored_by_seed_actor() {
        let backends = Backends::build(&AskrConfig::default(), &seed()).await.unwrap();
        let entries = KnowledgeService::new(backends.store.clone())
            .list_for_role(Role::Admin, 1, 10)
            .await
            .unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].created_by, SEED_ACTOR);
    }

    #[tokio::test]
    async fn search_tier_without_llm_is_a_system_error() {
        let config = AskrConfig::default();
        let orchestrator = Backends::build(&config, &seed())
            .await
            .unwrap()
            .into_orchestrator(&config);

        let result = orchestrator.respond(&Question::new("VPN", Role::It, "u1")).await;
        assert!(result.is_err(), "reported as a fault, not a gap");
        assert_eq!(render(result), SYSTEM_ERROR_MESSAGE);

        let gap = orchestrator.respond(&Question::new("Payroll", Role::It, "u1")).await;
        assert!(gap.is_ok());
        assert_eq!(render(gap), NO_ANSWER_MESSAGE);
    }

    #[tokio::test]
    async fn missing_llm_secret_is_reported() {
        let config = AskrConfig {
            llm: Some(LlmConfig {
                flavor: askr_core::LlmFlavor::OpenAi,
                endpoint: "https://api.example.com/v1".into(),
                model: "gpt-4o-mini".into(),
                api_key_env: "ASKR_CLI_TEST_UNSET_KEY".into(),
                api_version: None,
            }),
            ..AskrConfig::default()
        };

        let err = Backends::build(&config, &SeedFile::default()).await.unwrap_err();
        assert!(format!("{err:#}").contains("ASKR_CLI_TEST_UNSET_KEY"));
    }
}
