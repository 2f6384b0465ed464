//! Testing utilities for askr workspace
//!
//! Shared fixtures and fault-injecting collaborators.

#![allow(missing_docs)]

pub mod fixtures;

use askr_core::{KnowledgeEntry, SearchableDocument};
use askr_knowledge::{KnowledgeQuery, KnowledgeStore, StoreError};
use askr_llm::{CompletionProvider, CompletionRequest, LlmError};
use askr_search::{SearchError, SearchIndex, SearchRequest, SearchResults};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Completion provider with a fixed reply that records every request
#[derive(Debug)]
pub struct ScriptedCompletion {
    reply: Result<String, (u16, String)>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletion {
    pub fn answering(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Fails every request with an HTTP status
    pub fn failing(status: u16, message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err((status, message.to_string())),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }

    /// User message of the most recent request
    pub fn last_prompt(&self) -> Option<String> {
        self.requests.lock().last().map(|r| r.user.clone())
    }
}

#[async_trait]
impl CompletionProvider for ScriptedCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.requests.lock().push(request.clone());
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err((status, message)) => Err(LlmError::Status {
                status: *status,
                message: message.clone(),
            }),
        }
    }
}

/// Store wrapper counting queries
pub struct CountingStore {
    inner: Arc<dyn KnowledgeStore>,
    queries: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: Arc<dyn KnowledgeStore>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            queries: AtomicUsize::new(0),
        })
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KnowledgeStore for CountingStore {
    async fn query(&self, query: &KnowledgeQuery) -> Result<Vec<KnowledgeEntry>, StoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.query(query).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<KnowledgeEntry>, StoreError> {
        self.inner.get(id).await
    }

    async fn insert(&self, entry: KnowledgeEntry) -> Result<(), StoreError> {
        self.inner.insert(entry).await
    }

    async fn replace(&self, entry: KnowledgeEntry) -> Result<bool, StoreError> {
        self.inner.replace(entry).await
    }

    async fn remove(&self, id: Uuid) -> Result<bool, StoreError> {
        self.inner.remove(id).await
    }
}

/// Store whose every operation fails
#[derive(Debug, Default)]
pub struct FailingStore;

impl FailingStore {
    fn fault() -> StoreError {
        StoreError::Backend("connection refused".into())
    }
}

#[async_trait]
impl KnowledgeStore for FailingStore {
    async fn query(&self, _: &KnowledgeQuery) -> Result<Vec<KnowledgeEntry>, StoreError> {
        Err(Self::fault())
    }

    async fn get(&self, _: Uuid) -> Result<Option<KnowledgeEntry>, StoreError> {
        Err(Self::fault())
    }

    async fn insert(&self, _: KnowledgeEntry) -> Result<(), StoreError> {
        Err(Self::fault())
    }

    async fn replace(&self, _: KnowledgeEntry) -> Result<bool, StoreError> {
        Err(Self::fault())
    }

    async fn remove(&self, _: Uuid) -> Result<bool, StoreError> {
        Err(Self::fault())
    }
}

/// Store whose queries never complete
#[derive(Debug, Default)]
pub struct StalledStore;

#[async_trait]
impl KnowledgeStore for StalledStore {
    async fn query(&self, _: &KnowledgeQuery) -> Result<Vec<KnowledgeEntry>, StoreError> {
        std::future::pending().await
    }

    async fn get(&self, _: Uuid) -> Result<Option<KnowledgeEntry>, StoreError> {
        std::future::pending().await
    }

    async fn insert(&self, _: KnowledgeEntry) -> Result<(), StoreError> {
        std::future::pending().await
    }

    async fn replace(&self, _: KnowledgeEntry) -> Result<bool, StoreError> {
        std::future::pending().await
    }

    async fn remove(&self, _: Uuid) -> Result<bool, StoreError> {
        std::future::pending().await
    }
}

/// Search index wrapper recording every request
pub struct RecordingIndex {
    inner: Arc<dyn SearchIndex>,
    requests: Mutex<Vec<SearchRequest>>,
}

impl RecordingIndex {
    pub fn new(inner: Arc<dyn SearchIndex>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl SearchIndex for RecordingIndex {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResults, SearchError> {
        self.requests.lock().push(request.clone());
        self.inner.search(request).await
    }

    async fn upload(&self, documents: Vec<SearchableDocument>) -> Result<(), SearchError> {
        self.inner.upload(documents).await
    }
}

/// Search index that is always unavailable
#[derive(Debug, Default)]
pub struct FailingIndex;

#[async_trait]
impl SearchIndex for FailingIndex {
    async fn search(&self, _: &SearchRequest) -> Result<SearchResults, SearchError> {
        Err(SearchError::Status {
            status: 503,
            message: "service unavailable".into(),
        })
    }

    async fn upload(&self, _: Vec<SearchableDocument>) -> Result<(), SearchError> {
        Err(SearchError::Status {
            status: 503,
            message: "service unavailable".into(),
        })
    }
}
