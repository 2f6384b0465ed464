//! Structured knowledge store
//!
//! [`KnowledgeStore`] is the boundary to whatever persists knowledge entries.
//! Queries carry the role filter produced by the access policy and an
//! optional case-sensitive substring; backends must evaluate both and return
//! matches in a stable order.

use askr_core::{
    access, KnowledgeEntry, Role, RoleFilter, UpstreamFailure, UpstreamSource,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Entry with this id already exists
    #[error("entry already exists: {0}")]
    Conflict(Uuid),

    /// Backend failure (connection, query, decoding)
    #[error("store backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for UpstreamFailure {
    fn from(err: StoreError) -> Self {
        UpstreamFailure::Backend {
            upstream: UpstreamSource::KnowledgeStore,
            message: err.to_string(),
        }
    }
}

/// Query over knowledge entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeQuery {
    /// Role filter (`None`: unrestricted)
    pub filter: Option<RoleFilter>,
    /// Case-sensitive substring of title or content
    pub text: Option<String>,
    /// Maximum number of entries to return
    pub limit: Option<usize>,
}

impl KnowledgeQuery {
    /// Query for every entry `role` may see
    #[inline]
    #[must_use]
    pub fn visible_to(role: Role) -> Self {
        Self {
            filter: access::build_search_filter(role),
            text: None,
            limit: None,
        }
    }

    /// Restrict to entries mentioning `text`
    #[inline]
    #[must_use]
    pub fn containing(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Cap result count
    #[inline]
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Reference evaluation of the query against one entry
    #[must_use]
    pub fn matches(&self, entry: &KnowledgeEntry) -> bool {
        let visible = self
            .filter
            .map_or(true, |filter| filter.admits(&entry.allowed_roles));
        visible && self.text.as_deref().map_or(true, |text| entry.mentions(text))
    }
}

/// Persistence boundary for knowledge entries
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Entries matching `query`, in stable order
    async fn query(&self, query: &KnowledgeQuery) -> Result<Vec<KnowledgeEntry>, StoreError>;

    /// Fetch one entry
    async fn get(&self, id: Uuid) -> Result<Option<KnowledgeEntry>, StoreError>;

    /// Add a new entry
    async fn insert(&self, entry: KnowledgeEntry) -> Result<(), StoreError>;

    /// Replace an existing entry; `false` if absent
    async fn replace(&self, entry: KnowledgeEntry) -> Result<bool, StoreError>;

    /// Remove an entry; `false` if absent
    async fn remove(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// In-memory store, ordered by insertion
#[derive(Debug, Default)]
pub struct MemoryKnowledgeStore {
    entries: RwLock<Vec<KnowledgeEntry>>,
}

impl MemoryKnowledgeStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create store seeded with entries (in the given order)
    #[must_use]
    pub fn with_entries(entries: impl IntoIterator<Item = KnowledgeEntry>) -> Self {
        Self {
            entries: RwLock::new(entries.into_iter().collect()),
        }
    }

    /// Number of stored entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl KnowledgeStore for MemoryKnowledgeStore {
    async fn query(&self, query: &KnowledgeQuery) -> Result<Vec<KnowledgeEntry>, StoreError> {
        let entries = self.entries.read();
        Ok(entries
            .iter()
            .filter(|entry| query.matches(entry))
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<KnowledgeEntry>, StoreError> {
        Ok(self.entries.read().iter().find(|e| e.id == id).cloned())
    }

    async fn insert(&self, entry: KnowledgeEntry) -> Result<(), StoreError> {
        let mut entries = self.entries.write();
        if entries.iter().any(|e| e.id == entry.id) {
            return Err(StoreError::Conflict(entry.id));
        }
        entries.push(entry);
        Ok(())
    }

    async fn replace(&self, entry: KnowledgeEntry) -> Result<bool, StoreError> {
        let mut entries = self.entries.write();
        match entries.iter_mut().find(|e| e.id == entry.id) {
            Some(slot) => {
                *slot = entry;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        Ok(entries.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> MemoryKnowledgeStore {
        MemoryKnowledgeStore::with_entries([
            KnowledgeEntry::new("Leave Policy", "20 days annual leave", [Role::It]),
            KnowledgeEntry::new("Payroll", "Paid on the 25th", [Role::Hr]),
            KnowledgeEntry::new("Leave Carryover", "5 days carry over", [Role::It, Role::Hr]),
        ])
    }

    #[tokio::test]
    async fn query_applies_role_filter() {
        let store = seeded();

        let hr = store.query(&KnowledgeQuery::visible_to(Role::Hr)).await.unwrap();
        let titles: Vec<_> = hr.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Payroll", "Leave Carryover"]);

        let admin = store.query(&KnowledgeQuery::visible_to(Role::Admin)).await.unwrap();
        assert_eq!(admin.len(), 3);

        let user = store.query(&KnowledgeQuery::visible_to(Role::User)).await.unwrap();
        assert!(user.is_empty());
    }

    #[tokio::test]
    async fn query_text_is_case_sensitive_substring_in_insertion_order() {
        let store = seeded();

        let hits = store
            .query(&KnowledgeQuery::visible_to(Role::It).containing("Leave"))
            .await
            .unwrap();
        let titles: Vec<_> = hits.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Leave Policy", "Leave Carryover"]);

        let none = store
            .query(&KnowledgeQuery::visible_to(Role::It).containing("leave policy"))
            .await
            .unwrap();
        assert!(none.is_empty());

        let by_content = store
            .query(&KnowledgeQuery::visible_to(Role::It).containing("carry over"))
            .await
            .unwrap();
        assert_eq!(by_content.len(), 1);
    }

    #[tokio::test]
    async fn query_limit() {
        let store = seeded();
        let hits = store
            .query(&KnowledgeQuery::visible_to(Role::Admin).with_limit(1))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Leave Policy");
    }

    #[tokio::test]
    async fn crud() {
        let store = MemoryKnowledgeStore::new();
        let entry = KnowledgeEntry::new("VPN", "Use the corporate VPN", [Role::It]);
        let id = entry.id;

        store.insert(entry.clone()).await.unwrap();
        assert!(matches!(
            store.insert(entry.clone()).await,
            Err(StoreError::Conflict(dup)) if dup == id
        ));

        let mut changed = entry;
        changed.content = "Use WireGuard".into();
        assert!(store.replace(changed).await.unwrap());
        assert_eq!(store.get(id).await.unwrap().unwrap().content, "Use WireGuard");

        assert!(store.remove(id).await.unwrap());
        assert!(!store.remove(id).await.unwrap());
        assert!(store.get(id).await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn store_error_becomes_upstream_failure() {
        let failure: UpstreamFailure = StoreError::Backend("connection refused".into()).into();
        assert_eq!(failure.upstream(), UpstreamSource::KnowledgeStore);
        assert!(!failure.is_retryable());
    }
}
