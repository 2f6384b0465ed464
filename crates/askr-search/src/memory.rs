//! In-memory search index
//!
//! Relevance is the number of distinct query terms found in a document,
//! after lowercasing and splitting on anything that is not alphanumeric.
//! Ties keep upload order. A query with no terms matches every visible
//! document.

use crate::index::{
    SearchError, SearchHit, SearchIndex, SearchRequest, SearchResults, ALLOWED_ROLES_FIELD,
    CONTENT_FIELD,
};
use askr_core::SearchableDocument;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

fn terms(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn project(doc: &SearchableDocument, select: &[String]) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("id".into(), Value::String(doc.id.clone()));
    fields.insert(CONTENT_FIELD.into(), Value::String(doc.content.clone()));
    fields.insert(
        ALLOWED_ROLES_FIELD.into(),
        Value::Array(doc.allowed_roles.iter().cloned().map(Value::String).collect()),
    );
    if !select.is_empty() {
        fields.retain(|name, _| select.iter().any(|s| s == name));
    }
    fields
}

/// Search index held in memory
#[derive(Debug, Default)]
pub struct MemorySearchIndex {
    documents: RwLock<Vec<SearchableDocument>>,
}

impl MemorySearchIndex {
    /// Create empty index
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create index holding `documents`
    #[must_use]
    pub fn with_documents(documents: impl IntoIterator<Item = SearchableDocument>) -> Self {
        Self {
            documents: RwLock::new(documents.into_iter().collect()),
        }
    }

    /// Number of indexed documents
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    /// Check if index is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

#[async_trait]
impl SearchIndex for MemorySearchIndex {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResults, SearchError> {
        let query = terms(&request.text);
        let documents = self.documents.read();

        let mut scored: Vec<(usize, &SearchableDocument)> = documents
            .iter()
            .filter(|doc| {
                request
                    .filter
                    .map_or(true, |filter| filter.admits_names(&doc.allowed_roles))
            })
            .filter_map(|doc| {
                let words = terms(&doc.content);
                let score = query.iter().filter(|t| words.contains(*t)).count();
                (query.is_empty() || score > 0).then_some((score, doc))
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        let total = scored.len() as u64;
        #[allow(clippy::cast_precision_loss)]
        let hits = scored
            .into_iter()
            .take(request.top)
            .map(|(score, doc)| SearchHit {
                score: score as f64,
                document: project(doc, &request.select),
            })
            .collect();

        Ok(SearchResults {
            hits,
            total_count: Some(total),
        })
    }

    async fn upload(&self, documents: Vec<SearchableDocument>) -> Result<(), SearchError> {
        let mut stored = self.documents.write();
        for doc in documents {
            match stored.iter_mut().find(|d| d.id == doc.id) {
                Some(slot) => *slot = doc,
                None => stored.push(doc),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use askr_core::{access, Role};
    use proptest::prelude::*;

    fn index() -> MemorySearchIndex {
        MemorySearchIndex::with_documents([
            SearchableDocument::new("Annual leave is 20 days for IT staff", [Role::It])
                .with_id("it-leave"),
            SearchableDocument::new("HR leave policy: 25 days of leave", [Role::Hr])
                .with_id("hr-leave"),
            SearchableDocument::new("Expense reports are due monthly", [Role::It, Role::Hr])
                .with_id("expenses"),
        ])
    }

    fn ids(results: &SearchResults) -> Vec<&str> {
        results
            .hits
            .iter()
            .filter_map(|h| h.document.get("id").and_then(Value::as_str))
            .collect()
    }

    #[tokio::test]
    async fn filter_is_applied_inside_the_query() {
        let index = index();
        let request = SearchRequest::new("leave policy")
            .with_filter(access::build_search_filter(Role::It));

        let results = index.search(&request).await.unwrap();
        assert_eq!(ids(&results), vec!["it-leave"]);
        assert_eq!(results.total_count, Some(1));
    }

    #[tokio::test]
    async fn unfiltered_ranks_by_term_overlap() {
        let index = index();
        let results = index
            .search(&SearchRequest::new("Leave Policy"))
            .await
            .unwrap();

        assert_eq!(ids(&results), vec!["hr-leave", "it-leave"]);
        assert!(results.hits[0].score > results.hits[1].score);
    }

    #[tokio::test]
    async fn top_truncates_but_total_counts_all() {
        let index = index();
        let results = index
            .search(&SearchRequest::new("days monthly").with_top(1))
            .await
            .unwrap();

        assert_eq!(results.hits.len(), 1);
        assert_eq!(results.total_count, Some(3));
    }

    #[tokio::test]
    async fn select_projects_fields() {
        let index = index();
        let results = index
            .search(&SearchRequest::new("expense").with_select([CONTENT_FIELD]))
            .await
            .unwrap();

        let doc = &results.hits[0].document;
        assert_eq!(doc.len(), 1);
        assert_eq!(results.hits[0].content(), Some("Expense reports are due monthly"));
    }

    #[tokio::test]
    async fn upload_replaces_by_id() {
        let index = index();
        index
            .upload(vec![
                SearchableDocument::new("Expenses are due weekly", [Role::It]).with_id("expenses"),
                SearchableDocument::new("VPN setup guide", [Role::It]),
            ])
            .await
            .unwrap();

        assert_eq!(index.len(), 4);
        let results = index.search(&SearchRequest::new("weekly")).await.unwrap();
        assert_eq!(ids(&results), vec!["expenses"]);
    }

    #[tokio::test]
    async fn user_role_sees_nothing_here() {
        let index = index();
        let request =
            SearchRequest::new("leave").with_filter(access::build_search_filter(Role::User));
        assert!(index.search(&request).await.unwrap().hits.is_empty());
    }

    proptest! {
        #[test]
        fn prop_filtered_hits_always_allow_role(
            role_idx in 0usize..4,
            query in "(leave|days|policy|expense|monthly| ){1,6}",
        ) {
            let role = Role::ALL[role_idx];
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let results = runtime.block_on(async {
                index()
                    .search(&SearchRequest::new(query).with_filter(access::build_search_filter(role)))
                    .await
                    .unwrap()
            });
            for hit in &results.hits {
                prop_assert!(role.is_administrative() || hit.allowed_roles().contains(&role.as_str()));
            }
        }
    }
}
