//! Document ingestion into the search index

use crate::index::SearchIndex;
use askr_core::{Role, SearchableDocument};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

/// Record of an uploaded source file
///
/// Kept by the upload workflow next to the indexed text. The answer path
/// never reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// Record id
    pub record_id: Uuid,
    /// Original file name
    pub file_name: String,
    /// Where the raw file is stored
    pub blob_url: String,
    /// Uploader
    pub uploaded_by: String,
    /// Upload time (UTC)
    pub upload_date: DateTime<Utc>,
    /// Free-form type, e.g. `pdf`
    pub document_type: String,
    /// Free-form description
    pub description: String,
    /// Roles allowed to see the document's content
    pub allowed_roles: BTreeSet<Role>,
}

impl DocumentMetadata {
    /// Create record stamped with the current time
    #[must_use]
    pub fn new(
        file_name: impl Into<String>,
        blob_url: impl Into<String>,
        allowed_roles: impl IntoIterator<Item = Role>,
    ) -> Self {
        Self {
            record_id: Uuid::new_v4(),
            file_name: file_name.into(),
            blob_url: blob_url.into(),
            uploaded_by: String::new(),
            upload_date: Utc::now(),
            document_type: String::new(),
            description: String::new(),
            allowed_roles: allowed_roles.into_iter().collect(),
        }
    }

    /// With uploader
    #[must_use]
    pub fn with_uploader(mut self, uploaded_by: impl Into<String>) -> Self {
        self.uploaded_by = uploaded_by.into();
        self
    }

    /// With document type
    #[must_use]
    pub fn with_document_type(mut self, document_type: impl Into<String>) -> Self {
        self.document_type = document_type.into();
        self
    }

    /// With description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Pushes extracted text into a [`SearchIndex`]
#[derive(Clone)]
pub struct DocumentIndexer {
    index: Arc<dyn SearchIndex>,
}

impl DocumentIndexer {
    /// Create indexer over `index`
    #[must_use]
    pub fn new(index: Arc<dyn SearchIndex>) -> Self {
        Self { index }
    }

    /// Index `content` under a fresh id; `false` if the index refused it
    ///
    /// Failures are logged, not returned.
    pub async fn index(&self, content: &str, allowed_roles: &[Role]) -> bool {
        let document = SearchableDocument::new(content, allowed_roles.iter().copied());
        let id = document.id.clone();

        match self.index.upload(vec![document]).await {
            Ok(()) => {
                tracing::info!(document_id = %id, len = content.len(), "Document indexed");
                true
            }
            Err(err) => {
                tracing::error!(document_id = %id, error = %err, "Indexing failed");
                false
            }
        }
    }

    /// Index the text extracted from an uploaded file, using its roles
    pub async fn index_upload(&self, metadata: &DocumentMetadata, content: &str) -> bool {
        let roles: Vec<Role> = metadata.allowed_roles.iter().copied().collect();
        tracing::debug!(
            record_id = %metadata.record_id,
            file_name = %metadata.file_name,
            "Indexing uploaded file"
        );
        self.index(content, &roles).await
    }
}

impl std::fmt::Debug for DocumentIndexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentIndexer").finish_non_exhaustive()
    }
}
