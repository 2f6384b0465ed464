//! Core types for askr
//!
//! Defines the values that flow through the answer pipeline:
//! - Questions (transient, never persisted)
//! - Structured knowledge entries
//! - Documents submitted to the search index
//! - Pipeline tiers

use crate::role::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// A question posed by an authenticated requester
///
/// `user_id` is carried for observability only and is never consulted for
/// authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Free-text question, used verbatim
    pub text: String,
    /// Role of the requester
    pub role: Role,
    /// Opaque requester identifier
    pub user_id: String,
}

impl Question {
    /// Create new question
    #[inline]
    #[must_use]
    pub fn new(text: impl Into<String>, role: Role, user_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            role,
            user_id: user_id.into(),
        }
    }
}

/// One stage of the answer pipeline, each with its own cache namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Structured knowledge base lookup
    Structured,
    /// Search index + LLM synthesis
    Search,
}

impl Tier {
    /// Tag used in cache keys, logs and metrics
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Tier::Structured => "structured",
            Tier::Search => "search",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A curated structured fact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    /// Unique identifier
    pub id: Uuid,
    /// Title, matched against questions
    pub title: String,
    /// Body content, returned as the answer
    pub content: String,
    /// Author of the entry
    pub created_by: String,
    /// Last editor of the entry
    pub updated_by: String,
    /// Creation time (UTC)
    pub created_at: DateTime<Utc>,
    /// Last update time (UTC)
    pub updated_at: DateTime<Utc>,
    /// Roles permitted to view the entry
    pub allowed_roles: BTreeSet<Role>,
}

impl KnowledgeEntry {
    /// Create new entry with a fresh id and the current time
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        allowed_roles: impl IntoIterator<Item = Role>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            content: content.into(),
            created_by: String::new(),
            updated_by: String::new(),
            created_at: now,
            updated_at: now,
            allowed_roles: allowed_roles.into_iter().collect(),
        }
    }

    /// With author (sets both creator and last editor)
    #[inline]
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        let author = author.into();
        self.created_by.clone_from(&author);
        self.updated_by = author;
        self
    }

    /// With creation time (also used as the update time)
    #[inline]
    #[must_use]
    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self.updated_at = at;
        self
    }

    /// Whether title or content contains `needle` (case-sensitive)
    #[inline]
    #[must_use]
    pub fn mentions(&self, needle: &str) -> bool {
        self.title.contains(needle) || self.content.contains(needle)
    }
}

/// Content submitted to the search index together with its visibility
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchableDocument {
    /// Document key in the index
    pub id: String,
    /// Extracted text
    pub content: String,
    /// Canonical role names allowed to see the document
    pub allowed_roles: Vec<String>,
}

impl SearchableDocument {
    /// Create new document with a fresh id
    #[must_use]
    pub fn new(content: impl Into<String>, allowed_roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            allowed_roles: allowed_roles
                .into_iter()
                .map(|role| role.as_str().to_string())
                .collect(),
        }
    }

    /// With explicit id
    #[inline]
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}
