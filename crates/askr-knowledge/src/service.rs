//! Knowledge curation
//!
//! Write side of the structured tier. Curators add, edit and remove entries;
//! any role may page through the entries it is allowed to see.
//!
//! Curation does not touch the answer cache: an edited entry is served from
//! cache until the structured TTL lapses.

use crate::store::{KnowledgeQuery, KnowledgeStore, StoreError};
use askr_core::{KnowledgeEntry, Role};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Curation action, for authorization errors and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurationAction {
    /// Add an entry
    Add,
    /// Edit an entry
    Update,
    /// Remove an entry
    Delete,
}

impl fmt::Display for CurationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CurationAction::Add => "add",
            CurationAction::Update => "update",
            CurationAction::Delete => "delete",
        })
    }
}

/// Curation errors
#[derive(Debug, thiserror::Error)]
pub enum CurationError {
    /// Role may not perform this action
    #[error("role {role} may not {action} knowledge entries")]
    Forbidden {
        /// Acting role
        role: Role,
        /// Rejected action
        action: CurationAction,
    },

    /// Page or page size of zero
    #[error("invalid page {page} (size {page_size}); both are 1-based and non-zero")]
    InvalidPage {
        /// Requested page
        page: usize,
        /// Requested page size
        page_size: usize,
    },

    /// Store failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What a role may do to the knowledge base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurationRights {
    /// May add and update entries
    pub write: bool,
    /// May delete entries
    pub delete: bool,
}

impl CurationRights {
    /// Rights for `role`: Admin and HR write, only Admin deletes
    #[must_use]
    pub const fn for_role(role: Role) -> Self {
        match role {
            Role::Admin => Self {
                write: true,
                delete: true,
            },
            Role::Hr => Self {
                write: true,
                delete: false,
            },
            Role::It | Role::User => Self {
                write: false,
                delete: false,
            },
        }
    }

    /// Whether `action` is permitted
    #[must_use]
    pub const fn permits(&self, action: CurationAction) -> bool {
        match action {
            CurationAction::Add | CurationAction::Update => self.write,
            CurationAction::Delete => self.delete,
        }
    }
}

/// Who is curating
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Recorded as creator / last editor
    pub name: String,
    /// Role used for authorization
    pub role: Role,
}

impl Actor {
    /// Create new actor
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }

    fn authorize(&self, action: CurationAction) -> Result<(), CurationError> {
        if CurationRights::for_role(self.role).permits(action) {
            Ok(())
        } else {
            tracing::warn!(actor = %self.name, role = %self.role, %action, "Curation denied");
            Err(CurationError::Forbidden {
                role: self.role,
                action,
            })
        }
    }
}

/// Editable fields of an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeDraft {
    /// Title
    pub title: String,
    /// Content
    pub content: String,
    /// Roles permitted to view the entry
    pub allowed_roles: BTreeSet<Role>,
}

impl KnowledgeDraft {
    /// Create new draft
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        allowed_roles: impl IntoIterator<Item = Role>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            allowed_roles: allowed_roles.into_iter().collect(),
        }
    }
}

/// Curation over a [`KnowledgeStore`]
#[derive(Clone)]
pub struct KnowledgeService {
    store: Arc<dyn KnowledgeStore>,
}

impl KnowledgeService {
    /// Create service over `store`
    #[must_use]
    pub fn new(store: Arc<dyn KnowledgeStore>) -> Self {
        Self { store }
    }

    /// Add an entry; returns its id
    ///
    /// # Errors
    /// `Forbidden` unless the actor may write; `Store` on backend failure
    pub async fn add(&self, actor: &Actor, draft: KnowledgeDraft) -> Result<Uuid, CurationError> {
        actor.authorize(CurationAction::Add)?;

        let entry = KnowledgeEntry::new(draft.title, draft.content, draft.allowed_roles)
            .with_author(actor.name.clone());
        let id = entry.id;
        self.store.insert(entry).await?;

        tracing::info!(entry_id = %id, actor = %actor.name, "Knowledge entry added");
        Ok(id)
    }

    /// Replace title, content and allowed roles; `false` if `id` is unknown
    ///
    /// # Errors
    /// `Forbidden` unless the actor may write; `Store` on backend failure
    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        draft: KnowledgeDraft,
    ) -> Result<bool, CurationError> {
        actor.authorize(CurationAction::Update)?;

        let Some(mut entry) = self.store.get(id).await? else {
            tracing::debug!(entry_id = %id, "Update of unknown entry");
            return Ok(false);
        };
        entry.title = draft.title;
        entry.content = draft.content;
        entry.allowed_roles = draft.allowed_roles;
        entry.updated_by.clone_from(&actor.name);
        entry.updated_at = Utc::now();

        let replaced = self.store.replace(entry).await?;
        if replaced {
            tracing::info!(entry_id = %id, actor = %actor.name, "Knowledge entry updated");
        }
        Ok(replaced)
    }

    /// Remove an entry; `false` if `id` is unknown
    ///
    /// # Errors
    /// `Forbidden` unless the actor is an administrator; `Store` on backend
    /// failure
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<bool, CurationError> {
        actor.authorize(CurationAction::Delete)?;

        let removed = self.store.remove(id).await?;
        if removed {
            tracing::info!(entry_id = %id, actor = %actor.name, "Knowledge entry deleted");
        }
        Ok(removed)
    }

    /// Fetch an entry by id
    ///
    /// # Errors
    /// `Store` on backend failure
    pub async fn get(&self, id: Uuid) -> Result<Option<KnowledgeEntry>, CurationError> {
        Ok(self.store.get(id).await?)
    }

    /// Entries visible to `role`, newest first, `page` counted from 1
    ///
    /// # Errors
    /// `InvalidPage` if `page` or `page_size` is zero; `Store` on backend
    /// failure
    pub async fn list_for_role(
        &self,
        role: Role,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<KnowledgeEntry>, CurationError> {
        if page == 0 || page_size == 0 {
            return Err(CurationError::InvalidPage { page, page_size });
        }

        let mut entries = self.store.query(&KnowledgeQuery::visible_to(role)).await?;
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let skip = (page - 1).saturating_mul(page_size);
        Ok(entries.into_iter().skip(skip).take(page_size).collect())
    }
}

impl fmt::Debug for KnowledgeService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KnowledgeService").finish_non_exhaustive()
    }
}
