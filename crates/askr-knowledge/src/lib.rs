//! askr Knowledge
//!
//! The structured side of the pipeline:
//! - [`KnowledgeStore`]: the persistence boundary, with an in-memory backend
//! - [`StructuredLookup`]: the cheap, deterministic first answer tier
//! - [`KnowledgeService`]: curation (add, update, delete, list)
//!
//! # Example
//!
//! ```rust,ignore
//! use askr_knowledge::{MemoryKnowledgeStore, StructuredLookup};
//! use askr_cache::AnswerCache;
//! use askr_core::{KnowledgeEntry, Role};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryKnowledgeStore::with_entries([
//!     KnowledgeEntry::new("Leave Policy", "20 days annual leave", [Role::It]),
//! ]));
//! let lookup = StructuredLookup::new(store, AnswerCache::default());
//!
//! let answer = lookup.find("Leave Policy", Role::It).await?;
//! assert_eq!(answer.as_deref(), Some("20 days annual leave"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod lookup;
pub mod service;
pub mod store;

pub use lookup::StructuredLookup;
pub use service::{
    Actor, CurationAction, CurationError, CurationRights, KnowledgeDraft, KnowledgeService,
};
pub use store::{KnowledgeQuery, KnowledgeStore, MemoryKnowledgeStore, StoreError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
