//! askr Search
//!
//! The generative side of the pipeline:
//! - [`SearchIndex`]: query/upload boundary, with in-memory and REST backends
//! - [`RetrievalAugmentedSearch`]: role-filtered retrieval + grounded completion
//! - [`DocumentIndexer`]: ingestion of extracted document text
//!
//! # Example
//!
//! ```rust,ignore
//! use askr_search::{MemorySearchIndex, RetrievalAugmentedSearch};
//! use askr_cache::AnswerCache;
//! use askr_core::{Role, SearchableDocument};
//! use std::sync::Arc;
//!
//! # async fn example(llm: Arc<dyn askr_llm::CompletionProvider>) -> Result<(), Box<dyn std::error::Error>> {
//! let index = Arc::new(MemorySearchIndex::with_documents([
//!     SearchableDocument::new("IT staff get 20 days of annual leave", [Role::It]),
//! ]));
//! let tier = RetrievalAugmentedSearch::new(index, llm, AnswerCache::default());
//!
//! let answer = tier.find("annual leave", Role::It).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod index;
pub mod indexer;
pub mod memory;
pub mod rag;
pub mod rest;

pub use index::{
    SearchError, SearchHit, SearchIndex, SearchRequest, SearchResults, ALLOWED_ROLES_FIELD,
    CONTENT_FIELD,
};
pub use indexer::{DocumentIndexer, DocumentMetadata};
pub use memory::MemorySearchIndex;
pub use rag::{build_grounding, build_prompt, RetrievalAugmentedSearch, PASSAGE_DELIMITER};
pub use rest::RestSearchIndex;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
