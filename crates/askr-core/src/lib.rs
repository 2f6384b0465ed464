//! askr Core
//!
//! Shared vocabulary for the answer pipeline:
//! - Roles and the single access policy applied at every tier
//! - Knowledge entries, searchable documents and questions
//! - Error taxonomy for upstream faults
//! - Configuration (TOML) and guarded upstream calls (timeout + retry)
//!
//! # Example
//!
//! ```rust,ignore
//! use askr_core::{access, Role};
//!
//! let filter = access::build_search_filter(Role::It);
//! assert_eq!(
//!     filter.map(|f| f.to_odata()).as_deref(),
//!     Some("allowedRoles/any(r: r eq 'IT')"),
//! );
//! assert!(access::build_search_filter(Role::Admin).is_none());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod access;
pub mod config;
pub mod error;
pub mod role;
pub mod types;
pub mod upstream;

pub use access::{build_search_filter, can_role_see_entry, RoleFilter};
pub use config::{
    AskrConfig, CacheConfig, LlmConfig, LlmFlavor, RetrievalConfig, SearchServiceConfig,
    TimeoutConfig,
};
pub use error::{AccessError, AnswerError, ConfigError, UpstreamFailure, UpstreamSource};
pub use role::Role;
pub use types::{KnowledgeEntry, Question, SearchableDocument, Tier};
pub use upstream::{RetryPolicy, UpstreamGuard};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with askr core types
    pub use crate::{
        access, AnswerError, AskrConfig, KnowledgeEntry, Question, Role, RoleFilter,
        SearchableDocument, Tier, UpstreamFailure, UpstreamGuard, UpstreamSource,
    };
}
