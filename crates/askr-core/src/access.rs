//! Role-based access policy
//!
//! One policy serves both tiers. The structured tier and the search tier
//! both obtain their filter from [`build_search_filter`]; entry visibility is
//! derived from the same filter, so the two can never drift apart.

use crate::role::Role;
use crate::types::KnowledgeEntry;
use std::fmt;

/// Restricts results to items whose allowed-role list contains one role
///
/// Absence of a filter (`None`) means unrestricted visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoleFilter {
    role: Role,
}

impl RoleFilter {
    /// The role every admitted item must allow
    #[inline]
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Whether an item with these allowed roles passes the filter
    #[must_use]
    pub fn admits<'a>(&self, allowed: impl IntoIterator<Item = &'a Role>) -> bool {
        allowed.into_iter().any(|role| *role == self.role)
    }

    /// Whether an item with these allowed role names passes the filter
    ///
    /// Names are compared exactly against the canonical role name.
    #[must_use]
    pub fn admits_names<S: AsRef<str>>(&self, allowed: &[S]) -> bool {
        allowed
            .iter()
            .any(|name| name.as_ref() == self.role.as_str())
    }

    /// OData expression understood by the search service
    #[must_use]
    pub fn to_odata(&self) -> String {
        format!("allowedRoles/any(r: r eq '{}')", self.role)
    }
}

impl fmt::Display for RoleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_odata())
    }
}

/// Filter for queries issued on behalf of `role`
///
/// Returns `None` for administrative scope.
#[inline]
#[must_use]
pub fn build_search_filter(role: Role) -> Option<RoleFilter> {
    if role.is_administrative() {
        None
    } else {
        Some(RoleFilter { role })
    }
}

/// Whether `role` may see `entry`
#[must_use]
pub fn can_role_see_entry(role: Role, entry: &KnowledgeEntry) -> bool {
    build_search_filter(role).map_or(true, |filter| filter.admits(&entry.allowed_roles))
}
