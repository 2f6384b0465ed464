//! Requester roles
//!
//! The role set is closed. Role names are matched case-sensitively against
//! their canonical spelling, which is also the spelling stored in search
//! documents and rendered into filter expressions.

use crate::error::AccessError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of an authenticated requester
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Administrative scope: bypasses all role-visibility filtering
    Admin,
    /// Human resources
    #[serde(rename = "HR")]
    Hr,
    /// Information technology
    #[serde(rename = "IT")]
    It,
    /// Regular employee
    User,
}

impl Role {
    /// Every role, in declaration order
    pub const ALL: [Role; 4] = [Role::Admin, Role::Hr, Role::It, Role::User];

    /// Canonical name
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Hr => "HR",
            Role::It => "IT",
            Role::User => "User",
        }
    }

    /// Whether this role bypasses role-visibility filtering
    #[inline]
    #[must_use]
    pub const fn is_administrative(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Canonical names of every role
    #[must_use]
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(Role::as_str).collect()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| AccessError::UnknownRole(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_canonical_names() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("HR".parse::<Role>().unwrap(), Role::Hr);
        assert_eq!("IT".parse::<Role>().unwrap(), Role::It);
        assert_eq!("User".parse::<Role>().unwrap(), Role::User);
    }

    #[test]
    fn parse_is_case_sensitive() {
        assert!("admin".parse::<Role>().is_err());
        assert!("it".parse::<Role>().is_err());
        assert!(matches!(
            "Finance".parse::<Role>(),
            Err(AccessError::UnknownRole(name)) if name == "Finance"
        ));
    }

    #[test]
    fn display_round_trips() {
        for role in Role::ALL {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn only_admin_is_administrative() {
        assert!(Role::Admin.is_administrative());
        assert!(!Role::Hr.is_administrative());
        assert!(!Role::It.is_administrative());
        assert!(!Role::User.is_administrative());
    }

    #[test]
    fn serde_uses_canonical_names() {
        assert_eq!(toml_value(Role::Hr), "\"HR\"");
        assert_eq!(toml_value(Role::Admin), "\"Admin\"");
    }

    fn toml_value(role: Role) -> String {
        // toml cannot serialize a bare enum, wrap it in a table
        #[derive(Serialize)]
        struct Wrapper {
            role: Role,
        }
        let out = toml::to_string(&Wrapper { role }).unwrap();
        out.trim().trim_start_matches("role = ").to_string()
    }
}
