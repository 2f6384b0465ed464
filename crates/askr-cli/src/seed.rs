//! Seed data for the in-memory backends
//!
//! ```json
//! {
//!   "entries": [
//!     { "title": "Leave Policy", "content": "20 days annual leave", "allowedRoles": ["IT"] }
//!   ],
//!   "documents": [
//!     { "content": "VPN access requires WireGuard", "allowedRoles": ["IT", "HR"] }
//!   ]
//! }
//! ```

use anyhow::Context;
use askr_core::Role;
use askr_knowledge::KnowledgeDraft;
use serde::Deserialize;
use std::path::Path;

/// Contents of a seed file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeedFile {
    /// Structured knowledge entries
    pub entries: Vec<KnowledgeDraft>,
    /// Searchable documents
    pub documents: Vec<SeedDocument>,
}

/// A document to index
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedDocument {
    /// Passage text
    pub content: String,
    /// Roles permitted to see the passage
    #[serde(default)]
    pub allowed_roles: Vec<Role>,
}

impl SeedFile {
    /// Parse seed JSON
    ///
    /// # Errors
    /// Malformed JSON, unknown fields or unknown role names
    pub fn from_json(input: &str) -> serde_json::Result<Self> {
        serde_json::from_str(input)
    }

    /// Read and parse a seed file
    ///
    /// # Errors
    /// Fails if the file cannot be read or parsed
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let input = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read seed file {}", path.display()))?;
        Self::from_json(&input)
            .with_context(|| format!("failed to parse seed file {}", path.display()))
    }

    /// Whether there is nothing to seed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_entries_and_documents() {
        let seed = SeedFile::from_json(
            r#"{
                "entries": [
                    { "title": "Leave Policy", "content": "20 days", "allowedRoles": ["IT"] }
                ],
                "documents": [
                    { "content": "VPN needs WireGuard", "allowedRoles": ["IT", "HR"] }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(
            seed.entries,
            vec![KnowledgeDraft::new("Leave Policy", "20 days", [Role::It])]
        );
        assert_eq!(seed.documents[0].allowed_roles, vec![Role::It, Role::Hr]);
    }

    #[test]
    fn sections_are_optional() {
        let seed = SeedFile::from_json("{}").unwrap();
        assert!(seed.is_empty());
    }

    #[test]
    fn unknown_role_names_are_rejected() {
        let err = SeedFile::from_json(r#"{ "documents": [ { "content": "x", "allowedRoles": ["it"] } ] }"#)
            .unwrap_err();
        assert!(err.to_string().contains("unknown variant"));
    }

    #[test]
    fn load_names_the_file_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        std::fs::write(&path, "not json").unwrap();

        let err = SeedFile::load(&path).unwrap_err();
        assert!(err.to_string().contains("seed.json"));
    }
}
