//! Command-line front end for askr
//!
//! The `askr` binary wires configuration, optional seed data and the answer
//! pipeline together. Everything except argument dispatch lives here so it
//! can be tested without spawning the binary.

pub mod backends;
pub mod cli;
pub mod seed;
pub mod telemetry;

pub use backends::Backends;
pub use seed::{SeedDocument, SeedFile};

use anyhow::Context;
use askr_core::AskrConfig;
use std::path::Path;

/// Load and validate configuration; defaults when no path is given
///
/// # Errors
/// Fails if the file cannot be read, parsed or validated
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AskrConfig> {
    match path {
        Some(path) => AskrConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(AskrConfig::default()),
    }
}
