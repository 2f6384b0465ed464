//! askr configuration
//!
//! Loaded from TOML. Every section has defaults, so an empty file is a valid
//! configuration backed by in-memory collaborators. Secrets are never stored
//! in the file: the LLM and search sections name the environment variable
//! that holds the key.

use crate::error::ConfigError;
use crate::upstream::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default instruction constraining the model to the grounding block
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful enterprise assistant. \
Answer concisely using only the documents provided. \
If the documents do not contain the answer, say so.";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AskrConfig {
    /// Answer cache sizing and expiry
    pub cache: CacheConfig,
    /// Search + LLM tier tuning
    pub retrieval: RetrievalConfig,
    /// Bounds on upstream calls
    pub timeouts: TimeoutConfig,
    /// Retry policy for transient upstream failures
    pub retry: RetryPolicy,
    /// LLM completion service (absent: none configured)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm: Option<LlmConfig>,
    /// Remote search service (absent: in-memory index)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_service: Option<SearchServiceConfig>,
}

impl AskrConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With cache section
    #[inline]
    #[must_use]
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// With retrieval section
    #[inline]
    #[must_use]
    pub fn with_retrieval(mut self, retrieval: RetrievalConfig) -> Self {
        self.retrieval = retrieval;
        self
    }

    /// With timeouts section
    #[inline]
    #[must_use]
    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// With retry policy
    #[inline]
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Parse and validate TOML
    ///
    /// # Errors
    /// Returns `ConfigError::Parse` on malformed TOML and
    /// `ConfigError::Invalid` when validation fails
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// Returns `ConfigError::Io` if the file cannot be read, otherwise as
    /// [`AskrConfig::from_toml_str`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input =
            std::fs::read_to_string(path).map_err(|e| ConfigError::io_error(path, e))?;
        Self::from_toml_str(&input)
    }

    /// Render as TOML
    ///
    /// # Errors
    /// Returns `ConfigError::Serialize` if rendering fails
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check invariants that serde cannot express
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` naming the first offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.max_capacity == 0 {
            return Err(ConfigError::Invalid("cache.max_capacity must be > 0".into()));
        }
        if self.cache.structured_ttl_secs == 0 || self.cache.search_ttl_secs == 0 {
            return Err(ConfigError::Invalid("cache TTLs must be > 0".into()));
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::Invalid("retrieval.top_k must be > 0".into()));
        }
        if !(0.0..=2.0).contains(&self.retrieval.temperature) {
            return Err(ConfigError::Invalid(format!(
                "retrieval.temperature must be within 0.0..=2.0, got {}",
                self.retrieval.temperature
            )));
        }
        if self.retrieval.max_tokens == 0 {
            return Err(ConfigError::Invalid("retrieval.max_tokens must be > 0".into()));
        }
        if self.timeouts.store_ms == 0 || self.timeouts.search_ms == 0 || self.timeouts.llm_ms == 0
        {
            return Err(ConfigError::Invalid("timeouts must be > 0".into()));
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigError::Invalid(
                "retry.base_delay_ms must not exceed retry.max_delay_ms".into(),
            ));
        }
        Ok(())
    }
}

/// Answer cache configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached answers across tiers
    pub max_capacity: u64,
    /// TTL for structured answers in seconds
    pub structured_ttl_secs: u64,
    /// TTL for generated answers in seconds
    pub search_ttl_secs: u64,
}

impl CacheConfig {
    /// TTL for structured answers
    #[inline]
    #[must_use]
    pub fn structured_ttl(&self) -> Duration {
        Duration::from_secs(self.structured_ttl_secs)
    }

    /// TTL for generated answers
    #[inline]
    #[must_use]
    pub fn search_ttl(&self) -> Duration {
        Duration::from_secs(self.search_ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            structured_ttl_secs: 60 * 60,
            search_ttl_secs: 30 * 60,
        }
    }
}

/// Search + LLM tier configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of search hits used as grounding
    pub top_k: usize,
    /// Sampling temperature
    pub temperature: f32,
    /// Output token ceiling
    pub max_tokens: u32,
    /// Instruction constraining the model to the grounding block
    pub system_prompt: String,
}

impl RetrievalConfig {
    /// With top-k
    #[inline]
    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// With max output tokens
    #[inline]
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            temperature: 0.2,
            max_tokens: 800,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Bounds on upstream calls, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Structured store queries
    pub store_ms: u64,
    /// Search index queries
    pub search_ms: u64,
    /// LLM completions
    pub llm_ms: u64,
}

impl TimeoutConfig {
    /// Structured store bound
    #[inline]
    #[must_use]
    pub fn store(&self) -> Duration {
        Duration::from_millis(self.store_ms)
    }

    /// Search index bound
    #[inline]
    #[must_use]
    pub fn search(&self) -> Duration {
        Duration::from_millis(self.search_ms)
    }

    /// LLM bound
    #[inline]
    #[must_use]
    pub fn llm(&self) -> Duration {
        Duration::from_millis(self.llm_ms)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            store_ms: 5_000,
            search_ms: 10_000,
            llm_ms: 30_000,
        }
    }
}

/// Flavor of chat-completions endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmFlavor {
    /// `{endpoint}/chat/completions`, bearer auth, model in body
    #[default]
    OpenAi,
    /// `{endpoint}/openai/deployments/{model}/chat/completions`, `api-key` header
    Azure,
}

/// LLM completion service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Endpoint flavor
    #[serde(default)]
    pub flavor: LlmFlavor,
    /// Base URL
    pub endpoint: String,
    /// Model name (OpenAI) or deployment name (Azure)
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// API version (Azure only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

impl LlmConfig {
    /// Read the API key from the environment
    ///
    /// # Errors
    /// Returns `ConfigError::MissingSecret` if the variable is unset
    pub fn api_key(&self) -> Result<String, ConfigError> {
        std::env::var(&self.api_key_env)
            .map_err(|_| ConfigError::MissingSecret(self.api_key_env.clone()))
    }
}

/// Remote search service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchServiceConfig {
    /// Service endpoint, e.g. `https://<name>.search.windows.net`
    pub endpoint: String,
    /// Index name
    pub index: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// REST API version
    #[serde(default = "default_search_api_version")]
    pub api_version: String,
}

impl SearchServiceConfig {
    /// Read the API key from the environment
    ///
    /// # Errors
    /// Returns `ConfigError::MissingSecret` if the variable is unset
    pub fn api_key(&self) -> Result<String, ConfigError> {
        std::env::var(&self.api_key_env)
            .map_err(|_| ConfigError::MissingSecret(self.api_key_env.clone()))
    }
}

fn default_search_api_version() -> String {
    "2023-11-01".to_string()
}
