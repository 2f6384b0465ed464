//! HTTP chat completions client

use crate::wire::{ApiError, ChatMessage, ChatRequest, ChatResponse};
use crate::{CompletionProvider, CompletionRequest, LlmError};
use askr_core::{ConfigError, LlmConfig, LlmFlavor};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};

/// API version used for Azure deployments when none is configured
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-02-01";

/// Chat completions over HTTP
///
/// The OpenAI flavor posts to `{base_url}/chat/completions` with bearer
/// auth and names the model in the body. The Azure flavor posts to the
/// deployment URL with an `api-key` header; the deployment implies the
/// model.
#[derive(Clone)]
pub struct ChatCompletionClient {
    http: Client,
    flavor: LlmFlavor,
    url: String,
    model: String,
    api_key: String,
}

impl ChatCompletionClient {
    /// OpenAI-style endpoint, e.g. `https://api.openai.com/v1`
    #[must_use]
    pub fn openai(
        base_url: impl AsRef<str>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            flavor: LlmFlavor::OpenAi,
            url: format!("{}/chat/completions", base_url.as_ref().trim_end_matches('/')),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    /// Azure deployment endpoint, e.g. `https://<name>.openai.azure.com`
    #[must_use]
    pub fn azure(
        endpoint: impl AsRef<str>,
        deployment: impl Into<String>,
        api_version: impl AsRef<str>,
        api_key: impl Into<String>,
    ) -> Self {
        let deployment = deployment.into();
        Self {
            http: Client::new(),
            flavor: LlmFlavor::Azure,
            url: format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                endpoint.as_ref().trim_end_matches('/'),
                deployment,
                api_version.as_ref()
            ),
            model: deployment,
            api_key: api_key.into(),
        }
    }

    /// Build from configuration, reading the key from the environment
    ///
    /// # Errors
    /// Returns `ConfigError::MissingSecret` if the key variable is unset
    pub fn from_config(config: &LlmConfig) -> Result<Self, ConfigError> {
        let api_key = config.api_key()?;
        Ok(match config.flavor {
            LlmFlavor::OpenAi => Self::openai(&config.endpoint, &config.model, api_key),
            LlmFlavor::Azure => Self::azure(
                &config.endpoint,
                &config.model,
                config
                    .api_version
                    .as_deref()
                    .unwrap_or(DEFAULT_AZURE_API_VERSION),
                api_key,
            ),
        })
    }

    /// With a preconfigured reqwest client (proxies, TLS, pooling)
    #[must_use]
    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    /// Request URL
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn body<'a>(&'a self, request: &'a CompletionRequest) -> ChatRequest<'a> {
        ChatRequest {
            model: match self.flavor {
                LlmFlavor::OpenAi => Some(self.model.as_str()),
                LlmFlavor::Azure => None,
            },
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

#[async_trait]
impl CompletionProvider for ChatCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let builder = self.http.post(&self.url).json(&self.body(request));
        let builder = match self.flavor {
            LlmFlavor::OpenAi => builder.bearer_auth(&self.api_key),
            LlmFlavor::Azure => builder.header("api-key", &self.api_key),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_ms = parse_retry_after_ms(response.headers());
            let body = response.text().await.unwrap_or_default();
            let err = classify_failure(status, retry_after_ms, &body);
            tracing::warn!(status = status.as_u16(), error = %err, "Chat completion rejected");
            return Err(err);
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        Ok(extract_content(reply))
    }
}

impl std::fmt::Debug for ChatCompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionClient")
            .field("flavor", &self.flavor)
            .field("url", &self.url)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// First choice's content; no choice or null content is an empty reply
fn extract_content(reply: ChatResponse) -> String {
    reply
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_default()
}

fn classify_failure(status: StatusCode, retry_after_ms: Option<u64>, body: &str) -> LlmError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return LlmError::RateLimited { retry_after_ms };
    }
    let message = serde_json::from_str::<ApiError>(body)
        .map(|api| api.error.message)
        .unwrap_or_else(|_| body.to_string());
    LlmError::Status {
        status: status.as_u16(),
        message,
    }
}

fn parse_retry_after_ms(headers: &HeaderMap) -> Option<u64> {
    let seconds: f64 = headers.get("retry-after")?.to_str().ok()?.parse().ok()?;
    if seconds.is_finite() && seconds >= 0.0 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Some((seconds * 1000.0) as u64)
    } else {
        None
    }
}
