//! REST search service client
//!
//! Speaks the Azure Cognitive Search documents API: queries go to
//! `POST {endpoint}/indexes/{index}/docs/search`, uploads to
//! `POST {endpoint}/indexes/{index}/docs/index`, both authenticated with an
//! `api-key` header. The role filter is sent as an OData expression.

use crate::index::{SearchError, SearchHit, SearchIndex, SearchRequest, SearchResults};
use askr_core::{ConfigError, SearchServiceConfig, SearchableDocument};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryBody<'a> {
    search: &'a str,
    top: usize,
    count: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    select: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryReply {
    #[serde(rename = "@odata.count", default)]
    count: Option<u64>,
    #[serde(default)]
    value: Vec<Map<String, Value>>,
}

#[derive(Debug, Serialize)]
struct UploadBody<'a> {
    value: Vec<UploadAction<'a>>,
}

#[derive(Debug, Serialize)]
struct UploadAction<'a> {
    #[serde(rename = "@search.action")]
    action: &'static str,
    #[serde(flatten)]
    document: &'a SearchableDocument,
}

#[derive(Debug, Deserialize)]
struct UploadReply {
    #[serde(default)]
    value: Vec<UploadStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadStatus {
    status: bool,
    #[serde(default)]
    error_message: Option<String>,
}

const SCORE_FIELD: &str = "@search.score";

/// Search index behind a REST service
#[derive(Clone)]
pub struct RestSearchIndex {
    http: Client,
    endpoint: String,
    index: String,
    api_key: String,
    api_version: String,
}

impl RestSearchIndex {
    /// Create client for `index` at `endpoint`
    #[must_use]
    pub fn new(
        endpoint: impl AsRef<str>,
        index: impl Into<String>,
        api_key: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.as_ref().trim_end_matches('/').to_string(),
            index: index.into(),
            api_key: api_key.into(),
            api_version: api_version.into(),
        }
    }

    /// Build from configuration, reading the key from the environment
    ///
    /// # Errors
    /// Returns `ConfigError::MissingSecret` if the key variable is unset
    pub fn from_config(config: &SearchServiceConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            &config.endpoint,
            &config.index,
            config.api_key()?,
            &config.api_version,
        ))
    }

    /// With a preconfigured reqwest client
    #[must_use]
    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    fn url(&self, operation: &str) -> String {
        format!(
            "{}/indexes/{}/docs/{}?api-version={}",
            self.endpoint, self.index, operation, self.api_version
        )
    }

    async fn post<B: Serialize + Sync, R: DeserializeOwned>(
        &self,
        operation: &str,
        body: &B,
    ) -> Result<R, SearchError> {
        let response = self
            .http
            .post(self.url(operation))
            .header("api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))
    }
}

fn query_body(request: &SearchRequest) -> QueryBody<'_> {
    QueryBody {
        search: &request.text,
        top: request.top,
        count: true,
        filter: request.filter.map(|filter| filter.to_odata()),
        select: (!request.select.is_empty()).then(|| request.select.join(",")),
    }
}

fn into_results(reply: QueryReply) -> SearchResults {
    let hits = reply
        .value
        .into_iter()
        .map(|mut document| {
            let score = document
                .remove(SCORE_FIELD)
                .and_then(|s| s.as_f64())
                .unwrap_or_default();
            document.retain(|name, _| !name.starts_with("@search."));
            SearchHit { score, document }
        })
        .collect();
    SearchResults {
        hits,
        total_count: reply.count,
    }
}

fn check_upload(reply: &UploadReply) -> Result<(), SearchError> {
    let failed: Vec<&UploadStatus> = reply.value.iter().filter(|s| !s.status).collect();
    match failed.first() {
        None => Ok(()),
        Some(first) => Err(SearchError::Rejected {
            rejected: failed.len(),
            message: first.error_message.clone().unwrap_or_default(),
        }),
    }
}

#[async_trait]
impl SearchIndex for RestSearchIndex {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResults, SearchError> {
        let reply: QueryReply = self.post("search", &query_body(request)).await?;
        let results = into_results(reply);
        tracing::debug!(
            index = %self.index,
            hits = results.hits.len(),
            total = ?results.total_count,
            "Search service replied"
        );
        Ok(results)
    }

    async fn upload(&self, documents: Vec<SearchableDocument>) -> Result<(), SearchError> {
        let body = UploadBody {
            value: documents
                .iter()
                .map(|document| UploadAction {
                    action: "mergeOrUpload",
                    document,
                })
                .collect(),
        };
        let reply: UploadReply = self.post("index", &body).await?;
        check_upload(&reply)
    }
}

impl std::fmt::Debug for RestSearchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestSearchIndex")
            .field("endpoint", &self.endpoint)
            .field("index", &self.index)
            .field("api_version", &self.api_version)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use askr_core::{access, Role};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn urls() {
        let index = RestSearchIndex::new("https://corp.search.windows.net/", "docs", "k", "2023-11-01");
        assert_eq!(
            index.url("search"),
            "https://corp.search.windows.net/indexes/docs/docs/search?api-version=2023-11-01"
        );
    }

    #[test]
    fn query_body_carries_odata_filter() {
        let request = SearchRequest::new("Leave Policy")
            .with_filter(access::build_search_filter(Role::It))
            .with_select(["content", "allowedRoles"]);

        let body = serde_json::to_value(query_body(&request)).unwrap();
        assert_eq!(
            body,
            json!({
                "search": "Leave Policy",
                "top": 5,
                "count": true,
                "filter": "allowedRoles/any(r: r eq 'IT')",
                "select": "content,allowedRoles"
            })
        );
    }

    #[test]
    fn admin_query_has_no_filter() {
        let request =
            SearchRequest::new("anything").with_filter(access::build_search_filter(Role::Admin));
        let body = serde_json::to_value(query_body(&request)).unwrap();
        assert!(body.get("filter").is_none());
        assert!(body.get("select").is_none());
    }

    #[test]
    fn reply_parsing_strips_search_metadata() {
        let reply: QueryReply = serde_json::from_value(json!({
            "@odata.count": 7,
            "value": [
                { "@search.score": 2.5, "@search.highlights": {}, "content": "20 days", "allowedRoles": ["IT"] },
                { "content": "no score" }
            ]
        }))
        .unwrap();

        let results = into_results(reply);
        assert_eq!(results.total_count, Some(7));
        assert_eq!(results.hits.len(), 2);
        assert!((results.hits[0].score - 2.5).abs() < f64::EPSILON);
        assert_eq!(results.hits[0].document.len(), 2);
        assert_eq!(results.hits[1].content(), Some("no score"));
    }

    #[test]
    fn upload_body_shape() {
        let doc = SearchableDocument::new("handbook", [Role::Hr]).with_id("d1");
        let body = UploadBody {
            value: vec![UploadAction {
                action: "mergeOrUpload",
                document: &doc,
            }],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "value": [{
                "@search.action": "mergeOrUpload",
                "id": "d1",
                "content": "handbook",
                "allowedRoles": ["HR"]
            }]})
        );
    }

    #[test]
    fn partial_upload_failure_is_rejected() {
        let reply: UploadReply = serde_json::from_value(json!({
            "value": [
                { "key": "a", "status": true, "statusCode": 201 },
                { "key": "b", "status": false, "statusCode": 400, "errorMessage": "bad field" }
            ]
        }))
        .unwrap();

        match check_upload(&reply) {
            Err(SearchError::Rejected { rejected, message }) => {
                assert_eq!(rejected, 1);
                assert_eq!(message, "bad field");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn debug_redacts_key() {
        let index = RestSearchIndex::new("https://x", "docs", "secret-key", "v");
        assert!(!format!("{index:?}").contains("secret-key"));
    }
}
