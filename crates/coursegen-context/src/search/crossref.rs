//! CrossRef works search

use super::{SearchSource, SharedRateLimiter, fetch_text, per_minute_limiter, snippet};
use crate::{ContextError, Result};
use async_trait::async_trait;
use coursegen_prompt::Language;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

const SOURCE: &str = "crossref";
const DEFAULT_BASE_URL: &str = "https://api.crossref.org/works";
const REQUESTS_PER_MINUTE: u32 = 50;
const TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct WorksResponse {
    #[serde(default)]
    message: WorksMessage,
}

#[derive(Debug, Default, Deserialize)]
struct WorksMessage {
    #[serde(default)]
    items: Vec<WorkItem>,
}

#[derive(Debug, Deserialize)]
struct WorkItem {
    #[serde(default)]
    title: Vec<String>,
    #[serde(default, rename = "abstract")]
    abstract_text: Option<String>,
}

/// CrossRef REST API client
pub struct CrossrefClient {
    client: Client,
    base_url: String,
    rate_limiter: SharedRateLimiter,
}

impl CrossrefClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            rate_limiter: per_minute_limiter(REQUESTS_PER_MINUTE),
        }
    }
}

impl Default for CrossrefClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchSource for CrossrefClient {
    #[instrument(skip(self, _language))]
    async fn search(&self, query: &str, _language: &Language, limit: usize) -> Result<Vec<String>> {
        self.rate_limiter.until_ready().await;

        let rows = limit.to_string();
        let request = self
            .client
            .get(&self.base_url)
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .query(&[("query", query), ("rows", rows.as_str())]);

        let body = fetch_text(SOURCE, request).await?;
        let parsed: WorksResponse =
            serde_json::from_str(&body).map_err(|e| ContextError::malformed(SOURCE, e))?;

        // Untitled works carry nothing useful for a prompt.
        let results: Vec<String> = parsed
            .message
            .items
            .into_iter()
            .filter_map(|item| {
                let title = item.title.into_iter().next()?;
                Some(snippet(&title, item.abstract_text.as_deref().unwrap_or("")))
            })
            .collect();

        debug!(results = results.len(), "CrossRef results");
        Ok(results)
    }

    fn name(&self) -> &'static str {
        SOURCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_search_skips_untitled_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("query", "machine learning"))
            .and(query_param("rows", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok",
                "message": {
                    "items": [
                        { "title": ["Deep Learning"], "abstract": "Neural networks." },
                        { "title": [] },
                        { "DOI": "10.1000/none" },
                        { "title": ["No Abstract"] }
                    ]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = CrossrefClient::with_base_url(server.uri());
        let results = client
            .search("machine learning", &Language::English, 5)
            .await
            .unwrap();

        assert_eq!(
            results,
            vec![
                "Deep Learning\nNeural networks.".to_string(),
                "No Abstract\n".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_search_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
            .mount(&server)
            .await;

        let client = CrossrefClient::with_base_url(server.uri());
        let err = client
            .search("rust", &Language::Russian, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, ContextError::MalformedResponse { source_name: "crossref", .. }));
    }

    #[tokio::test]
    async fn test_search_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = CrossrefClient::with_base_url(server.uri());
        assert!(client.search("rust", &Language::Russian, 5).await.is_err());
    }
}
