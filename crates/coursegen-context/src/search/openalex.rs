//! OpenAlex works search

use super::{SearchSource, SharedRateLimiter, fetch_text, per_minute_limiter, snippet};
use crate::{ContextError, Result};
use async_trait::async_trait;
use coursegen_prompt::Language;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

const SOURCE: &str = "openalex";
const DEFAULT_BASE_URL: &str = "https://api.openalex.org/works";
const REQUESTS_PER_MINUTE: u32 = 100;
const TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct WorksResponse {
    #[serde(default)]
    results: Vec<Work>,
}

#[derive(Debug, Deserialize)]
struct Work {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    abstract_inverted_index: Option<HashMap<String, Vec<usize>>>,
}

/// OpenAlex API client
pub struct OpenAlexClient {
    client: Client,
    base_url: String,
    rate_limiter: SharedRateLimiter,
}

impl OpenAlexClient {
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

impl Default for OpenAlexClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Rebuild abstract text from OpenAlex's `word -> [positions]` index.
fn rebuild_abstract(index: &HashMap<String, Vec<usize>>) -> String {
    let mut tokens: Vec<(usize, &str)> = index
        .iter()
        .flat_map(|(word, positions)| positions.iter().map(move |pos| (*pos, word.as_str())))
        .collect();
    tokens.sort_by_key(|(pos, _)| *pos);
    tokens
        .into_iter()
        .map(|(_, word)| word)
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl SearchSource for OpenAlexClient {
    #[instrument(skip(self, _language))]
    async fn search(&self, query: &str, _language: &Language, limit: usize) -> Result<Vec<String>> {
        self.rate_limiter.until_ready().await;

        let per_page = limit.to_string();
        let request = self
            .client
            .get(&self.base_url)
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .query(&[("search", query), ("per-page", per_page.as_str())]);

        let body = fetch_text(SOURCE, request).await?;
        let parsed: WorksResponse =
            serde_json::from_str(&body).map_err(|e| ContextError::malformed(SOURCE, e))?;

        let results: Vec<String> = parsed
            .results
            .iter()
            .map(|work| {
                let abstract_text = work
                    .abstract_inverted_index
                    .as_ref()
                    .map(rebuild_abstract)
                    .unwrap_or_default();
                snippet(work.display_name.as_deref().unwrap_or(""), &abstract_text)
            })
            .collect();

        debug!(results = results.len(), "OpenAlex results");
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

    #[test]
    fn test_rebuild_abstract_orders_by_position() {
        let index: HashMap<String, Vec<usize>> = serde_json::from_value(json!({
            "safety": [3],
            "Rust": [0],
            "memory": [2],
            "guarantees": [1],
        }))
        .unwrap();
        assert_eq!(rebuild_abstract(&index), "Rust guarantees memory safety");
    }

    #[test]
    fn test_rebuild_abstract_repeated_words() {
        let index: HashMap<String, Vec<usize>> =
            serde_json::from_value(json!({ "the": [0, 2], "cat": [1], "mat": [3] })).unwrap();
        assert_eq!(rebuild_abstract(&index), "the cat the mat");
    }

    #[tokio::test]
    async fn test_search_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("search", "type theory"))
            .and(query_param("per-page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "meta": { "count": 2 },
                "results": [
                    {
                        "display_name": "Types and Programming Languages",
                        "abstract_inverted_index": { "A": [0], "textbook": [1] }
                    },
                    { "display_name": "Untyped Notes", "abstract_inverted_index": null }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAlexClient::with_base_url(server.uri());
        let results = client
            .search("type theory", &Language::English, 2)
            .await
            .unwrap();

        assert_eq!(
            results,
            vec![
                "Types and Programming Languages\nA textbook".to_string(),
                "Untyped Notes\n".to_string(),
            ]
        );
    }
}
