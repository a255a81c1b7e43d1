//! arXiv search client (Atom feed)

use super::{SearchSource, SharedRateLimiter, fetch_text, per_minute_limiter, snippet};
use crate::{ContextError, Result};
use async_trait::async_trait;
use coursegen_prompt::Language;
use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

const SOURCE: &str = "arxiv";
const DEFAULT_BASE_URL: &str = "http://export.arxiv.org/api/query";
/// arXiv asks clients to keep to about one request every three seconds.
const REQUESTS_PER_MINUTE: u32 = 20;
const TIMEOUT_SECS: u64 = 10;

/// arXiv API client
pub struct ArxivClient {
    client: Client,
    base_url: String,
    rate_limiter: SharedRateLimiter,
}

impl ArxivClient {
    /// Create a client against the public arXiv API
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a client against a custom endpoint
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            rate_limiter: per_minute_limiter(REQUESTS_PER_MINUTE),
        }
    }
}

impl Default for ArxivClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchSource for ArxivClient {
    #[instrument(skip(self, _language))]
    async fn search(&self, query: &str, _language: &Language, limit: usize) -> Result<Vec<String>> {
        self.rate_limiter.until_ready().await;

        let search_query = format!("all:{query}");
        let max_results = limit.to_string();
        let request = self
            .client
            .get(&self.base_url)
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .query(&[
                ("search_query", search_query.as_str()),
                ("start", "0"),
                ("max_results", max_results.as_str()),
            ]);

        let body = fetch_text(SOURCE, request).await?;
        let entries = parse_feed(&body)?;
        debug!(entries = entries.len(), "arXiv results");
        Ok(entries)
    }

    fn name(&self) -> &'static str {
        SOURCE
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Summary,
}

/// Extract `"title\nsummary"` for every `<entry>` of an Atom feed.
fn parse_feed(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut in_entry = false;
    let mut field: Option<Field> = None;
    let mut title = String::new();
    let mut summary = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"entry" => {
                    in_entry = true;
                    title.clear();
                    summary.clear();
                }
                b"title" if in_entry => field = Some(Field::Title),
                b"summary" if in_entry => field = Some(Field::Summary),
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"entry" => {
                    in_entry = false;
                    if !title.trim().is_empty() {
                        entries.push(snippet(&title, &summary));
                    }
                }
                b"title" | b"summary" => field = None,
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if let Some(current) = field {
                    let text = e
                        .unescape()
                        .map_err(|err| ContextError::malformed(SOURCE, err))?;
                    let target = match current {
                        Field::Title => &mut title,
                        Field::Summary => &mut summary,
                    };
                    if !target.is_empty() {
                        target.push(' ');
                    }
                    target.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ContextError::malformed(
                    SOURCE,
                    format!("error at position {}: {e}", reader.buffer_position()),
                ));
            }
            _ => {}
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="html">ArXiv Query: search_query=all:rust</title>
  <entry>
    <id>http://arxiv.org/abs/0000.00001v1</id>
    <title>Ownership Types
      for Safe Systems Programming</title>
    <summary>  We study &amp; formalize borrowing.
    </summary>
  </entry>
  <entry>
    <title>Second Paper</title>
    <summary>Another abstract.</summary>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_feed() {
        let entries = parse_feed(FEED).unwrap();
        assert_eq!(
            entries,
            vec![
                "Ownership Types for Safe Systems Programming\nWe study & formalize borrowing."
                    .to_string(),
                "Second Paper\nAnother abstract.".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_empty_feed() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>none</title></feed>"#;
        assert!(parse_feed(xml).unwrap().is_empty());
    }

    #[test]
    fn test_parse_broken_feed() {
        let result = parse_feed("<feed><entry><title>x</summary></feed>");
        assert!(matches!(result, Err(ContextError::MalformedResponse { .. })));
    }

    #[tokio::test]
    async fn test_search_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("search_query", "all:borrow checker"))
            .and(query_param("max_results", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FEED))
            .expect(1)
            .mount(&server)
            .await;

        let client = ArxivClient::with_base_url(server.uri());
        let results = client
            .search("borrow checker", &Language::English, 3)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_search_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = ArxivClient::with_base_url(server.uri());
        let err = client
            .search("rust", &Language::Russian, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, ContextError::SourceFailed { source_name: "arxiv", .. }));
    }
}
