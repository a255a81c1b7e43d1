//! External bibliographic search
//!
//! Each source is a small HTTP client behind the [`SearchSource`] trait with
//! its own rate limiter. [`ExternalSearch`] fans a query out to all of them.

mod aggregator;
mod arxiv;
mod crossref;
mod openalex;

pub use aggregator::{ExternalSearch, SourceSelection};
pub use arxiv::ArxivClient;
pub use crossref::CrossrefClient;
pub use openalex::OpenAlexClient;

use crate::{ContextError, Result};
use async_trait::async_trait;
use coursegen_prompt::Language;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// A searchable bibliographic service
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SearchSource: Send + Sync {
    /// Up to `limit` snippets for `query`, each `"title\nabstract"`
    async fn search(&self, query: &str, language: &Language, limit: usize) -> Result<Vec<String>>;

    /// Source name used in logs and for source selection
    fn name(&self) -> &'static str;
}

fn per_minute_limiter(requests: u32) -> SharedRateLimiter {
    let quota = Quota::per_minute(NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

/// Send a prepared request and return the body of a successful response.
async fn fetch_text(source: &'static str, request: reqwest::RequestBuilder) -> Result<String> {
    let response = request
        .send()
        .await
        .map_err(|e| ContextError::source_failed(source, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ContextError::source_failed(source, format!("HTTP {status}")));
    }

    response
        .text()
        .await
        .map_err(|e| ContextError::source_failed(source, e))
}

/// Collapse runs of whitespace (feeds wrap titles across lines).
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn snippet(title: &str, body: &str) -> String {
    format!("{}\n{}", normalize_whitespace(title), normalize_whitespace(body))
}
