//! External search context for prompts

use crate::cache::{ContextCache, ContextKey};
use crate::search::{ExternalSearch, SourceSelection};
use coursegen_prompt::Language;
use std::time::Duration;
use tracing::{info, instrument};

/// Separator between snippets in the combined context text
pub const SNIPPET_SEPARATOR: &str = "\n\n";

/// Produces the `external_context` text block for a query.
///
/// Results are cached per query and language. This never fails: sources that
/// error are skipped and an empty string is a valid answer.
#[derive(Clone)]
pub struct ExternalContext {
    search: ExternalSearch,
    cache: ContextCache,
}

impl ExternalContext {
    pub fn new(search: ExternalSearch, cache: ContextCache) -> Self {
        Self { search, cache }
    }

    /// Default public sources with a bounded cache
    pub fn with_defaults(per_source_limit: usize, capacity: usize, ttl: Duration) -> Self {
        Self::new(
            ExternalSearch::with_default_sources(per_source_limit),
            ContextCache::new(capacity, ttl),
        )
    }

    pub fn cache(&self) -> &ContextCache {
        &self.cache
    }

    #[instrument(skip(self))]
    pub async fn context_for(&self, query: &str, language: &Language) -> String {
        let key = ContextKey::new(query, language);
        self.cache
            .get_or_fetch(key, || async {
                let snippets = self
                    .search
                    .search(query, language, &SourceSelection::All)
                    .await;
                info!(snippets = snippets.len(), "Collected external context");
                snippets.join(SNIPPET_SEPARATOR)
            })
            .await
    }
}
