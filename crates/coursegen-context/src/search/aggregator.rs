//! Fan-out search over several sources

use super::{ArxivClient, CrossrefClient, OpenAlexClient, SearchSource};
use coursegen_prompt::Language;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Which sources a search should consult
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SourceSelection {
    #[default]
    All,
    /// A single source by its [`SearchSource::name`]
    Only(String),
}

impl SourceSelection {
    fn includes(&self, source: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(name) => name.eq_ignore_ascii_case(source),
        }
    }
}

impl From<&str> for SourceSelection {
    fn from(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Only(value.trim().to_lowercase())
        }
    }
}

/// Aggregated search over a fixed, ordered list of sources.
///
/// Sources are queried concurrently. Results keep source order, and a source
/// that fails contributes nothing.
#[derive(Clone)]
pub struct ExternalSearch {
    sources: Vec<Arc<dyn SearchSource>>,
    per_source_limit: usize,
}

impl ExternalSearch {
    /// Create an aggregator over the given sources
    pub fn new(sources: Vec<Arc<dyn SearchSource>>, per_source_limit: usize) -> Self {
        Self {
            sources,
            per_source_limit,
        }
    }

    /// arXiv, CrossRef and OpenAlex, in that order
    pub fn with_default_sources(per_source_limit: usize) -> Self {
        Self::new(
            vec![
                Arc::new(ArxivClient::new()),
                Arc::new(CrossrefClient::new()),
                Arc::new(OpenAlexClient::new()),
            ],
            per_source_limit,
        )
    }

    /// Names of the configured sources
    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Query the selected sources and concatenate their snippets
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        query: &str,
        language: &Language,
        selection: &SourceSelection,
    ) -> Vec<String> {
        let selected: Vec<&Arc<dyn SearchSource>> = self
            .sources
            .iter()
            .filter(|s| selection.includes(s.name()))
            .collect();

        let outcomes = join_all(
            selected
                .iter()
                .map(|source| source.search(query, language, self.per_source_limit)),
        )
        .await;

        let mut results = Vec::new();
        for (source, outcome) in selected.iter().zip(outcomes) {
            match outcome {
                Ok(snippets) => {
                    debug!(source = source.name(), count = snippets.len(), "Source answered");
                    results.extend(snippets);
                }
                Err(e) => warn!(source = source.name(), error = %e, "Search source failed, skipping"),
            }
        }
        results
    }
}
