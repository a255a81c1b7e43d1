//! Error types for context enrichment

use thiserror::Error;

/// Result type for context operations
pub type Result<T> = std::result::Result<T, ContextError>;

/// Errors raised by individual enrichment sources.
///
/// The enrichers themselves never fail a generation: they log these and
/// contribute empty text instead.
#[derive(Debug, Error)]
pub enum ContextError {
    /// A search source could not be reached or answered with an error
    #[error("{source_name} search failed: {detail}")]
    SourceFailed {
        source_name: &'static str,
        detail: String,
    },

    /// A search source answered with a body we could not parse
    #[error("{source_name} returned malformed data: {detail}")]
    MalformedResponse {
        source_name: &'static str,
        detail: String,
    },

    /// The feedback store failed
    #[error("Feedback store error: {0}")]
    Store(String),
}

impl ContextError {
    /// Build a [`ContextError::SourceFailed`] from any displayable error
    pub fn source_failed(source_name: &'static str, err: impl std::fmt::Display) -> Self {
        Self::SourceFailed {
            source_name,
            detail: err.to_string(),
        }
    }

    /// Build a [`ContextError::MalformedResponse`]
    pub fn malformed(source_name: &'static str, err: impl std::fmt::Display) -> Self {
        Self::MalformedResponse {
            source_name,
            detail: err.to_string(),
        }
    }
}
