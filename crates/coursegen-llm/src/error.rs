//! Error types for LLM operations

use thiserror::Error;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LLMError {
    /// Engine name is neither a registered engine nor an alias of one
    #[error("Unsupported engine '{0}'")]
    UnsupportedEngine(String),

    /// The engine reported no usable model
    #[error("No models available for engine '{0}'")]
    NoModelsAvailable(String),

    /// Network failure or non-success HTTP status from a provider
    #[error("{provider} request failed{}: {detail}", status_suffix(.status))]
    ProviderRequestFailed {
        provider: String,
        status: Option<u16>,
        detail: String,
    },

    /// Provider answered with a body we could not interpret
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl LLMError {
    /// Build a [`LLMError::ProviderRequestFailed`]
    pub fn request_failed(
        provider: impl Into<String>,
        status: Option<u16>,
        detail: impl Into<String>,
    ) -> Self {
        Self::ProviderRequestFailed {
            provider: provider.into(),
            status,
            detail: detail.into(),
        }
    }

    /// Translate a transport error, keeping the HTTP status when there is one
    pub fn from_transport(provider: impl Into<String>, err: &reqwest::Error) -> Self {
        Self::request_failed(provider, err.status().map(|s| s.as_u16()), err.to_string())
    }
}

/// Fail with [`LLMError::ProviderRequestFailed`] unless the response succeeded.
pub(crate) async fn ensure_success(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(LLMError::request_failed(
        provider,
        Some(status.as_u16()),
        if body.is_empty() {
            status.to_string()
        } else {
            body
        },
    ))
}
