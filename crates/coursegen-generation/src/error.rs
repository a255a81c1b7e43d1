//! Error types for the generation pipeline

use coursegen_llm::LLMError;
use coursegen_prompt::PromptError;
use thiserror::Error;

/// Result type for generation operations
pub type Result<T> = std::result::Result<T, GenerationError>;

/// How much of a raw reply is kept in a [`GenerationError::MalformedModelOutput`]
const EXCERPT_CHARS: usize = 200;

/// Errors surfaced by a generation call
///
/// One call has one outcome: any of these aborts it. Nothing is retried.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The requested template identifier does not exist
    #[error("Template '{0}' not found")]
    TemplateNotFound(String),

    /// Neither a template nor a literal prompt was supplied
    #[error("Neither a template nor a prompt was given")]
    MissingPrompt,

    #[error("Unsupported engine '{0}'")]
    UnsupportedEngine(String),

    #[error("No models available for engine '{0}'")]
    NoModelsAvailable(String),

    /// Network failure or non-success HTTP status from a provider
    #[error("{provider} request failed{}: {detail}", status_suffix(.status))]
    ProviderRequestFailed {
        provider: String,
        status: Option<u16>,
        detail: String,
    },

    /// Structured output was expected but could not be decoded
    #[error("Malformed model output ({reason}): {excerpt}")]
    MalformedModelOutput { reason: String, excerpt: String },

    /// Template failure other than a missing template
    #[error(transparent)]
    Template(PromptError),

    /// Provider failure other than the ones above, e.g. missing credentials
    #[error(transparent)]
    Provider(LLMError),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl GenerationError {
    /// Build a [`GenerationError::MalformedModelOutput`] quoting the start of `raw`
    pub fn malformed(reason: impl Into<String>, raw: &str) -> Self {
        let mut excerpt: String = raw.chars().take(EXCERPT_CHARS).collect();
        if raw.chars().count() > EXCERPT_CHARS {
            excerpt.push('…');
        }
        Self::MalformedModelOutput {
            reason: reason.into(),
            excerpt,
        }
    }
}

impl From<PromptError> for GenerationError {
    fn from(err: PromptError) -> Self {
        match err {
            PromptError::TemplateNotFound { name, .. } => Self::TemplateNotFound(name),
            other => Self::Template(other),
        }
    }
}

impl From<LLMError> for GenerationError {
    fn from(err: LLMError) -> Self {
        match err {
            LLMError::UnsupportedEngine(engine) => Self::UnsupportedEngine(engine),
            LLMError::NoModelsAvailable(engine) => Self::NoModelsAvailable(engine),
            LLMError::ProviderRequestFailed {
                provider,
                status,
                detail,
            } => Self::ProviderRequestFailed {
                provider,
                status,
                detail,
            },
            other => Self::Provider(other),
        }
    }
}

/// Errors from the chat service
#[derive(Debug, Error)]
pub enum ChatError {
    /// The chat does not exist or belongs to another user
    #[error("Chat {0} not found")]
    ChatNotFound(u64),

    /// Unknown chat engine name
    #[error("Unsupported chat engine '{0}'")]
    UnsupportedEngine(String),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl From<LLMError> for ChatError {
    fn from(err: LLMError) -> Self {
        Self::Generation(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_not_found_maps_to_template_not_found() {
        let err: GenerationError = PromptError::not_found("t.j2", "no such file").into();
        assert!(matches!(err, GenerationError::TemplateNotFound(ref name) if name == "t.j2"));
    }

    #[test]
    fn test_provider_failure_keeps_status() {
        let err: GenerationError = LLMError::request_failed("gigachat", Some(503), "busy").into();
        assert_eq!(err.to_string(), "gigachat request failed (HTTP 503): busy");
    }

    #[test]
    fn test_configuration_error_stays_provider() {
        let err: GenerationError = LLMError::ConfigurationError("HF_TOKEN is not set".into()).into();
        assert!(matches!(err, GenerationError::Provider(_)));
    }

    #[test]
    fn test_malformed_excerpt_is_truncated() {
        let raw = "x".repeat(500);
        let GenerationError::MalformedModelOutput { excerpt, .. } =
            GenerationError::malformed("no JSON object found", &raw)
        else {
            panic!("wrong variant");
        };
        assert_eq!(excerpt.chars().count(), EXCERPT_CHARS + 1);
        assert!(excerpt.ends_with('…'));
    }
}
