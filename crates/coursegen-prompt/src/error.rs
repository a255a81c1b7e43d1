//! Error types for prompt operations

use thiserror::Error;

/// Result type for prompt operations
pub type Result<T> = std::result::Result<T, PromptError>;

/// Errors that can occur during prompt operations
#[derive(Error, Debug)]
pub enum PromptError {
    /// No template with this identifier exists
    #[error("Template '{name}' not found: {detail}")]
    TemplateNotFound { name: String, detail: String },

    /// Template parsing failed
    #[error("Failed to parse template '{name}' for language '{language}': {detail}")]
    TemplateParseFailed {
        name: String,
        language: String,
        detail: String,
    },

    /// Template rendering failed
    #[error("Failed to render template '{name}': {detail}")]
    RenderError { name: String, detail: String },

    /// No variants provided when building
    #[error("No templates provided for '{0}'")]
    NoTemplatesProvided(String),

    /// No language available for the template
    #[error("No language available for template '{0}'")]
    NoLanguageAvailable(String),

    /// Lock error for thread safety
    #[error("Lock error: {0}")]
    LockError(String),

    /// File loading error
    #[error("Failed to load template file '{path}': {detail}")]
    FileLoadError { path: String, detail: String },
}

impl PromptError {
    /// Shorthand for [`PromptError::TemplateNotFound`]
    pub fn not_found(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::TemplateNotFound {
            name: name.into(),
            detail: detail.into(),
        }
    }
}
