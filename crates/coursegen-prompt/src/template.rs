//! Core prompt template trait

use crate::{Language, PromptError, Result};

/// A named prompt template with one or more language variants
///
/// Variables are passed as `serde_json::Value` so the trait stays
/// dyn-compatible and the registry can hold `Arc<dyn PromptTemplate>`.
pub trait PromptTemplate: Send + Sync {
    /// Template identifier (the file name it was loaded from)
    fn name(&self) -> &str;

    /// Languages this template has a variant for
    fn languages(&self) -> Vec<Language>;

    /// Check if a language is supported
    fn supports_language(&self, lang: &Language) -> bool {
        self.languages().contains(lang)
    }

    /// Render the variant for `lang`
    fn render(&self, lang: &Language, vars: &serde_json::Value) -> Result<String>;

    /// Render with fallback
    ///
    /// Order: the requested language, then the default (Russian) variant,
    /// then whichever variant comes first.
    fn render_with_fallback(&self, lang: &Language, vars: &serde_json::Value) -> Result<String> {
        if self.supports_language(lang) {
            return self.render(lang, vars);
        }

        let default = Language::default();
        if self.supports_language(&default) {
            return self.render(&default, vars);
        }

        let mut languages = self.languages();
        languages.sort_by(|a, b| a.code().cmp(b.code()));
        let fallback = languages
            .into_iter()
            .next()
            .ok_or_else(|| PromptError::NoLanguageAvailable(self.name().to_string()))?;

        self.render(&fallback, vars)
    }

    /// Raw template source for a language
    fn raw_template(&self, lang: &Language) -> Option<&str>;
}
