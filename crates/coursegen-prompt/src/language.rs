//! Content language
//!
//! Selects template variants and keys the external search cache. Russian is
//! the default authoring language.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Language of generated content
///
/// # Examples
///
/// ```
/// use coursegen_prompt::Language;
///
/// assert_eq!(Language::from_code("ru"), Language::Russian);
/// assert_eq!(Language::from_code("EN"), Language::English);
/// assert_eq!(Language::from_code("de").code(), "de");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Language {
    /// Russian
    #[default]
    Russian,
    /// English
    English,
    /// Other languages (ISO 639-1 code)
    Other(String),
}

impl Language {
    /// Get ISO 639-1 language code
    pub fn code(&self) -> &str {
        match self {
            Language::Russian => "ru",
            Language::English => "en",
            Language::Other(code) => code,
        }
    }

    /// Get language name for display
    pub fn name(&self) -> &str {
        match self {
            Language::Russian => "Russian",
            Language::English => "English",
            Language::Other(code) => code,
        }
    }

    /// Parse from ISO 639-1 code or common name
    pub fn from_code(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "ru" | "rus" | "russian" | "русский" | "ru-ru" => Language::Russian,
            "en" | "eng" | "english" | "en-us" | "en-gb" => Language::English,
            other => Language::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl From<&str> for Language {
    fn from(s: &str) -> Self {
        Language::from_code(s)
    }
}

impl From<String> for Language {
    fn from(s: String) -> Self {
        Language::from_code(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code() {
        assert_eq!(Language::from_code("ru"), Language::Russian);
        assert_eq!(Language::from_code("Русский"), Language::Russian);
        assert_eq!(Language::from_code("en-US"), Language::English);
        assert_eq!(Language::from_code("fr"), Language::Other("fr".to_string()));
    }

    #[test]
    fn test_default_is_russian() {
        assert_eq!(Language::default(), Language::Russian);
        assert_eq!(Language::default().code(), "ru");
    }

    #[test]
    fn test_display() {
        assert_eq!(Language::English.to_string(), "English");
        assert_eq!(Language::Other("kk".to_string()).to_string(), "kk");
    }
}
