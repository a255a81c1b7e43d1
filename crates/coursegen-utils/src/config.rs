//! Configuration management utilities
//!
//! [`Config`] holds the application-level settings shared by the generation
//! pipeline and the CLI. Provider credentials are not part of it; each
//! provider reads its own settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is present but cannot be parsed
    #[error("Invalid value for {key}: '{value}'")]
    Invalid { key: String, value: String },

    /// A value parsed but is outside its allowed range
    #[error("Configuration error: {0}")]
    OutOfRange(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application name
    pub app_name: String,
    /// Environment profile (dev, stage, prod)
    pub environment: String,
    /// Fallback log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
    /// Directory holding the prompt template files
    pub prompts_dir: PathBuf,
    /// Engine used when a request names none
    pub default_engine: String,
    /// Token budget used when a request names none
    pub default_max_tokens: usize,
    /// Language code for external search
    pub default_language: String,
    /// Maximum number of cached external-context entries
    pub context_cache_capacity: usize,
    /// Lifetime of a cached external-context entry
    #[serde(with = "duration_secs")]
    pub context_cache_ttl: Duration,
    /// Results requested from each external search source
    pub search_results_per_source: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "coursegen".to_string(),
            environment: "dev".to_string(),
            log_level: "info".to_string(),
            log_json: false,
            prompts_dir: PathBuf::from("prompts"),
            default_engine: "gigachat".to_string(),
            default_max_tokens: 1024,
            default_language: "ru".to_string(),
            context_cache_capacity: 128,
            context_cache_ttl: Duration::from_secs(3600),
            search_results_per_source: 5,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// The profile file `.env.{ENV}` (default `.env.dev`) is read first, then
    /// a plain `.env`. Variables already set in the process are never
    /// overridden by either file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let profile = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());
        dotenvy::from_filename(format!(".env.{profile}")).ok();
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            app_name: lookup("APP_NAME").unwrap_or(defaults.app_name),
            environment: lookup("ENV").unwrap_or(defaults.environment),
            log_level: lookup("LOG_LEVEL")
                .map(|level| level.to_lowercase())
                .unwrap_or(defaults.log_level),
            log_json: lookup("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
            prompts_dir: lookup("PROMPTS_DIR").map_or(defaults.prompts_dir, PathBuf::from),
            default_engine: lookup("DEFAULT_ENGINE").unwrap_or(defaults.default_engine),
            default_max_tokens: parse_or(&lookup, "DEFAULT_MAX_TOKENS", defaults.default_max_tokens)?,
            default_language: lookup("DEFAULT_LANGUAGE").unwrap_or(defaults.default_language),
            context_cache_capacity: parse_or(
                &lookup,
                "CONTEXT_CACHE_CAPACITY",
                defaults.context_cache_capacity,
            )?,
            context_cache_ttl: Duration::from_secs(parse_or(
                &lookup,
                "CONTEXT_CACHE_TTL_SECS",
                defaults.context_cache_ttl.as_secs(),
            )?),
            search_results_per_source: parse_or(
                &lookup,
                "SEARCH_RESULTS_PER_SOURCE",
                defaults.search_results_per_source,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_max_tokens == 0 {
            return Err(ConfigError::OutOfRange(
                "DEFAULT_MAX_TOKENS must be greater than 0".to_string(),
            ));
        }
        if self.context_cache_capacity == 0 {
            return Err(ConfigError::OutOfRange(
                "CONTEXT_CACHE_CAPACITY must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            key: key.to_string(),
            value: raw,
        }),
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
