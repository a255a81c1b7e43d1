//! Template registry
//!
//! [`PromptRegistry`] is the renderer the generation pipeline talks to. It
//! serves templates registered in memory and lazily loads the rest from its
//! [`FileLoader`] directory, keeping each loaded template for later calls.

use crate::{FileLoader, Language, PromptError, PromptTemplate, Result};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Thread-safe store of prompt templates keyed by identifier
pub struct PromptRegistry {
    templates: RwLock<HashMap<String, Arc<dyn PromptTemplate>>>,
    loader: Option<FileLoader>,
    default_language: Language,
}

impl PromptRegistry {
    /// Create an in-memory registry with no backing directory
    pub fn new() -> Self {
        Self {
            templates: RwLock::new(HashMap::new()),
            loader: None,
            default_language: Language::default(),
        }
    }

    /// Create a registry that loads templates from `dir` on first use
    pub fn from_dir(dir: impl Into<std::path::PathBuf>) -> Self {
        Self {
            loader: Some(FileLoader::new(dir)),
            ..Self::new()
        }
    }

    /// Language used by [`PromptRegistry::render`]
    pub fn with_language(mut self, lang: Language) -> Self {
        self.default_language = lang;
        self
    }

    /// Default language of this registry
    pub fn default_language(&self) -> &Language {
        &self.default_language
    }

    /// Register a template, replacing any template with the same identifier
    pub fn register<T: PromptTemplate + 'static>(&self, template: T) {
        self.register_arc(Arc::new(template));
    }

    /// Register a shared template
    pub fn register_arc(&self, template: Arc<dyn PromptTemplate>) {
        if let Ok(mut templates) = self.templates.write() {
            templates.insert(template.name().to_string(), template);
        }
    }

    /// Look up a template, loading it from disk if needed
    pub fn get(&self, name: &str) -> Result<Arc<dyn PromptTemplate>> {
        let cached = self
            .templates
            .read()
            .map_err(|e| PromptError::LockError(e.to_string()))?
            .get(name)
            .cloned();
        if let Some(template) = cached {
            return Ok(template);
        }

        let loader = self
            .loader
            .as_ref()
            .ok_or_else(|| PromptError::not_found(name, "not registered"))?;

        let template: Arc<dyn PromptTemplate> = Arc::new(loader.load_template(name)?);
        debug!(template = name, "caching template loaded from disk");
        self.register_arc(Arc::clone(&template));
        Ok(template)
    }

    /// Check if a template is known
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_ok()
    }

    /// Render a template in the registry's default language
    pub fn render(&self, name: &str, vars: &serde_json::Value) -> Result<String> {
        self.render_with_lang(name, &self.default_language, vars)
    }

    /// Render a template in a specific language, falling back when needed
    pub fn render_with_lang(
        &self,
        name: &str,
        lang: &Language,
        vars: &serde_json::Value,
    ) -> Result<String> {
        self.get(name)?.render_with_fallback(lang, vars)
    }

    /// List all template identifiers, in memory and on disk
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names: BTreeSet<String> = self
            .templates
            .read()
            .map_err(|e| PromptError::LockError(e.to_string()))?
            .keys()
            .cloned()
            .collect();

        if let Some(loader) = &self.loader {
            names.extend(loader.list_templates()?);
        }
        Ok(names.into_iter().collect())
    }

    /// Drop every cached template; files are re-read on next use
    pub fn clear(&self) {
        if let Ok(mut templates) = self.templates.write() {
            templates.clear();
        }
    }
}

impl Default for PromptRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PromptRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptRegistry")
            .field("loader", &self.loader)
            .field("default_language", &self.default_language)
            .finish_non_exhaustive()
    }
}
