//! File-based template loader
//!
//! Templates live as flat files in one directory. The identifier of a
//! template is its file name; language variants carry a known language suffix
//! (`_ru`, `_en`) before the extension and sit next to the base file:
//!
//! ```text
//! prompts/
//! ├── module_prompt.j2       # identifier "module_prompt.j2", Russian
//! ├── module_prompt_en.j2    # English variant of "module_prompt.j2"
//! ├── lesson_qa.j2           # identifier "lesson_qa.j2"
//! └── lesson_prompt.jinja
//! ```

use crate::{JinjaTemplate, JinjaTemplateBuilder, Language, PromptError, Result};
use std::collections::{BTreeSet, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

const EXTENSIONS: [&str; 2] = ["j2", "jinja"];

/// Loads templates from a fixed directory
#[derive(Debug, Clone)]
pub struct FileLoader {
    base_path: PathBuf,
}

impl FileLoader {
    /// Create a new file loader with the given base path
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Get the base path
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Check if the base directory exists
    pub fn exists(&self) -> bool {
        self.base_path.is_dir()
    }

    /// Load every variant of the template named `identifier`
    pub fn load_template(&self, identifier: &str) -> Result<JinjaTemplate> {
        validate_identifier(identifier)?;

        let mut variants: HashMap<Language, String> = HashMap::new();
        for (path, name, lang) in self.scan()? {
            if name != identifier {
                continue;
            }
            let content = std::fs::read_to_string(&path).map_err(|e| PromptError::FileLoadError {
                path: path.display().to_string(),
                detail: e.to_string(),
            })?;
            variants.insert(lang, content);
        }

        if variants.is_empty() {
            return Err(PromptError::not_found(
                identifier,
                format!("no such file in {}", self.base_path.display()),
            ));
        }

        debug!(template = identifier, variants = variants.len(), "loaded template");

        variants
            .into_iter()
            .fold(JinjaTemplateBuilder::new(identifier), |builder, (lang, content)| {
                builder.template(lang, content)
            })
            .build()
    }

    /// List the identifiers of all templates on disk, sorted
    pub fn list_templates(&self) -> Result<Vec<String>> {
        let names: BTreeSet<String> = self.scan()?.into_iter().map(|(_, name, _)| name).collect();
        Ok(names.into_iter().collect())
    }

    fn scan(&self) -> Result<Vec<(PathBuf, String, Language)>> {
        let entries = match std::fs::read_dir(&self.base_path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(PromptError::FileLoadError {
                    path: self.base_path.display().to_string(),
                    detail: e.to_string(),
                });
            }
        };

        let mut files: HashMap<String, PathBuf> = HashMap::new();
        for entry in entries {
            let entry = entry.map_err(|e| PromptError::FileLoadError {
                path: self.base_path.display().to_string(),
                detail: e.to_string(),
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some(filename) = path.file_name().and_then(|n| n.to_str()) {
                files.insert(filename.to_string(), path.clone());
            }
        }

        Ok(files
            .iter()
            .filter_map(|(filename, path)| {
                let (name, lang) = parse_filename(filename, |base| files.contains_key(base))?;
                Some((path.clone(), name, lang))
            })
            .collect())
    }
}

fn validate_identifier(identifier: &str) -> Result<()> {
    let has_extension = EXTENSIONS
        .iter()
        .any(|ext| identifier.ends_with(&format!(".{ext}")));

    if identifier.is_empty()
        || identifier.contains(['/', '\\'])
        || identifier.contains("..")
        || !has_extension
    {
        return Err(PromptError::not_found(
            identifier,
            "identifier must be a template file name",
        ));
    }
    Ok(())
}

/// Split a file name into its template identifier and variant language.
///
/// `name_en.j2` is the English variant of `name.j2` only when the suffix is a
/// known language and `name.j2` itself exists; any other file is its own
/// template. Returns `None` for files that are not templates.
fn parse_filename(filename: &str, exists: impl Fn(&str) -> bool) -> Option<(String, Language)> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if !EXTENSIONS.contains(&ext) || stem.is_empty() {
        return None;
    }

    if let Some((base, code)) = stem.rsplit_once('_') {
        let lang = Language::from_code(code);
        let base_file = format!("{base}.{ext}");
        if !base.is_empty() && !matches!(lang, Language::Other(_)) && exists(&base_file) {
            return Some((base_file, lang));
        }
    }

    Some((filename.to_string(), Language::default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PromptTemplate;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn create_test_file(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_parse_filename() {
        let present = |name: &str| ["module_prompt.j2", "t.jinja"].contains(&name);
        assert_eq!(
            parse_filename("module_prompt.j2", present),
            Some(("module_prompt.j2".to_string(), Language::Russian))
        );
        assert_eq!(
            parse_filename("module_prompt_en.j2", present),
            Some(("module_prompt.j2".to_string(), Language::English))
        );
        assert_eq!(
            parse_filename("t.jinja", present),
            Some(("t.jinja".to_string(), Language::Russian))
        );
        assert_eq!(parse_filename("notes.txt", present), None);
        assert_eq!(parse_filename("README", present), None);
    }

    #[test]
    fn test_suffix_is_variant_only_for_known_language_with_base() {
        let present = |name: &str| name == "lesson.j2";
        assert_eq!(
            parse_filename("lesson_qa.j2", present),
            Some(("lesson_qa.j2".to_string(), Language::Russian))
        );
        // No base file: the English-looking name is a template of its own.
        assert_eq!(
            parse_filename("intro_en.j2", present),
            Some(("intro_en.j2".to_string(), Language::Russian))
        );
    }

    #[test]
    fn test_underscore_names_are_addressable() {
        let dir = tempdir().unwrap();
        create_test_file(dir.path(), "lesson_qa.j2", "Вопросы к {{ title }}");
        create_test_file(dir.path(), "theory_ai.j2", "ИИ");

        let loader = FileLoader::new(dir.path());
        assert_eq!(
            loader.list_templates().unwrap(),
            vec!["lesson_qa.j2", "theory_ai.j2"]
        );
        let template = loader.load_template("lesson_qa.j2").unwrap();
        assert_eq!(
            template.render(&Language::Russian, &json!({ "title": "Rust" })).unwrap(),
            "Вопросы к Rust"
        );
        assert!(loader.load_template("lesson.j2").is_err());
    }

    #[test]
    fn test_load_template_with_variants() {
        let dir = tempdir().unwrap();
        create_test_file(dir.path(), "lesson.j2", "Урок {{ n }}");
        create_test_file(dir.path(), "lesson_en.j2", "Lesson {{ n }}");

        let loader = FileLoader::new(dir.path());
        let template = loader.load_template("lesson.j2").unwrap();

        assert_eq!(template.name(), "lesson.j2");
        assert!(template.supports_language(&Language::Russian));
        assert!(template.supports_language(&Language::English));
        assert_eq!(
            template.render(&Language::English, &json!({ "n": 2 })).unwrap(),
            "Lesson 2"
        );
    }

    #[test]
    fn test_load_not_found() {
        let dir = tempdir().unwrap();
        let loader = FileLoader::new(dir.path());

        let result = loader.load_template("missing.j2");
        assert!(matches!(result, Err(PromptError::TemplateNotFound { .. })));
    }

    #[test]
    fn test_missing_directory_is_not_found() {
        let loader = FileLoader::new("/nonexistent/prompts");
        let result = loader.load_template("t.j2");
        assert!(matches!(result, Err(PromptError::TemplateNotFound { .. })));
        assert!(!loader.exists());
    }

    #[test]
    fn test_rejects_paths() {
        let dir = tempdir().unwrap();
        let loader = FileLoader::new(dir.path());

        for bad in ["../secret.j2", "sub/t.j2", "t.txt", ""] {
            let result = loader.load_template(bad);
            assert!(
                matches!(result, Err(PromptError::TemplateNotFound { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_list_templates() {
        let dir = tempdir().unwrap();
        create_test_file(dir.path(), "a.j2", "A");
        create_test_file(dir.path(), "a_en.j2", "A");
        create_test_file(dir.path(), "b.jinja", "B");
        create_test_file(dir.path(), "notes.md", "not a template");

        let loader = FileLoader::new(dir.path());
        assert_eq!(loader.list_templates().unwrap(), vec!["a.j2", "b.jinja"]);
    }
}
