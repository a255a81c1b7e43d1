//! Generation requests

use coursegen_prompt::Language;
use serde::Serialize;
use serde_json::{Map, Value};

/// Engine used when a request names none
pub const DEFAULT_ENGINE: &str = "gigachat";
/// Token budget used when a request sets none
pub const DEFAULT_MAX_TOKENS: usize = 1024;

/// What the prompt is built from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptSource {
    /// A template identifier, rendered with the request parameters
    Template(String),
    /// Literal prompt text, sent as is
    Literal(String),
}

/// Expected shape of the model reply
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    Text,
    #[default]
    Structured,
}

/// One generation call. Build with [`PromptRequest::template`] or
/// [`PromptRequest::prompt`].
#[derive(Debug, Clone, Serialize)]
pub struct PromptRequest {
    source: Option<PromptSource>,
    params: Map<String, Value>,
    engine: String,
    model: Option<String>,
    include_external_context: bool,
    use_feedback: bool,
    lesson_id: Option<i64>,
    #[serde(serialize_with = "serialize_language")]
    language: Language,
    search_query: Option<String>,
    output: OutputMode,
    max_tokens: usize,
}

fn serialize_language<S: serde::Serializer>(lang: &Language, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(lang.code())
}

impl PromptRequest {
    /// Start a request rendering the template `name`
    pub fn template(name: impl Into<String>) -> PromptRequestBuilder {
        PromptRequestBuilder::new(Some(PromptSource::Template(name.into())))
    }

    /// Start a request sending `text` verbatim
    pub fn prompt(text: impl Into<String>) -> PromptRequestBuilder {
        PromptRequestBuilder::new(Some(PromptSource::Literal(text.into())))
    }

    /// Start a request with no prompt yet; a `prompt` parameter may supply it
    pub fn builder() -> PromptRequestBuilder {
        PromptRequestBuilder::new(None)
    }

    pub fn source(&self) -> Option<&PromptSource> {
        self.source.as_ref()
    }

    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    pub fn engine(&self) -> &str {
        &self.engine
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn include_external_context(&self) -> bool {
        self.include_external_context
    }

    pub fn use_feedback(&self) -> bool {
        self.use_feedback
    }

    /// Lesson whose feedback is summarized: the explicit id, else a
    /// `lesson_id` parameter given as a number or numeric string.
    pub fn lesson_id(&self) -> Option<i64> {
        self.lesson_id.or_else(|| match self.params.get("lesson_id")? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    /// Query for external search: the explicit query, else the
    /// `course_name` parameter, else `lesson_title`.
    pub fn search_query(&self) -> Option<String> {
        if let Some(query) = self.search_query.as_deref().filter(|q| !q.trim().is_empty()) {
            return Some(query.to_string());
        }
        ["course_name", "lesson_title"].iter().find_map(|key| {
            match self.params.get(*key)? {
                Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                Value::Null | Value::String(_) => None,
                other => Some(other.to_string()),
            }
        })
    }

    pub fn output(&self) -> OutputMode {
        self.output
    }

    pub fn expects_structured(&self) -> bool {
        self.output == OutputMode::Structured
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }
}

/// Builder for [`PromptRequest`]
#[derive(Debug, Clone)]
pub struct PromptRequestBuilder {
    request: PromptRequest,
}

impl PromptRequestBuilder {
    fn new(source: Option<PromptSource>) -> Self {
        Self {
            request: PromptRequest {
                source,
                params: Map::new(),
                engine: DEFAULT_ENGINE.to_string(),
                model: None,
                include_external_context: true,
                use_feedback: true,
                lesson_id: None,
                language: Language::Russian,
                search_query: None,
                output: OutputMode::Structured,
                max_tokens: DEFAULT_MAX_TOKENS,
            },
        }
    }

    /// Set one template parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.request.params.insert(key.into(), value.into());
        self
    }

    /// Merge template parameters; non-object values are ignored
    pub fn params(mut self, params: Value) -> Self {
        if let Value::Object(map) = params {
            self.request.params.extend(map);
        }
        self
    }

    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.request.engine = engine.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.request.model = Some(model.into());
        self
    }

    pub fn maybe_model(mut self, model: Option<String>) -> Self {
        self.request.model = model;
        self
    }

    pub fn external_context(mut self, enabled: bool) -> Self {
        self.request.include_external_context = enabled;
        self
    }

    pub fn feedback(mut self, enabled: bool) -> Self {
        self.request.use_feedback = enabled;
        self
    }

    pub fn lesson_id(mut self, lesson_id: i64) -> Self {
        self.request.lesson_id = Some(lesson_id);
        self
    }

    pub fn language(mut self, language: Language) -> Self {
        self.request.language = language;
        self
    }

    pub fn search_query(mut self, query: impl Into<String>) -> Self {
        self.request.search_query = Some(query.into());
        self
    }

    pub fn output(mut self, output: OutputMode) -> Self {
        self.request.output = output;
        self
    }

    pub fn text(self) -> Self {
        self.output(OutputMode::Text)
    }

    pub fn structured(self) -> Self {
        self.output(OutputMode::Structured)
    }

    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.request.max_tokens = max_tokens;
        self
    }

    pub fn build(self) -> PromptRequest {
        self.request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let request = PromptRequest::template("module_prompt.j2").build();
        assert_eq!(request.engine(), DEFAULT_ENGINE);
        assert_eq!(request.max_tokens(), DEFAULT_MAX_TOKENS);
        assert!(request.include_external_context());
        assert!(request.use_feedback());
        assert!(request.expects_structured());
        assert_eq!(request.language(), &Language::Russian);
        assert_eq!(
            request.source(),
            Some(&PromptSource::Template("module_prompt.j2".into()))
        );
    }

    #[test]
    fn test_search_query_precedence() {
        let request = PromptRequest::template("t.j2")
            .params(json!({ "course_name": "Rust", "lesson_title": "Traits" }))
            .build();
        assert_eq!(request.search_query().as_deref(), Some("Rust"));

        let request = PromptRequest::template("t.j2")
            .params(json!({ "course_name": "", "lesson_title": "Traits" }))
            .build();
        assert_eq!(request.search_query().as_deref(), Some("Traits"));

        let request = PromptRequest::template("t.j2")
            .param("course_name", "Rust")
            .search_query("ownership")
            .build();
        assert_eq!(request.search_query().as_deref(), Some("ownership"));

        assert_eq!(PromptRequest::template("t.j2").build().search_query(), None);
    }

    #[test]
    fn test_lesson_id_from_params() {
        let request = PromptRequest::template("t.j2").param("lesson_id", 42).build();
        assert_eq!(request.lesson_id(), Some(42));

        let request = PromptRequest::template("t.j2").param("lesson_id", "7").build();
        assert_eq!(request.lesson_id(), Some(7));

        let request = PromptRequest::template("t.j2")
            .param("lesson_id", 42)
            .lesson_id(3)
            .build();
        assert_eq!(request.lesson_id(), Some(3));
    }

    #[test]
    fn test_non_object_params_ignored() {
        let request = PromptRequest::prompt("hi").params(json!([1, 2])).build();
        assert!(request.params().is_empty());
    }
}
