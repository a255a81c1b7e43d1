//! Recovery of a JSON object from free-form model output
//!
//! Models wrap JSON in Markdown fences, surround it with prose or emit
//! Python-style single quotes. [`recover`] tries these steps in order and
//! stops at the first that yields an object:
//!
//! 1. [`strip_fences`] removes a leading and trailing triple-backtick fence
//! 2. [`decode_direct`] parses the stripped text as a whole
//! 3. [`brace_candidates`] lists `{ ... }` spans, longest first, and each is
//!    parsed as is and then once more after [`repair_single_quotes`]
//!
//! Each step is a pure function and can be used on its own.

use crate::{GenerationError, Result};
use serde_json::{Map, Value};
use tracing::debug;

/// A decoded JSON object
pub type JsonObject = Map<String, Value>;

/// Upper bound on brace spans tried for one reply
const MAX_CANDIDATES: usize = 64;

/// Trim the text and drop an opening ```` ``` ```` fence (with its language
/// tag) and a closing one.
pub fn strip_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        let tag_len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(rest.len());
        text = &rest[tag_len..];
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Parse the whole text as JSON
pub fn decode_direct(text: &str) -> Option<Value> {
    serde_json::from_str(text).ok()
}

/// Every span from an opening `{` up to the last `}`, longest first.
pub fn brace_candidates(text: &str) -> Vec<&str> {
    let Some(end) = text.rfind('}') else {
        return Vec::new();
    };

    text.match_indices('{')
        .map(|(start, _)| start)
        .filter(|&start| start < end)
        .take(MAX_CANDIDATES)
        .map(|start| &text[start..=end])
        .collect()
}

/// Replace every single quote not preceded by a backslash with a double quote.
pub fn repair_single_quotes(text: &str) -> String {
    let mut repaired = String::with_capacity(text.len());
    let mut previous = None;
    for c in text.chars() {
        if c == '\'' && previous != Some('\\') {
            repaired.push('"');
        } else {
            repaired.push(c);
        }
        previous = Some(c);
    }
    repaired
}

fn decode_object(text: &str) -> Option<JsonObject> {
    match serde_json::from_str(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Try each brace span, then its quote-repaired form
pub fn decode_candidates(text: &str) -> Option<JsonObject> {
    brace_candidates(text).into_iter().find_map(|candidate| {
        decode_object(candidate).or_else(|| decode_object(&repair_single_quotes(candidate)))
    })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Recover a JSON object from raw model output.
///
/// A reply that parses directly as JSON but is not an object is rejected
/// rather than searched for an embedded object.
pub fn recover(raw: &str) -> Result<JsonObject> {
    let text = strip_fences(raw);

    match decode_direct(text) {
        Some(Value::Object(map)) => {
            debug!("model output decoded directly");
            return Ok(map);
        }
        Some(other) => {
            return Err(GenerationError::malformed(
                format!("expected a JSON object, got {}", kind(&other)),
                raw,
            ));
        }
        None => {}
    }

    if let Some(map) = decode_candidates(text) {
        debug!("model output decoded from a brace span");
        return Ok(map);
    }

    Err(GenerationError::malformed("no decodable JSON object", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_fences() {
        assert_eq!(strip_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_fences("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_fences("  {\"a\": 1}  "), "{\"a\": 1}");
        assert_eq!(strip_fences("```json{\"a\": 1}```"), "{\"a\": 1}");
    }

    #[test]
    fn test_fenced_equals_unfenced() {
        let body = r#"{"modules": [{"title": "X"}]}"#;
        let fenced = format!("```json\n{body}\n```");
        assert_eq!(
            Value::Object(recover(&fenced).unwrap()),
            decode_direct(body).unwrap()
        );
    }

    #[test]
    fn test_prose_around_object() {
        let raw = "Вот структура курса:\n{\"modules\": []}\nУдачи!";
        assert_eq!(Value::Object(recover(raw).unwrap()), json!({"modules": []}));
    }

    #[test]
    fn test_single_quotes_repaired() {
        let raw = "{'title': 'Intro', 'lessons': ['a', 'b']}";
        assert_eq!(
            Value::Object(recover(raw).unwrap()),
            json!({"title": "Intro", "lessons": ["a", "b"]})
        );
    }

    #[test]
    fn test_escaped_quote_kept() {
        assert_eq!(repair_single_quotes(r"{'a': 'it\'s'}"), r#"{"a": "it\'s"}"#);
    }

    #[test]
    fn test_no_braces_is_malformed() {
        let err = recover("Sorry, I cannot help with that.").unwrap_err();
        assert!(matches!(err, GenerationError::MalformedModelOutput { .. }));
    }

    #[test]
    fn test_top_level_array_rejected() {
        let err = recover(r#"[{"title": "X"}]"#).unwrap_err();
        let GenerationError::MalformedModelOutput { reason, .. } = err else {
            panic!("wrong variant");
        };
        assert!(reason.contains("an array"));
    }

    #[test]
    fn test_longest_candidate_first() {
        let text = r#"a {"x": {"y": 1}} b"#;
        assert_eq!(
            brace_candidates(text),
            vec![r#"{"x": {"y": 1}}"#, r#"{"y": 1}}"#]
        );
        assert_eq!(
            Value::Object(decode_candidates(text).unwrap()),
            json!({"x": {"y": 1}})
        );
    }

    #[test]
    fn test_trailing_garbage_object_fails() {
        assert!(recover("{\"bad\": 1}\n{extra}").is_err());
    }

    #[test]
    fn test_no_closing_brace() {
        assert!(brace_candidates("{ never closed").is_empty());
    }
}
