//! Generation results

use crate::recovery::JsonObject;
use serde::Serialize;
use serde_json::{Value, json};

/// Key under which the resolved model id is added to structured output
pub const MODEL_KEY: &str = "_model";

/// Outcome of a successful generation call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationResult {
    /// Free-form reply
    Text { text: String, model: String },
    /// Decoded JSON object
    Structured { value: JsonObject, model: String },
}

impl GenerationResult {
    /// Model that produced the reply
    pub fn model(&self) -> &str {
        match self {
            Self::Text { model, .. } | Self::Structured { model, .. } => model,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text { text, .. } => Some(text),
            Self::Structured { .. } => None,
        }
    }

    pub fn structured(&self) -> Option<&JsonObject> {
        match self {
            Self::Structured { value, .. } => Some(value),
            Self::Text { .. } => None,
        }
    }

    /// Caller-facing JSON: `{"text", "model"}` for text replies, the decoded
    /// object with `_model` added for structured ones.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text { text, model } => json!({ "text": text, "model": model }),
            Self::Structured { value, model } => {
                let mut object = value.clone();
                object.insert(MODEL_KEY.to_string(), Value::String(model.clone()));
                Value::Object(object)
            }
        }
    }

    /// Like [`GenerationResult::to_json`], consuming the result
    pub fn into_json(self) -> Value {
        match self {
            Self::Text { .. } => self.to_json(),
            Self::Structured { mut value, model } => {
                value.insert(MODEL_KEY.to_string(), Value::String(model));
                Value::Object(value)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_json() {
        let result = GenerationResult::Text {
            text: "Привет".into(),
            model: "GigaChat".into(),
        };
        assert_eq!(result.to_json(), json!({ "text": "Привет", "model": "GigaChat" }));
        assert_eq!(result.text(), Some("Привет"));
        assert!(result.structured().is_none());
    }

    #[test]
    fn test_structured_json_adds_model() {
        let Value::Object(value) = json!({ "modules": [] }) else {
            unreachable!()
        };
        let result = GenerationResult::Structured {
            value,
            model: "GigaChat-Pro".into(),
        };
        let expected = json!({ "modules": [], "_model": "GigaChat-Pro" });
        assert_eq!(result.to_json(), expected);
        assert_eq!(result.into_json(), expected);
    }
}
