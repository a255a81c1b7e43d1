//! Course-level inputs and typed views of generated course content

use crate::{GenerationError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

const UNTITLED: &str = "Без названия";
const DEFAULT_TASK_NAME: &str = "Задание";

/// Course fields used by course-level templates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
}

impl Course {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }
}

/// Requested shape of a course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseStructure {
    /// Number of modules
    pub sections: u32,
    pub lessons_per_section: u32,
    #[serde(default)]
    pub tests_per_section: u32,
    #[serde(default)]
    pub questions_per_test: u32,
    #[serde(default = "default_final_test")]
    pub final_test: bool,
    #[serde(default)]
    pub content_types: Option<String>,
}

fn default_final_test() -> bool {
    true
}

impl CourseStructure {
    pub fn new(sections: u32, lessons_per_section: u32) -> Self {
        Self {
            sections,
            lessons_per_section,
            tests_per_section: 0,
            questions_per_test: 0,
            final_test: true,
            content_types: None,
        }
    }
}

/// Template parameters describing a course and, optionally, its structure:
/// `course_name`, `course_description`, `course_level`, `module_count`,
/// `lessons_per_section`.
pub fn course_params(course: &Course, structure: Option<&CourseStructure>) -> Value {
    let mut params = json!({
        "course_name": course.name,
        "course_description": course.description.clone().unwrap_or_default(),
        "course_level": course.level.clone().unwrap_or_default(),
    });
    if let (Some(structure), Value::Object(map)) = (structure, &mut params) {
        map.insert("module_count".into(), structure.sections.into());
        map.insert("lessons_per_section".into(), structure.lessons_per_section.into());
    }
    params
}

/// A generated lesson
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonOutline {
    pub title: String,
    pub description: String,
}

/// A generated test question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestQuestion {
    pub question: String,
    pub answers: Vec<String>,
    pub correct: String,
}

/// A generated practical task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutline {
    pub name: String,
    pub description: String,
}

/// A generated module with its lessons, tests and tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleOutline {
    pub title: String,
    pub lessons: Vec<LessonOutline>,
    pub tests: Vec<TestQuestion>,
    pub tasks: Vec<TaskOutline>,
}

/// Typed view of a `{"modules": [...]}` reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseOutline {
    pub modules: Vec<ModuleOutline>,
}

/// Typed view of a lesson content reply: `{"theory", "tasks", "questions"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonContent {
    pub theory: String,
    pub tasks: Vec<TaskOutline>,
    pub questions: Vec<TestQuestion>,
}

/// Typed view of a theory rewrite reply: `{"improved_theory"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImprovedTheory {
    pub text: String,
}

/// First non-empty string among `keys`
fn text(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match object.get(*key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn objects<'a>(object: &'a Map<String, Value>, key: &str) -> impl Iterator<Item = &'a Map<String, Value>> {
    object
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

fn required_list<'a>(value: &'a Value, key: &str) -> Result<&'a [Value]> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| {
            GenerationError::malformed(format!("reply has no '{key}' list"), &value.to_string())
        })
}

impl LessonOutline {
    fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            title: text(object, &["title"]).unwrap_or_else(|| UNTITLED.to_string()),
            description: text(object, &["description"]).unwrap_or_default(),
        }
    }

    /// Lessons of a `{"lessons": [...]}` reply
    pub fn list_from_generated(value: &Value) -> Result<Vec<Self>> {
        Ok(required_list(value, "lessons")?
            .iter()
            .filter_map(Value::as_object)
            .map(Self::from_object)
            .collect())
    }
}

impl TaskOutline {
    fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            name: text(object, &["name"]).unwrap_or_else(|| DEFAULT_TASK_NAME.to_string()),
            description: text(object, &["description"]).unwrap_or_default(),
        }
    }
}

impl TestQuestion {
    fn from_object(object: &Map<String, Value>) -> Self {
        let question = text(object, &["test", "question"]).unwrap_or_default();
        let mut correct = text(object, &["correct", "answer"]).unwrap_or_default();

        let answers = match object.get("answers").and_then(Value::as_array) {
            Some(list) => list
                .iter()
                .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
                .collect(),
            None => {
                let description = text(object, &["description"]).unwrap_or_default();
                match parse_inline_options(&description) {
                    Some((answers, right)) => {
                        correct = right;
                        answers
                    }
                    None => Vec::new(),
                }
            }
        };

        Self {
            question,
            answers,
            correct,
        }
    }
}

/// Parse `"... Варианты: a, b, c (Правильный: b)"` into options and answer.
fn parse_inline_options(description: &str) -> Option<(Vec<String>, String)> {
    let (_, after) = description.split_once("Варианты:")?;
    let (options, rest) = after.split_once("(Правильный:")?;
    let answers = options
        .trim()
        .split(", ")
        .map(str::to_string)
        .collect();
    Some((answers, rest.replace(')', "").trim().to_string()))
}

impl ModuleOutline {
    fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            title: text(object, &["title"]).unwrap_or_else(|| UNTITLED.to_string()),
            lessons: objects(object, "lessons").map(LessonOutline::from_object).collect(),
            tests: objects(object, "tests").map(TestQuestion::from_object).collect(),
            tasks: objects(object, "tasks").map(TaskOutline::from_object).collect(),
        }
    }
}

impl CourseOutline {
    /// Read a generated `{"modules": [...]}` object. Missing titles become
    /// "Без названия"; a missing `modules` list is a malformed reply.
    pub fn from_generated(value: &Value) -> Result<Self> {
        let modules = required_list(value, "modules")?
            .iter()
            .filter_map(Value::as_object)
            .map(ModuleOutline::from_object)
            .collect();
        Ok(Self { modules })
    }

    pub fn lesson_count(&self) -> usize {
        self.modules.iter().map(|m| m.lessons.len()).sum()
    }
}

impl LessonContent {
    pub fn from_generated(value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            GenerationError::malformed("lesson content is not an object", &value.to_string())
        })?;
        Ok(Self {
            theory: text(object, &["theory"]).unwrap_or_default(),
            tasks: objects(object, "tasks").map(TaskOutline::from_object).collect(),
            questions: objects(object, "questions").map(TestQuestion::from_object).collect(),
        })
    }
}

impl ImprovedTheory {
    /// Read a generated `{"improved_theory": "..."}` object; a missing field
    /// is empty text.
    pub fn from_generated(value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            GenerationError::malformed("improved theory is not an object", &value.to_string())
        })?;
        Ok(Self {
            text: text(object, &["improved_theory"]).unwrap_or_default(),
        })
    }
}
