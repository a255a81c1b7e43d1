//! Prompt template rendering for coursegen
//!
//! Templates are Jinja2 files in a single directory, addressed by file name.
//! The [`PromptRegistry`] loads them on demand and renders them with a JSON
//! object of named parameters.
//!
//! # Quick Start
//!
//! ```
//! use coursegen_prompt::{JinjaTemplate, PromptRegistry};
//! use serde_json::json;
//!
//! let registry = PromptRegistry::new();
//! registry.register(
//!     JinjaTemplate::new("module_prompt.j2", "Составь {{ module_count }} модуля курса {{ course_name }}")
//!         .unwrap(),
//! );
//!
//! let prompt = registry
//!     .render("module_prompt.j2", &json!({ "module_count": 3, "course_name": "Rust" }))
//!     .unwrap();
//! assert_eq!(prompt, "Составь 3 модуля курса Rust");
//! ```

mod error;
mod jinja;
mod language;
mod loader;
mod registry;
mod template;

pub use error::{PromptError, Result};
pub use jinja::{JinjaTemplate, JinjaTemplateBuilder};
pub use language::Language;
pub use loader::FileLoader;
pub use registry::PromptRegistry;
pub use template::PromptTemplate;
