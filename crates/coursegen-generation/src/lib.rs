//! Course content generation pipeline
//!
//! [`Generator`] resolves an engine, assembles the prompt from a template and
//! the optional context enrichers, calls the provider and, for structured
//! requests, recovers a JSON object from the reply.
//!
//! # Example
//!
//! ```no_run
//! use coursegen_generation::{Generator, PromptRequest};
//! use coursegen_utils::Config;
//! use serde_json::json;
//!
//! # async fn run() -> coursegen_generation::Result<()> {
//! let generator = Generator::from_config(&Config::default())?;
//! let request = PromptRequest::template("module_prompt.j2")
//!     .params(json!({ "course_name": "Rust", "module_count": 4 }))
//!     .engine("lc_giga")
//!     .build();
//!
//! let result = generator.generate(&request).await?;
//! println!("{}", result.to_json());
//! # Ok(())
//! # }
//! ```

pub mod chat;
pub mod course;
mod error;
pub mod orchestrator;
pub mod recovery;
pub mod request;
pub mod result;

pub use course::{
    Course, CourseOutline, CourseStructure, ImprovedTheory, LessonContent, LessonOutline,
    ModuleOutline, TaskOutline, TestQuestion, course_params,
};
pub use error::{ChatError, GenerationError, Result};
pub use orchestrator::Generator;
pub use recovery::{JsonObject, recover};
pub use request::{OutputMode, PromptRequest, PromptRequestBuilder, PromptSource};
pub use result::GenerationResult;
