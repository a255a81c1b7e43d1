//! Text-generation provider layer for coursegen
//!
//! This crate provides:
//!
//! - [`TextGenerator`], the single capability every provider implements
//! - GigaChat (OAuth client credentials) and HuggingFace Inference (static
//!   token, probed model discovery) providers
//! - [`EngineRegistry`], which maps engine names and aliases to provider
//!   factories and picks a concrete model
//!
//! # Example
//!
//! ```no_run
//! use coursegen_llm::EngineRegistry;
//!
//! # async fn run() -> coursegen_llm::Result<()> {
//! let registry = EngineRegistry::from_env()?;
//! let resolved = registry.resolve("lc_giga", None).await?;
//! let text = resolved.generator.generate("Привет!", 256).await?;
//! println!("{} answered: {text}", resolved.model);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod generator;
pub mod messages;
pub mod providers;
pub mod registry;

pub use error::{LLMError, Result};
pub use generator::TextGenerator;
pub use messages::{ChatMessage, Role, transcript};
pub use registry::{
    EngineModels, EngineRegistry, GIGACHAT_ENGINE, HUGGINGFACE_ENGINE, ProviderDescriptor,
    ProviderFactory, ResolvedEngine,
};
