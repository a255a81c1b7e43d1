//! Concrete text-generation providers

mod gigachat;
mod huggingface;

pub use gigachat::{GigaChatClient, GigaChatConfig, GigaChatFactory, TokenCache};
pub use huggingface::{HuggingFaceClient, HuggingFaceConfig, HuggingFaceFactory};
