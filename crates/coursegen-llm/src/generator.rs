//! The text-generation capability every provider implements

use crate::{ChatMessage, Result, transcript};
use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

/// A live client bound to one concrete model
///
/// `generate` is the only method a provider must implement. Providers with a
/// native chat endpoint override `chat`; the default flattens the
/// conversation into a transcript and calls `generate`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for a single prompt
    async fn generate(&self, prompt: &str, max_tokens: usize) -> Result<String>;

    /// Generate the next assistant turn for a conversation
    async fn chat(&self, messages: &[ChatMessage], max_tokens: usize) -> Result<String> {
        self.generate(&transcript(messages), max_tokens).await
    }

    /// Provider name (e.g. "gigachat", "hf_api")
    fn name(&self) -> &'static str;
}
