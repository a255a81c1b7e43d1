//! Chat turns: history, generation and storage

use super::engine::{ChatEngine, DEFAULT_CHAT_ENGINE};
use super::store::ChatStore;
use crate::ChatError;
use crate::recovery::{self, JsonObject};
use crate::request::DEFAULT_MAX_TOKENS;
use coursegen_llm::{ChatMessage, EngineRegistry};
use serde::Serialize;
use tracing::{info, instrument};

/// Per-turn options
#[derive(Debug, Clone)]
pub struct ChatOptions {
    /// Chat engine; falls back to the chat's pinned engine, then `lc_giga`
    pub engine: Option<String>,
    /// Model; falls back to the chat's pinned model
    pub model: Option<String>,
    /// Decode the answer as a JSON object
    pub expect_json: bool,
    pub max_tokens: usize,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            engine: None,
            model: None,
            expect_json: false,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Outcome of one chat turn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub answer: String,
    pub model: String,
    /// Decoded answer when JSON was requested
    pub structured: Option<JsonObject>,
    pub user_message_id: u64,
    pub bot_message_id: u64,
}

/// Runs chat turns against the engine registry
#[derive(Debug, Clone)]
pub struct ChatService {
    store: ChatStore,
    engines: EngineRegistry,
}

impl ChatService {
    pub fn new(store: ChatStore, engines: EngineRegistry) -> Self {
        Self { store, engines }
    }

    pub fn store(&self) -> &ChatStore {
        &self.store
    }

    /// Answer `text` in a chat and store both messages.
    ///
    /// The user message is stored before the model is called, so it stays in
    /// the history even when generation fails.
    #[instrument(skip(self, text, options), fields(engine))]
    pub async fn chat_generate(
        &self,
        chat_id: u64,
        user_id: i64,
        text: &str,
        options: &ChatOptions,
    ) -> Result<ChatReply, ChatError> {
        let chat = self.store.chat(chat_id, user_id).await?;
        let engine_name = options
            .engine
            .as_deref()
            .or(chat.engine.as_deref())
            .unwrap_or(DEFAULT_CHAT_ENGINE);
        let engine = ChatEngine::parse(engine_name)?;
        tracing::Span::current().record("engine", engine.name());

        let mut conversation: Vec<ChatMessage> = self
            .store
            .history(chat_id, user_id)
            .await?
            .iter()
            .map(ChatMessage::from)
            .collect();

        let user_message_id = self.store.store_user_message(chat_id, text).await?;
        conversation.push(ChatMessage::user(text));

        let model = options.model.as_deref().or(chat.model.as_deref());
        let resolved = self.engines.resolve(engine.provider(), model).await?;

        let messages = engine.messages(&conversation);
        let answer = resolved
            .generator
            .chat(&messages, options.max_tokens)
            .await?
            .trim()
            .to_string();
        info!(model = %resolved.model, "Chat answer:\n{answer}");

        let structured = if options.expect_json {
            Some(recovery::recover(&answer)?)
        } else {
            None
        };

        let bot_message_id = self.store.store_bot_message(chat_id, &answer).await?;

        Ok(ChatReply {
            answer,
            model: resolved.model,
            structured,
            user_message_id,
            bot_message_id,
        })
    }
}
