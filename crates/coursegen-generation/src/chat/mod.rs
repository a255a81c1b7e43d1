//! Multi-turn chat over the same providers as generation
//!
//! Chats and messages live in a [`ChatStore`] kept in process memory.
//! [`ChatService::chat_generate`] runs one turn: it reads the history, stores
//! the user message, asks the provider behind the chosen [`ChatEngine`] and
//! stores the answer.

mod engine;
mod service;
mod store;

pub use engine::{ASSISTANT_INSTRUCTION, ChatEngine, ChatMode, DEFAULT_CHAT_ENGINE};
pub use service::{ChatOptions, ChatReply, ChatService};
pub use store::{Chat, ChatStore, DEFAULT_CHAT_NAME, StoredMessage};
