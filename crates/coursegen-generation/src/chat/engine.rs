//! Chat engines
//!
//! A chat engine names a provider and the way a conversation is sent to it:
//!
//! | engine     | provider   | sends                                      |
//! |------------|------------|--------------------------------------------|
//! | `raw_giga` | `gigachat` | the whole transcript                       |
//! | `raw_hf`   | `hf_api`   | the whole transcript                       |
//! | `lc_giga`  | `gigachat` | a fixed system instruction + last question |
//! | `lc_hf`    | `hf_api`   | a fixed system instruction + last question |

use crate::ChatError;
use coursegen_llm::{ChatMessage, GIGACHAT_ENGINE, HUGGINGFACE_ENGINE, Role};

/// Chat engine used when neither the request nor the chat names one
pub const DEFAULT_CHAT_ENGINE: &str = "lc_giga";

/// System instruction of the guided engines
pub const ASSISTANT_INSTRUCTION: &str = "Ты помощник. Отвечай кратко и по делу.";

/// How the conversation is presented to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatMode {
    /// Full history, as stored
    Raw,
    /// Fixed instruction plus the latest user question only
    Guided,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatEngine {
    name: &'static str,
    provider: &'static str,
    mode: ChatMode,
}

const ENGINES: &[ChatEngine] = &[
    ChatEngine {
        name: "raw_giga",
        provider: GIGACHAT_ENGINE,
        mode: ChatMode::Raw,
    },
    ChatEngine {
        name: "raw_hf",
        provider: HUGGINGFACE_ENGINE,
        mode: ChatMode::Raw,
    },
    ChatEngine {
        name: "lc_giga",
        provider: GIGACHAT_ENGINE,
        mode: ChatMode::Guided,
    },
    ChatEngine {
        name: "lc_hf",
        provider: HUGGINGFACE_ENGINE,
        mode: ChatMode::Guided,
    },
];

impl ChatEngine {
    /// Look up a chat engine by name
    pub fn parse(name: &str) -> Result<Self, ChatError> {
        let wanted = name.trim().to_lowercase();
        ENGINES
            .iter()
            .find(|engine| engine.name == wanted)
            .copied()
            .ok_or_else(|| ChatError::UnsupportedEngine(name.to_string()))
    }

    /// Names of all chat engines
    pub fn names() -> Vec<&'static str> {
        ENGINES.iter().map(|engine| engine.name).collect()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Provider engine in the engine registry
    pub fn provider(&self) -> &'static str {
        self.provider
    }

    pub fn mode(&self) -> ChatMode {
        self.mode
    }

    /// Messages to send for a conversation ending in the new user turn
    pub fn messages(&self, conversation: &[ChatMessage]) -> Vec<ChatMessage> {
        match self.mode {
            ChatMode::Raw => conversation.to_vec(),
            ChatMode::Guided => {
                let question = conversation
                    .iter()
                    .rev()
                    .find(|m| m.role == Role::User)
                    .map(|m| m.content.clone())
                    .unwrap_or_default();
                vec![
                    ChatMessage::system(ASSISTANT_INSTRUCTION),
                    ChatMessage::user(question),
                ]
            }
        }
    }
}
