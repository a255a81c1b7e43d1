//! In-memory chat storage
//!
//! Chats belong to one user; every read or write that names a chat checks
//! ownership first. Chat and message ids come from process-local sequences.

use crate::ChatError;
use chrono::{DateTime, Utc};
use coursegen_llm::{ChatMessage, Role};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Name given to chats created without one
pub const DEFAULT_CHAT_NAME: &str = "Новый чат";

/// Maximum number of messages kept per chat
const MAX_HISTORY_SIZE: usize = 200;

type Result<T> = std::result::Result<T, ChatError>;

/// A chat owned by one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: u64,
    pub user_id: i64,
    pub name: String,
    /// Model pinned for this chat, if any
    pub model: Option<String>,
    /// Chat engine pinned for this chat, if any
    pub engine: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One message in a chat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: u64,
    pub chat_id: u64,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<&StoredMessage> for ChatMessage {
    fn from(message: &StoredMessage) -> Self {
        ChatMessage {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    chats: HashMap<u64, Chat>,
    messages: HashMap<u64, VecDeque<StoredMessage>>,
    next_chat_id: u64,
    next_message_id: u64,
}

impl Inner {
    fn owned_chat(&self, chat_id: u64, user_id: i64) -> Result<&Chat> {
        self.chats
            .get(&chat_id)
            .filter(|chat| chat.user_id == user_id)
            .ok_or(ChatError::ChatNotFound(chat_id))
    }

    fn push(&mut self, chat_id: u64, role: Role, content: &str, max_history: usize) -> Result<u64> {
        if !self.chats.contains_key(&chat_id) {
            return Err(ChatError::ChatNotFound(chat_id));
        }
        self.next_message_id += 1;
        let id = self.next_message_id;

        let history = self.messages.entry(chat_id).or_default();
        history.push_back(StoredMessage {
            id,
            chat_id,
            role,
            content: content.to_string(),
            created_at: Utc::now(),
        });
        while history.len() > max_history {
            history.pop_front();
        }
        Ok(id)
    }
}

/// Shared chat storage; clones see the same chats
#[derive(Debug, Clone)]
pub struct ChatStore {
    inner: Arc<RwLock<Inner>>,
    max_history: usize,
}

impl Default for ChatStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatStore {
    pub fn new() -> Self {
        Self::with_max_history(MAX_HISTORY_SIZE)
    }

    /// Keep at most `max_history` messages per chat, dropping the oldest
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            max_history: max_history.max(1),
        }
    }

    /// Create a chat for `user_id`, named "Новый чат" unless a name is given
    pub async fn create_chat(&self, user_id: i64, name: Option<&str>) -> Chat {
        let mut inner = self.inner.write().await;
        inner.next_chat_id += 1;
        let chat = Chat {
            id: inner.next_chat_id,
            user_id,
            name: name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .unwrap_or(DEFAULT_CHAT_NAME)
                .to_string(),
            model: None,
            engine: None,
            created_at: Utc::now(),
        };
        inner.chats.insert(chat.id, chat.clone());
        inner.messages.insert(chat.id, VecDeque::new());
        chat
    }

    /// Chats of a user, newest first
    pub async fn list_chats(&self, user_id: i64) -> Vec<Chat> {
        let inner = self.inner.read().await;
        let mut chats: Vec<Chat> = inner
            .chats
            .values()
            .filter(|chat| chat.user_id == user_id)
            .cloned()
            .collect();
        chats.sort_by(|a, b| b.id.cmp(&a.id));
        chats
    }

    pub async fn chat(&self, chat_id: u64, user_id: i64) -> Result<Chat> {
        let inner = self.inner.read().await;
        inner.owned_chat(chat_id, user_id).cloned()
    }

    /// Messages of a chat, oldest first
    pub async fn history(&self, chat_id: u64, user_id: i64) -> Result<Vec<StoredMessage>> {
        let inner = self.inner.read().await;
        inner.owned_chat(chat_id, user_id)?;
        Ok(inner
            .messages
            .get(&chat_id)
            .map(|history| history.iter().cloned().collect())
            .unwrap_or_default())
    }

    pub async fn delete_chat(&self, chat_id: u64, user_id: i64) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.owned_chat(chat_id, user_id)?;
        inner.chats.remove(&chat_id);
        inner.messages.remove(&chat_id);
        Ok(())
    }

    /// Append a user message, returning its id
    pub async fn store_user_message(&self, chat_id: u64, text: &str) -> Result<u64> {
        let max_history = self.max_history;
        self.inner
            .write()
            .await
            .push(chat_id, Role::User, text, max_history)
    }

    /// Append an assistant message, returning its id
    pub async fn store_bot_message(&self, chat_id: u64, text: &str) -> Result<u64> {
        let max_history = self.max_history;
        self.inner
            .write()
            .await
            .push(chat_id, Role::Assistant, text, max_history)
    }

    /// Pin a model (and optionally a chat engine) for later turns
    pub async fn set_chat_model(
        &self,
        chat_id: u64,
        user_id: i64,
        model: impl Into<String>,
        engine: Option<String>,
    ) -> Result<Chat> {
        let mut inner = self.inner.write().await;
        inner.owned_chat(chat_id, user_id)?;
        let chat = inner
            .chats
            .get_mut(&chat_id)
            .ok_or(ChatError::ChatNotFound(chat_id))?;
        chat.model = Some(model.into());
        chat.engine = engine;
        Ok(chat.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_list_newest_first() {
        let store = ChatStore::new();
        let first = store.create_chat(1, None).await;
        let second = store.create_chat(1, Some("Rust")).await;
        store.create_chat(2, Some("чужой")).await;

        assert_eq!(first.name, DEFAULT_CHAT_NAME);
        let chats = store.list_chats(1).await;
        assert_eq!(
            chats.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );
    }

    #[tokio::test]
    async fn test_history_requires_owner() {
        let store = ChatStore::new();
        let chat = store.create_chat(1, None).await;
        store.store_user_message(chat.id, "привет").await.unwrap();

        assert_eq!(store.history(chat.id, 1).await.unwrap().len(), 1);
        assert!(matches!(
            store.history(chat.id, 2).await,
            Err(ChatError::ChatNotFound(id)) if id == chat.id
        ));
        assert!(store.delete_chat(chat.id, 2).await.is_err());
        assert!(store.set_chat_model(chat.id, 2, "m", None).await.is_err());
    }

    #[tokio::test]
    async fn test_message_ids_and_roles() {
        let store = ChatStore::new();
        let chat = store.create_chat(1, None).await;
        let user_id = store.store_user_message(chat.id, "вопрос").await.unwrap();
        let bot_id = store.store_bot_message(chat.id, "ответ").await.unwrap();
        assert!(bot_id > user_id);

        let history = store.history(chat.id, 1).await.unwrap();
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(ChatMessage::from(&history[1]).content, "ответ");
    }

    #[tokio::test]
    async fn test_delete_chat() {
        let store = ChatStore::new();
        let chat = store.create_chat(1, None).await;
        store.delete_chat(chat.id, 1).await.unwrap();

        assert!(store.list_chats(1).await.is_empty());
        assert!(store.store_user_message(chat.id, "x").await.is_err());
    }

    #[tokio::test]
    async fn test_set_chat_model() {
        let store = ChatStore::new();
        let chat = store.create_chat(1, None).await;
        let updated = store
            .set_chat_model(chat.id, 1, "GigaChat-Pro", Some("raw_giga".into()))
            .await
            .unwrap();
        assert_eq!(updated.model.as_deref(), Some("GigaChat-Pro"));
        assert_eq!(store.chat(chat.id, 1).await.unwrap().engine.as_deref(), Some("raw_giga"));
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let store = ChatStore::with_max_history(3);
        let chat = store.create_chat(1, None).await;
        for i in 0..5 {
            store.store_user_message(chat.id, &format!("m{i}")).await.unwrap();
        }
        let history = store.history(chat.id, 1).await.unwrap();
        assert_eq!(
            history.iter().map(|m| m.content.as_str()).collect::<Vec<_>>(),
            vec!["m2", "m3", "m4"]
        );
    }
}
