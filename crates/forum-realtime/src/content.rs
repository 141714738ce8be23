//! Chat message persistence contract and backends.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use forum_core::result::AppResult;
use forum_database::repositories::MessageRepository;
use forum_entity::message::ChatMessage;

/// Storage for chat messages.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn create(&self, author: &str, text: &str) -> AppResult<ChatMessage>;

    async fn find(&self, id: i64) -> AppResult<Option<ChatMessage>>;

    /// Returns whether a message was removed.
    async fn delete(&self, id: i64) -> AppResult<bool>;

    /// All messages, oldest first.
    async fn list(&self) -> AppResult<Vec<ChatMessage>>;

    /// Removes messages created at or before `cutoff`.
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;
}

#[async_trait]
impl MessageStore for MessageRepository {
    async fn create(&self, author: &str, text: &str) -> AppResult<ChatMessage> {
        MessageRepository::create(self, author, text).await
    }

    async fn find(&self, id: i64) -> AppResult<Option<ChatMessage>> {
        self.find_by_id(id).await
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        MessageRepository::delete(self, id).await
    }

    async fn list(&self) -> AppResult<Vec<ChatMessage>> {
        MessageRepository::list(self).await
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        MessageRepository::purge_older_than(self, cutoff).await
    }
}

#[derive(Debug, Default)]
struct InnerState {
    messages: Vec<ChatMessage>,
    next_id: i64,
}

/// Messages held in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryMessageStore {
    state: Arc<Mutex<InnerState>>,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a message with an explicit timestamp.
    pub async fn insert_at(
        &self,
        author: &str,
        text: &str,
        created_at: DateTime<Utc>,
    ) -> ChatMessage {
        let mut state = self.state.lock().await;
        state.next_id += 1;
        let message = ChatMessage {
            id: state.next_id,
            author: author.to_string(),
            text: text.to_string(),
            created_at,
        };
        state.messages.push(message.clone());
        state.messages.sort_by_key(|m| (m.created_at, m.id));
        message
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn create(&self, author: &str, text: &str) -> AppResult<ChatMessage> {
        Ok(self.insert_at(author, text, Utc::now()).await)
    }

    async fn find(&self, id: i64) -> AppResult<Option<ChatMessage>> {
        let state = self.state.lock().await;
        Ok(state.messages.iter().find(|m| m.id == id).cloned())
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.messages.len();
        state.messages.retain(|m| m.id != id);
        Ok(state.messages.len() != before)
    }

    async fn list(&self) -> AppResult<Vec<ChatMessage>> {
        Ok(self.state.lock().await.messages.clone())
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.messages.len();
        state.messages.retain(|m| m.created_at > cutoff);
        Ok((before - state.messages.len()) as u64)
    }
}
