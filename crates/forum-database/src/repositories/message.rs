//! Chat message repository implementation.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use forum_core::error::{AppError, ErrorKind};
use forum_core::result::AppResult;
use forum_entity::message::ChatMessage;

/// Repository for chat messages.
#[derive(Debug, Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    /// Create a new message repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, author: &str, text: &str) -> AppResult<ChatMessage> {
        sqlx::query_as::<_, ChatMessage>(
            "INSERT INTO chat_messages (author, text) VALUES ($1, $2) \
             RETURNING id, author, text, created_at",
        )
        .bind(author)
        .bind(text)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create message", e))
    }

    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<ChatMessage>> {
        sqlx::query_as::<_, ChatMessage>(
            "SELECT id, author, text, created_at FROM chat_messages WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find message", e))
    }

    /// Delete a message. Returns whether a row existed.
    pub async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM chat_messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete message", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// All messages, oldest first.
    pub async fn list(&self) -> AppResult<Vec<ChatMessage>> {
        sqlx::query_as::<_, ChatMessage>(
            "SELECT id, author, text, created_at FROM chat_messages ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list messages", e))
    }

    /// Delete messages created at or before `cutoff`.
    pub async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM chat_messages WHERE created_at <= $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to purge messages", e))?;
        Ok(result.rows_affected())
    }
}
