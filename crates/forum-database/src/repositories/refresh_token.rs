//! Refresh token repository implementation.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use forum_core::error::{AppError, ErrorKind};
use forum_core::result::AppResult;
use forum_entity::token::RefreshTokenRecord;

/// Repository for hashed refresh token rows.
#[derive(Debug, Clone)]
pub struct RefreshTokenRepository {
    pool: PgPool,
}

impl RefreshTokenRepository {
    /// Create a new refresh token repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a token row.
    pub async fn create(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<RefreshTokenRecord> {
        sqlx::query_as::<_, RefreshTokenRecord>(
            "INSERT INTO refresh_tokens (token_hash, user_id, expires_at) VALUES ($1, $2, $3) \
             RETURNING token_hash, user_id, expires_at, created_at",
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to store refresh token", e))
    }

    /// Find a token row by hash.
    pub async fn find_by_hash(&self, token_hash: &str) -> AppResult<Option<RefreshTokenRecord>> {
        sqlx::query_as::<_, RefreshTokenRecord>(
            "SELECT token_hash, user_id, expires_at, created_at FROM refresh_tokens \
             WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find refresh token", e))
    }

    /// Delete a token row. Returns `true` only for the caller whose statement
    /// actually removed the row, so concurrent deletes of one hash have
    /// exactly one winner.
    pub async fn delete_by_hash(&self, token_hash: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete refresh token", e)
            })?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every row whose expiry is at or before `now`.
    pub async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to purge refresh tokens", e)
            })?;
        Ok(result.rows_affected())
    }
}
