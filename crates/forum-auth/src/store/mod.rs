//! Credential store contracts.
//!
//! The authority talks to persistence only through these traits. Two
//! backends exist: the PostgreSQL repositories and an in-memory store used
//! by tests and single-process development runs.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use forum_core::result::AppResult;
use forum_entity::token::RefreshTokenRecord;
use forum_entity::user::{NewUser, User};

pub use memory::MemoryCredentialStore;

/// User lookups and registration.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_name(&self, username: &str) -> AppResult<Option<User>>;

    async fn find_user_by_id(&self, id: i64) -> AppResult<Option<User>>;

    /// Inserts a user. Fails with `AlreadyExists` if the name is taken.
    async fn create_user(&self, user: NewUser) -> AppResult<User>;

    async fn user_exists(&self, username: &str) -> AppResult<bool>;
}

/// Hashed refresh token rows.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn create_refresh_token(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<RefreshTokenRecord>;

    async fn find_refresh_token_by_hash(
        &self,
        token_hash: &str,
    ) -> AppResult<Option<RefreshTokenRecord>>;

    /// Removes the row for `token_hash`. Must be atomic: when several callers
    /// race on one hash, exactly one observes `true`.
    async fn delete_refresh_token_by_hash(&self, token_hash: &str) -> AppResult<bool>;

    /// Removes every row expired at `now`, returning how many went.
    async fn delete_expired_refresh_tokens(&self, now: DateTime<Utc>) -> AppResult<u64>;
}
