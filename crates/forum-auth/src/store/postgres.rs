//! Store traits backed by the PostgreSQL repositories.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use forum_core::result::AppResult;
use forum_database::repositories::{RefreshTokenRepository, UserRepository};
use forum_entity::token::RefreshTokenRecord;
use forum_entity::user::{NewUser, User};

use super::{RefreshTokenStore, UserStore};

#[async_trait]
impl UserStore for UserRepository {
    async fn find_user_by_name(&self, username: &str) -> AppResult<Option<User>> {
        self.find_by_username(username).await
    }

    async fn find_user_by_id(&self, id: i64) -> AppResult<Option<User>> {
        self.find_by_id(id).await
    }

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        self.create(&user).await
    }

    async fn user_exists(&self, username: &str) -> AppResult<bool> {
        self.exists(username).await
    }
}

#[async_trait]
impl RefreshTokenStore for RefreshTokenRepository {
    async fn create_refresh_token(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<RefreshTokenRecord> {
        self.create(user_id, token_hash, expires_at).await
    }

    async fn find_refresh_token_by_hash(
        &self,
        token_hash: &str,
    ) -> AppResult<Option<RefreshTokenRecord>> {
        self.find_by_hash(token_hash).await
    }

    async fn delete_refresh_token_by_hash(&self, token_hash: &str) -> AppResult<bool> {
        self.delete_by_hash(token_hash).await
    }

    async fn delete_expired_refresh_tokens(&self, now: DateTime<Utc>) -> AppResult<u64> {
        self.delete_expired(now).await
    }
}
