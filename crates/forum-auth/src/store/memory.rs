//! In-memory credential store using a Tokio mutex.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use forum_core::error::AppError;
use forum_core::result::AppResult;
use forum_entity::token::RefreshTokenRecord;
use forum_entity::user::{NewUser, User};

use super::{RefreshTokenStore, UserStore};

#[derive(Debug, Default)]
struct InnerState {
    users: HashMap<i64, User>,
    ids_by_name: HashMap<String, i64>,
    next_user_id: i64,
    tokens: HashMap<String, RefreshTokenRecord>,
}

/// Users and refresh tokens held in process memory.
///
/// Every operation takes the single lock, which makes delete-by-hash
/// trivially linearizable. Suitable for tests and single-node development
/// only.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    state: Arc<Mutex<InnerState>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live refresh token rows.
    pub async fn refresh_token_count(&self) -> usize {
        self.state.lock().await.tokens.len()
    }

    /// Inserts a token row verbatim, bypassing the authority. Used to stage
    /// rows with arbitrary expiries.
    pub async fn insert_refresh_token(&self, record: RefreshTokenRecord) {
        self.state
            .lock()
            .await
            .tokens
            .insert(record.token_hash.clone(), record);
    }
}

#[async_trait]
impl UserStore for MemoryCredentialStore {
    async fn find_user_by_name(&self, username: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state
            .ids_by_name
            .get(username)
            .and_then(|id| state.users.get(id))
            .cloned())
    }

    async fn find_user_by_id(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let mut state = self.state.lock().await;
        if state.ids_by_name.contains_key(&user.username) {
            return Err(AppError::already_exists(format!(
                "Username '{}' is already taken",
                user.username
            )));
        }

        state.next_user_id += 1;
        let record = User {
            id: state.next_user_id,
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
            created_at: Utc::now(),
        };
        state
            .ids_by_name
            .insert(record.username.clone(), record.id);
        state.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn user_exists(&self, username: &str) -> AppResult<bool> {
        Ok(self.state.lock().await.ids_by_name.contains_key(username))
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryCredentialStore {
    async fn create_refresh_token(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<RefreshTokenRecord> {
        let mut state = self.state.lock().await;
        if state.tokens.contains_key(token_hash) {
            return Err(AppError::database("Duplicate refresh token hash"));
        }
        let record = RefreshTokenRecord {
            token_hash: token_hash.to_string(),
            user_id,
            expires_at,
            created_at: Utc::now(),
        };
        state.tokens.insert(record.token_hash.clone(), record.clone());
        Ok(record)
    }

    async fn find_refresh_token_by_hash(
        &self,
        token_hash: &str,
    ) -> AppResult<Option<RefreshTokenRecord>> {
        Ok(self.state.lock().await.tokens.get(token_hash).cloned())
    }

    async fn delete_refresh_token_by_hash(&self, token_hash: &str) -> AppResult<bool> {
        Ok(self.state.lock().await.tokens.remove(token_hash).is_some())
    }

    async fn delete_expired_refresh_tokens(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.tokens.len();
        state.tokens.retain(|_, record| !record.is_expired_at(now));
        Ok((before - state.tokens.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use forum_core::ErrorKind;
    use forum_entity::user::UserRole;

    use super::*;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            password_hash: "hash".to_string(),
            role: UserRole::User,
        }
    }

    #[tokio::test]
    async fn test_user_ids_start_at_one() {
        let store = MemoryCredentialStore::new();
        let alice = store.create_user(new_user("alice")).await.unwrap();
        let bob = store.create_user(new_user("bob")).await.unwrap();
        assert_eq!(alice.id, 1);
        assert_eq!(bob.id, 2);
        assert!(store.user_exists("alice").await.unwrap());
        assert_eq!(
            store.find_user_by_id(2).await.unwrap().unwrap().username,
            "bob"
        );
    }

    #[tokio::test]
    async fn test_duplicate_user_rejected() {
        let store = MemoryCredentialStore::new();
        store.create_user(new_user("alice")).await.unwrap();
        let err = store.create_user(new_user("alice")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::AlreadyExists);
    }

    #[tokio::test]
    async fn test_delete_reports_single_winner() {
        let store = MemoryCredentialStore::new();
        let exp = Utc::now() + Duration::days(1);
        store.create_refresh_token(1, "h", exp).await.unwrap();
        assert!(store.delete_refresh_token_by_hash("h").await.unwrap());
        assert!(!store.delete_refresh_token_by_hash("h").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_expired() {
        let store = MemoryCredentialStore::new();
        let now = Utc::now();
        store
            .create_refresh_token(1, "old", now - Duration::minutes(1))
            .await
            .unwrap();
        store
            .create_refresh_token(1, "new", now + Duration::days(1))
            .await
            .unwrap();
        assert_eq!(store.delete_expired_refresh_tokens(now).await.unwrap(), 1);
        assert_eq!(store.refresh_token_count().await, 1);
    }
}
