//! The token authority: registration, login, refresh rotation, access
//! token validation and logout.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, error, info, warn};

use forum_core::config::{
    AuthConfig, MAX_ACCESS_TOKEN_TTL_MINUTES, MAX_REFRESH_TOKEN_TTL_DAYS,
};
use forum_core::error::{AppError, ErrorKind};
use forum_core::result::AppResult;
use forum_entity::session::SessionIdentity;
use forum_entity::token::TokenPair;
use forum_entity::user::{NewUser, User, UserRole};

use crate::jwt::{JwtDecoder, JwtEncoder};
use crate::password::{PasswordHasher, validate_password, validate_username};
use crate::store::{RefreshTokenStore, UserStore};
use crate::token::{generate_refresh_token, hash_refresh_token};

/// Issues, validates, rotates and revokes credential pairs.
///
/// Built once at startup from the loaded [`AuthConfig`]. Cheap to share
/// behind an `Arc`; holds no per-request state.
pub struct TokenAuthority {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn RefreshTokenStore>,
    encoder: JwtEncoder,
    decoder: JwtDecoder,
    hasher: PasswordHasher,
    refresh_ttl: Duration,
    password_min_length: usize,
}

impl std::fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthority")
            .field("encoder", &self.encoder)
            .field("hasher", &self.hasher)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl TokenAuthority {
    pub fn new(
        config: &AuthConfig,
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn RefreshTokenStore>,
    ) -> AppResult<Self> {
        // Bounded TTLs keep `now + ttl` far from the timestamp range limits.
        if config.access_token_ttl_minutes > MAX_ACCESS_TOKEN_TTL_MINUTES
            || config.refresh_token_ttl_days > MAX_REFRESH_TOKEN_TTL_DAYS
        {
            return Err(AppError::configuration("auth token TTLs are out of range"));
        }
        let refresh_ttl = Duration::days(config.refresh_token_ttl_days as i64);

        Ok(Self {
            users,
            tokens,
            encoder: JwtEncoder::new(config),
            decoder: JwtDecoder::new(config),
            hasher: PasswordHasher::new(&config.argon2)?,
            refresh_ttl,
            password_min_length: config.password_min_length,
        })
    }

    /// Registers a new user. The role defaults to [`UserRole::User`].
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        role: Option<UserRole>,
    ) -> AppResult<User> {
        validate_username(username)?;
        validate_password(password, self.password_min_length)?;

        if self.users.user_exists(username).await.map_err(conceal)? {
            return Err(AppError::already_exists(format!(
                "Username '{username}' is already taken"
            )));
        }

        let password_hash = self.hash_blocking(password).await?;
        let user = self
            .users
            .create_user(NewUser {
                username: username.to_string(),
                password_hash,
                role: role.unwrap_or_default(),
            })
            .await
            .map_err(conceal)?;

        info!(user_id = user.id, username = %user.username, role = %user.role, "User registered");
        Ok(user)
    }

    /// Verifies credentials and issues a fresh pair.
    ///
    /// Unknown user and wrong password produce the same error after the
    /// same amount of hashing work.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<TokenPair> {
        let user = self
            .users
            .find_user_by_name(username)
            .await
            .map_err(conceal)?;

        let Some(user) = user else {
            self.verify_dummy_blocking(password).await;
            debug!(username = %username, "Login for unknown user");
            return Err(AppError::invalid_credentials());
        };

        if !self.verify_blocking(password, &user.password_hash).await? {
            warn!(user_id = user.id, "Login with wrong password");
            return Err(AppError::invalid_credentials());
        }

        let pair = self.issue_pair(&user).await?;
        info!(user_id = user.id, "User logged in");
        Ok(pair)
    }

    /// Rotates a refresh token: the presented token is consumed and a new
    /// pair is issued.
    ///
    /// A token can be rotated at most once. When two callers race on the
    /// same token, only the one whose delete removes the row gets a pair;
    /// the other sees `TokenNotFound`.
    pub async fn refresh(&self, raw_refresh_token: &str) -> AppResult<TokenPair> {
        let token_hash = hash_refresh_token(raw_refresh_token);

        // Step 1: look up the live row
        let record = self
            .tokens
            .find_refresh_token_by_hash(&token_hash)
            .await
            .map_err(conceal)?
            .ok_or_else(AppError::token_not_found)?;

        // Step 2: reap expired rows before anything else
        if record.is_expired_at(Utc::now()) {
            self.tokens
                .delete_refresh_token_by_hash(&token_hash)
                .await
                .map_err(conceal)?;
            info!(user_id = record.user_id, "Rejected expired refresh token");
            return Err(AppError::token_expired());
        }

        // Step 3: resolve the owner
        let user = self
            .users
            .find_user_by_id(record.user_id)
            .await
            .map_err(conceal)?;
        let Some(user) = user else {
            self.tokens
                .delete_refresh_token_by_hash(&token_hash)
                .await
                .map_err(conceal)?;
            warn!(user_id = record.user_id, "Refresh token owner no longer exists");
            return Err(AppError::invalid_user("Token owner does not exist"));
        };

        // Step 4: consume the old token; losing the race means it is gone
        let consumed = self
            .tokens
            .delete_refresh_token_by_hash(&token_hash)
            .await
            .map_err(conceal)?;
        if !consumed {
            warn!(user_id = user.id, "Concurrent refresh lost the race");
            return Err(AppError::token_not_found());
        }

        // Step 5: issue the replacement
        let pair = self.issue_pair(&user).await?;
        info!(user_id = user.id, "Refresh token rotated");
        Ok(pair)
    }

    /// Verifies an access token and returns the identity it carries.
    ///
    /// Never touches the store.
    pub fn validate_token(&self, access_token: &str) -> AppResult<SessionIdentity> {
        self.decoder
            .decode_access_token(access_token)?
            .into_identity()
            .ok_or_else(|| AppError::invalid_token("Token subject is not a user id"))
    }

    /// Revokes a refresh token. Revoking an unknown token succeeds.
    pub async fn logout(&self, raw_refresh_token: &str) -> AppResult<()> {
        let token_hash = hash_refresh_token(raw_refresh_token);
        let removed = self
            .tokens
            .delete_refresh_token_by_hash(&token_hash)
            .await
            .map_err(conceal)?;
        debug!(removed, "Logout processed");
        Ok(())
    }

    /// Deletes every expired refresh token row.
    pub async fn purge_expired_tokens(&self) -> AppResult<u64> {
        let purged = self
            .tokens
            .delete_expired_refresh_tokens(Utc::now())
            .await
            .map_err(conceal)?;
        if purged > 0 {
            info!(purged, "Purged expired refresh tokens");
        }
        Ok(purged)
    }

    async fn issue_pair(&self, user: &User) -> AppResult<TokenPair> {
        if !user.has_stable_identity() {
            return Err(AppError::invalid_user(
                "Cannot issue tokens for a user without a stable identity",
            ));
        }

        let now = Utc::now();
        let (access_token, access_expires_at) = self.encoder.encode_access_token(user, now)?;

        let refresh_token = generate_refresh_token();
        let refresh_expires_at = now + self.refresh_ttl;
        self.tokens
            .create_refresh_token(user.id, &hash_refresh_token(&refresh_token), refresh_expires_at)
            .await
            .map_err(conceal)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_at,
            refresh_expires_at,
        })
    }

    async fn hash_blocking(&self, password: &str) -> AppResult<String> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash_password(&password))
            .await
            .map_err(|e| AppError::internal(format!("Hashing task failed: {e}")))?
            .map_err(conceal)
    }

    async fn verify_blocking(&self, password: &str, hash: &str) -> AppResult<bool> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || hasher.verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::internal(format!("Verification task failed: {e}")))?
            .map_err(conceal)
    }

    async fn verify_dummy_blocking(&self, password: &str) {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        let _ = tokio::task::spawn_blocking(move || hasher.verify_dummy(&password)).await;
    }
}

/// Collapses infrastructure failures into an opaque `Internal` error.
/// Domain errors pass through untouched.
fn conceal(err: AppError) -> AppError {
    match err.kind {
        ErrorKind::Database
        | ErrorKind::Internal
        | ErrorKind::Serialization
        | ErrorKind::Configuration
        | ErrorKind::ExternalService => {
            error!(error = %err, "Credential store failure");
            AppError::internal("Internal error")
        }
        _ => err,
    }
}
