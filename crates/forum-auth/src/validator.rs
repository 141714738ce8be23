//! The validation contract consumed by services that accept access tokens.

use async_trait::async_trait;

use forum_core::result::AppResult;
use forum_entity::session::SessionIdentity;
use forum_entity::token::TokenPair;

use crate::authority::TokenAuthority;

/// Resolves access tokens to identities and rotates refresh tokens.
///
/// Callers must treat any error as unauthenticated and must not cache a
/// verdict beyond the request it was obtained for.
#[async_trait]
pub trait SessionValidator: Send + Sync {
    async fn validate(&self, access_token: &str) -> AppResult<SessionIdentity>;

    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair>;
}

#[async_trait]
impl SessionValidator for TokenAuthority {
    async fn validate(&self, access_token: &str) -> AppResult<SessionIdentity> {
        self.validate_token(access_token)
    }

    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        TokenAuthority::refresh(self, refresh_token).await
    }
}
