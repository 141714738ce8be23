//! `AuthUser` extractor: the caller's validated identity.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use forum_core::error::AppError;
use forum_entity::session::SessionIdentity;

use crate::error::ApiError;
use crate::state::AppState;

/// Identity of the authenticated caller.
///
/// Taken from the request extensions when the session guard already ran,
/// otherwise resolved from the `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct AuthUser(pub SessionIdentity);

impl std::ops::Deref for AuthUser {
    type Target = SessionIdentity;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Returns the bearer token of the `Authorization` header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<SessionIdentity>() {
            return Ok(AuthUser(identity.clone()));
        }

        let token = bearer_token(&parts.headers)
            .ok_or_else(|| AppError::unauthorized("Missing Authorization header"))?;
        let identity = state.validator.validate(token).await?;
        Ok(AuthUser(identity))
    }
}
