//! Access token verification.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use forum_core::config::AuthConfig;
use forum_core::error::AppError;

use super::claims::Claims;

/// Verifies HS256 access tokens.
#[derive(Clone)]
pub struct JwtDecoder {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and verifies an access token.
    ///
    /// Every failure, including expiry, is `InvalidToken`. Expiry is checked
    /// against the local clock after signature verification, independent of
    /// the library's own check.
    pub fn decode_access_token(&self, token: &str) -> Result<Claims, AppError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::invalid_token("Token has expired")
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AppError::invalid_token("Invalid token signature")
                }
                _ => AppError::invalid_token("Malformed token"),
            }
        })?;

        let claims = data.claims;
        if claims.is_expired_at(Utc::now().timestamp()) {
            return Err(AppError::invalid_token("Token has expired"));
        }
        if claims.user_id().is_none() {
            return Err(AppError::invalid_token("Token subject is not a user id"));
        }
        Ok(claims)
    }
}
