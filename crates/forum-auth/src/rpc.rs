//! Wire types of the session validation RPC.
//!
//! Shared by the HTTP handlers that serve the RPC and by [`crate::AuthClient`]
//! that calls it.

use serde::{Deserialize, Serialize};

use forum_entity::session::SessionIdentity;
use forum_entity::user::UserRole;

pub const REGISTER_PATH: &str = "/api/auth/register";
pub const LOGIN_PATH: &str = "/api/auth/login";
pub const REFRESH_PATH: &str = "/api/auth/refresh";
pub const VALIDATE_PATH: &str = "/api/auth/validate";
pub const LOGOUT_PATH: &str = "/api/auth/logout";

/// Public self-registration. Carries no role: accounts created this way are
/// always [`UserRole::User`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub access_token: String,
}

/// Validation verdict. Identity fields are present only when `valid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
}

impl ValidateResponse {
    pub fn valid(identity: SessionIdentity) -> Self {
        Self {
            valid: true,
            user_id: Some(identity.user_id),
            username: Some(identity.username),
            role: Some(identity.role),
        }
    }

    pub fn invalid() -> Self {
        Self {
            valid: false,
            user_id: None,
            username: None,
            role: None,
        }
    }

    /// The identity, if and only if the verdict is valid and complete.
    pub fn into_identity(self) -> Option<SessionIdentity> {
        if !self.valid {
            return None;
        }
        Some(SessionIdentity {
            user_id: self.user_id?,
            username: self.username?,
            role: self.role?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_verdict_has_no_identity() {
        let json = serde_json::to_value(ValidateResponse::invalid()).unwrap();
        assert_eq!(json, serde_json::json!({ "valid": false }));
        assert!(ValidateResponse::invalid().into_identity().is_none());
    }

    #[test]
    fn test_partial_verdict_is_rejected() {
        let verdict = ValidateResponse {
            valid: true,
            user_id: Some(3),
            username: None,
            role: Some(UserRole::User),
        };
        assert!(verdict.into_identity().is_none());
    }
}
