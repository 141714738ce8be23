//! Claims carried by every access token.

use serde::{Deserialize, Serialize};

use forum_entity::session::SessionIdentity;
use forum_entity::user::UserRole;

/// JWT claims payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id, as a decimal string.
    pub sub: String,
    /// Username at issuance.
    pub username: String,
    /// Role at issuance.
    pub role: UserRole,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Unique token id.
    pub jti: String,
}

impl Claims {
    /// Parses the subject as a user id. `None` unless it is a positive integer.
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse::<i64>().ok().filter(|id| *id > 0)
    }

    /// Whether the token is expired at the given unix time.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp <= now
    }

    /// Converts verified claims into the caller identity.
    pub fn into_identity(self) -> Option<SessionIdentity> {
        let user_id = self.user_id()?;
        Some(SessionIdentity {
            user_id,
            username: self.username,
            role: self.role,
        })
    }
}
