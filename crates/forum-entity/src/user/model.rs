//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::role::UserRole;

/// A registered forum user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Store-assigned identifier. Positive once persisted.
    pub id: i64,
    /// Unique login name.
    pub username: String,
    /// Argon2id PHC string.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Authorization tag.
    pub role: UserRole,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether this row has a stable identity that tokens can be bound to.
    pub fn has_stable_identity(&self) -> bool {
        self.id > 0 && !self.username.is_empty()
    }
}

/// Insert payload for a new user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: UserRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, username: &str) -> User {
        User {
            id,
            username: username.to_string(),
            password_hash: "$argon2id$...".to_string(),
            role: UserRole::User,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_stable_identity() {
        assert!(user(1, "alice").has_stable_identity());
        assert!(!user(0, "alice").has_stable_identity());
        assert!(!user(7, "").has_stable_identity());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_value(user(3, "bob")).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "bob");
    }
}
