//! Identity resolved from a validated access token.

use serde::{Deserialize, Serialize};

use crate::user::UserRole;

/// The caller's identity after successful token validation.
///
/// Passed explicitly to every operation that acts on behalf of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub user_id: i64,
    pub username: String,
    pub role: UserRole,
}
