//! Chat message entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Maximum chat message length in characters.
pub const MAX_MESSAGE_CHARS: usize = 150;

/// A persisted chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ChatMessage {
    pub id: i64,
    /// Username of the authenticated sender.
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}
