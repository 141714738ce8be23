//! Inbound and outbound chat message definitions.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use validator::Validate;

use forum_core::result::AppResult;
use forum_entity::message::ChatMessage;

use crate::hub::Payload;

/// Raw client frame: `{"action": "...", "payload": ...}`.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundEnvelope {
    pub action: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Payload of a `create` action. The author is never taken from the client.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePayload {
    #[validate(length(min = 1, max = 150, message = "Message must be 1 to 150 characters"))]
    pub text: String,
}

/// Payload of a `delete` action.
#[derive(Debug, Clone, Deserialize)]
pub struct DeletePayload {
    pub id: i64,
}

/// A parsed and validated client request.
#[derive(Debug, Clone)]
pub enum InboundAction {
    Create(CreatePayload),
    Delete(DeletePayload),
    List,
}

/// Frames the server sends to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// First frame on every connection.
    Auth { username: String },
    /// The full current message list.
    Broadcast { payload: Vec<ChatMessage> },
    /// A rejected client request, sent only to the requester.
    Error { code: String, message: String },
}

impl OutboundMessage {
    pub fn to_payload(&self) -> AppResult<Payload> {
        let text = serde_json::to_string(self)?;
        Ok(Arc::from(text))
    }
}
