//! Chat service: dispatches client actions against the message store and
//! pushes the refreshed list through the hub.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use forum_core::error::{AppError, ErrorKind};
use forum_core::result::AppResult;
use forum_entity::message::ChatMessage;
use forum_entity::session::SessionIdentity;

use crate::content::MessageStore;
use crate::hub::{HubHandle, SubscriberId};
use crate::message::{InboundAction, OutboundMessage, parse_inbound, validate_inbound};

/// Chat operations shared by every connection.
pub struct ChatService {
    hub: HubHandle,
    store: Arc<dyn MessageStore>,
    max_message_size: usize,
}

impl std::fmt::Debug for ChatService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatService")
            .field("hub", &self.hub)
            .field("max_message_size", &self.max_message_size)
            .finish()
    }
}

impl ChatService {
    pub fn new(hub: HubHandle, store: Arc<dyn MessageStore>, max_message_size: usize) -> Self {
        Self {
            hub,
            store,
            max_message_size,
        }
    }

    pub fn hub(&self) -> &HubHandle {
        &self.hub
    }

    pub async fn list(&self) -> AppResult<Vec<ChatMessage>> {
        self.store.list().await
    }

    /// Stores a message authored by `author` and broadcasts the new list.
    pub async fn create_message(
        &self,
        author: &SessionIdentity,
        text: &str,
    ) -> AppResult<ChatMessage> {
        let message = self.store.create(&author.username, text).await?;
        info!(message_id = message.id, user_id = author.user_id, "Chat message created");
        self.announce().await;
        Ok(message)
    }

    /// Deletes a message. Only its author or an admin may do so.
    pub async fn delete_message(&self, actor: &SessionIdentity, id: i64) -> AppResult<()> {
        let message = self
            .store
            .find(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Message {id} not found")))?;

        if message.author != actor.username && !actor.role.is_admin() {
            return Err(AppError::unauthorized(
                "Only the author or an admin may delete a message",
            ));
        }

        if self.store.delete(id).await? {
            info!(message_id = id, user_id = actor.user_id, "Chat message deleted");
            self.announce().await;
        }
        Ok(())
    }

    /// Sends the full list to every subscriber.
    pub async fn broadcast_messages(&self) -> AppResult<()> {
        let payload = OutboundMessage::Broadcast {
            payload: self.store.list().await?,
        }
        .to_payload()?;
        self.hub.broadcast(payload).await
    }

    /// Broadcasts after a committed write. The write stands even when the
    /// broadcast fails, so the failure is only logged.
    async fn announce(&self) {
        if let Err(e) = self.broadcast_messages().await {
            warn!(error = %e, "Chat list broadcast failed");
        }
    }

    /// Sends the full list to one subscriber.
    pub async fn send_messages_to(&self, subscriber: SubscriberId) -> AppResult<()> {
        let payload = OutboundMessage::Broadcast {
            payload: self.store.list().await?,
        }
        .to_payload()?;
        self.hub.send_to(subscriber, payload).await
    }

    /// Purges messages created at or before `cutoff` and rebroadcasts.
    pub async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let purged = self.store.purge_older_than(cutoff).await?;
        self.announce().await;
        Ok(purged)
    }

    /// Handles one text frame from `subscriber`. Failures are reported back
    /// to the sender only and never end the connection.
    pub async fn handle_inbound(
        &self,
        subscriber: SubscriberId,
        identity: &SessionIdentity,
        raw: &str,
    ) {
        if let Err(err) = self.dispatch(subscriber, identity, raw).await {
            debug!(subscriber = %subscriber, error = %err, "Inbound message rejected");
            self.reply_error(subscriber, &err).await;
        }
    }

    async fn dispatch(
        &self,
        subscriber: SubscriberId,
        identity: &SessionIdentity,
        raw: &str,
    ) -> AppResult<()> {
        validate_inbound(raw, self.max_message_size)?;
        match parse_inbound(raw)? {
            InboundAction::Create(payload) => {
                self.create_message(identity, &payload.text).await?;
            }
            InboundAction::Delete(payload) => {
                self.delete_message(identity, payload.id).await?;
            }
            InboundAction::List => self.send_messages_to(subscriber).await?,
        }
        Ok(())
    }

    async fn reply_error(&self, subscriber: SubscriberId, err: &AppError) {
        let message = match err.kind {
            ErrorKind::Validation | ErrorKind::NotFound | ErrorKind::Unauthorized => {
                err.message.clone()
            }
            _ => {
                error!(error = %err, "Chat operation failed");
                "Internal error".to_string()
            }
        };
        let frame = OutboundMessage::Error {
            code: err.kind.as_code().to_string(),
            message,
        };
        match frame.to_payload() {
            Ok(payload) => {
                let _ = self.hub.send_to(subscriber, payload).await;
            }
            Err(e) => warn!(error = %e, "Failed to encode error frame"),
        }
    }
}
