//! Per-connection duty cycles.
//!
//! Each connection runs a reader and a writer concurrently. They share only
//! a cancellation token; all other coordination goes through the hub. When
//! either side stops, the other is torn down and the subscriber is
//! unregistered.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use bytes::Bytes;
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{Instant, interval_at, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use forum_core::config::RealtimeConfig;
use forum_entity::session::SessionIdentity;

use crate::chat::ChatService;
use crate::hub::{Payload, Subscriber, SubscriberId};
use crate::message::OutboundMessage;

/// Timing and size limits of one connection.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub send_queue_capacity: usize,
    pub ping_interval: Duration,
    pub pong_timeout: Duration,
    pub write_timeout: Duration,
    pub max_message_size: usize,
}

impl From<&RealtimeConfig> for ConnectionSettings {
    fn from(config: &RealtimeConfig) -> Self {
        Self {
            send_queue_capacity: config.send_queue_capacity,
            ping_interval: Duration::from_secs(config.ping_interval_seconds),
            pong_timeout: Duration::from_secs(config.pong_timeout_seconds),
            write_timeout: Duration::from_secs(config.write_timeout_seconds),
            max_message_size: config.max_message_size,
        }
    }
}

/// Serves an authenticated connection until either side goes away.
///
/// The auth acknowledgement is queued before the subscriber joins the hub,
/// so it is always the first frame the client sees.
pub async fn run_connection<S, E, K>(
    chat: Arc<ChatService>,
    identity: SessionIdentity,
    settings: ConnectionSettings,
    stream: S,
    sink: K,
) where
    S: Stream<Item = Result<Message, E>> + Unpin + Send + 'static,
    E: Display,
    K: Sink<Message> + Unpin + Send + 'static,
    K::Error: Display,
{
    let (subscriber, queue) = Subscriber::new(identity.clone(), settings.send_queue_capacity);
    let id = subscriber.id();

    let ack = OutboundMessage::Auth {
        username: identity.username.clone(),
    };
    match ack.to_payload() {
        Ok(payload) => {
            subscriber.enqueue(payload);
        }
        Err(e) => warn!(error = %e, "Failed to encode auth acknowledgement"),
    }

    if let Err(e) = chat.hub().register(subscriber).await {
        warn!(error = %e, "Could not register subscriber");
        return;
    }
    info!(subscriber = %id, user_id = identity.user_id, "Connection established");

    let cancel = CancellationToken::new();
    let mut writer = tokio::spawn(write_pump(sink, queue, settings.clone(), cancel.clone(), id));

    read_pump(stream, &chat, id, &identity, &settings, &cancel).await;

    // Unregistering closes the queue; the writer then sends Close and exits.
    chat.hub().unregister(id).await;
    if timeout(settings.write_timeout, &mut writer).await.is_err() {
        cancel.cancel();
        let _ = writer.await;
    }

    info!(subscriber = %id, user_id = identity.user_id, "Connection closed");
}

async fn read_pump<S, E>(
    mut stream: S,
    chat: &ChatService,
    id: SubscriberId,
    identity: &SessionIdentity,
    settings: &ConnectionSettings,
    cancel: &CancellationToken,
) where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    loop {
        // Any inbound frame, pongs included, restarts the deadline.
        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            next = timeout(settings.pong_timeout, stream.next()) => next,
        };

        let frame = match next {
            Err(_) => {
                debug!(subscriber = %id, "Read deadline passed");
                break;
            }
            Ok(None) => break,
            Ok(Some(Err(e))) => {
                debug!(subscriber = %id, error = %e, "Read failed");
                break;
            }
            Ok(Some(Ok(frame))) => frame,
        };

        match frame {
            Message::Text(text) => {
                let size = text.as_str().len();
                if size > settings.max_message_size {
                    warn!(subscriber = %id, size, "Oversized frame");
                    break;
                }
                chat.handle_inbound(id, identity, text.as_str()).await;
            }
            Message::Close(_) => break,
            Message::Binary(_) | Message::Ping(_) | Message::Pong(_) => {}
        }
    }
}

async fn write_pump<K>(
    mut sink: K,
    mut queue: mpsc::Receiver<Payload>,
    settings: ConnectionSettings,
    cancel: CancellationToken,
    id: SubscriberId,
) where
    K: Sink<Message> + Unpin,
    K::Error: Display,
{
    let mut ticker = interval_at(
        Instant::now() + settings.ping_interval,
        settings.ping_interval,
    );

    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => break,
            next = queue.recv() => match next {
                Some(payload) => Message::Text(payload.to_string().into()),
                None => {
                    // The hub dropped us: say goodbye and stop.
                    let _ = timeout(settings.write_timeout, sink.send(Message::Close(None))).await;
                    break;
                }
            },
            _ = ticker.tick() => Message::Ping(Bytes::new()),
        };

        match timeout(settings.write_timeout, sink.send(frame)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                debug!(subscriber = %id, error = %e, "Write failed");
                break;
            }
            Err(_) => {
                debug!(subscriber = %id, "Write deadline passed");
                break;
            }
        }
    }

    cancel.cancel();
    let _ = timeout(settings.write_timeout, sink.close()).await;
}

#[cfg(test)]
mod tests {
    use futures::channel::mpsc as fmpsc;

    use forum_entity::user::UserRole;

    use super::*;
    use crate::content::MemoryMessageStore;
    use crate::hub::{Hub, HubHandle};

    type Inbound = fmpsc::UnboundedSender<Result<Message, std::io::Error>>;
    type Outbound = fmpsc::UnboundedReceiver<Message>;

    fn settings() -> ConnectionSettings {
        ConnectionSettings {
            send_queue_capacity: 16,
            ping_interval: Duration::from_secs(54),
            pong_timeout: Duration::from_secs(60),
            write_timeout: Duration::from_secs(10),
            max_message_size: 512,
        }
    }

    fn alice() -> SessionIdentity {
        SessionIdentity {
            user_id: 1,
            username: "alice".into(),
            role: UserRole::User,
        }
    }

    fn spawn_connection(
        chat: Arc<ChatService>,
    ) -> (Inbound, Outbound, tokio::task::JoinHandle<()>) {
        let (in_tx, in_rx) = fmpsc::unbounded();
        let (out_tx, out_rx) = fmpsc::unbounded();
        let task = tokio::spawn(run_connection(chat, alice(), settings(), in_rx, out_tx));
        (in_tx, out_rx, task)
    }

    fn setup() -> (Arc<ChatService>, HubHandle) {
        let (hub, _task) = Hub::spawn(64);
        let chat = ChatService::new(hub.clone(), Arc::new(MemoryMessageStore::new()), 512);
        (Arc::new(chat), hub)
    }

    fn text_json(frame: Message) -> serde_json::Value {
        match frame {
            Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_auth_ack_then_broadcast_then_close() {
        let (chat, hub) = setup();
        let (in_tx, mut out_rx, task) = spawn_connection(chat);

        let ack = text_json(out_rx.next().await.unwrap());
        assert_eq!(ack, serde_json::json!({ "type": "auth", "username": "alice" }));

        in_tx
            .unbounded_send(Ok(Message::Text(
                String::from(r#"{"action":"create","payload":{"text":"hi"}}"#).into(),
            )))
            .unwrap();
        let frame = text_json(out_rx.next().await.unwrap());
        assert_eq!(frame["type"], "broadcast");
        assert_eq!(frame["payload"][0]["author"], "alice");

        drop(in_tx);
        assert!(matches!(out_rx.next().await, Some(Message::Close(_))));
        task.await.unwrap();
        assert_eq!(hub.subscriber_count().await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_client_is_pinged_then_dropped() {
        let (chat, hub) = setup();
        let (_in_tx, mut out_rx, task) = spawn_connection(chat);

        text_json(out_rx.next().await.unwrap());
        assert!(matches!(out_rx.next().await, Some(Message::Ping(_))));

        task.await.unwrap();
        assert_eq!(hub.subscriber_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_write_failure_tears_down_reader() {
        let (chat, hub) = setup();
        let (in_tx, in_rx) = fmpsc::unbounded::<Result<Message, std::io::Error>>();
        let (out_tx, out_rx) = fmpsc::unbounded::<Message>();
        drop(out_rx);

        let task = tokio::spawn(run_connection(chat, alice(), settings(), in_rx, out_tx));
        task.await.unwrap();
        assert_eq!(hub.subscriber_count().await.unwrap(), 0);
        drop(in_tx);
    }

    #[tokio::test]
    async fn test_client_close_frame_ends_connection() {
        let (chat, hub) = setup();
        let (in_tx, mut out_rx, task) = spawn_connection(chat);
        text_json(out_rx.next().await.unwrap());

        in_tx.unbounded_send(Ok(Message::Close(None))).unwrap();
        task.await.unwrap();
        assert_eq!(hub.subscriber_count().await.unwrap(), 0);
    }
}
