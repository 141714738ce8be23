//! The fan-out hub.
//!
//! A single task owns the set of live subscribers. Everything else talks to
//! it through a [`HubHandle`], so membership changes and broadcasts are
//! serialized without a lock around the set.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use forum_core::error::AppError;
use forum_core::result::AppResult;
use forum_entity::session::SessionIdentity;

/// Unique subscriber identifier.
pub type SubscriberId = Uuid;

/// A serialized outbound frame, shared between all recipients of a broadcast.
pub type Payload = Arc<str>;

/// One connected client as seen by the hub.
#[derive(Debug)]
pub struct Subscriber {
    id: SubscriberId,
    identity: SessionIdentity,
    sender: mpsc::Sender<Payload>,
}

impl Subscriber {
    /// Creates a subscriber with a bounded outbound queue of `capacity`
    /// frames. The receiver goes to the connection's writer.
    pub fn new(identity: SessionIdentity, capacity: usize) -> (Self, mpsc::Receiver<Payload>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let subscriber = Self {
            id: Uuid::new_v4(),
            identity,
            sender,
        };
        (subscriber, receiver)
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    /// Queues a frame before the subscriber is handed to the hub.
    pub(crate) fn enqueue(&self, payload: Payload) -> bool {
        self.sender.try_send(payload).is_ok()
    }
}

enum HubCommand {
    Register {
        subscriber: Subscriber,
        ack: oneshot::Sender<()>,
    },
    Unregister {
        id: SubscriberId,
    },
    Broadcast {
        payload: Payload,
    },
    SendTo {
        id: SubscriberId,
        payload: Payload,
    },
    Count {
        reply: oneshot::Sender<usize>,
    },
    Shutdown,
}

/// Cloneable handle to a running hub.
#[derive(Debug, Clone)]
pub struct HubHandle {
    commands: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    /// Adds a subscriber. Returns once the hub has applied the insertion, so
    /// every broadcast issued afterwards reaches it.
    pub async fn register(&self, subscriber: Subscriber) -> AppResult<()> {
        let (ack, acked) = oneshot::channel();
        self.send(HubCommand::Register { subscriber, ack }).await?;
        acked.await.map_err(|_| hub_stopped())
    }

    /// Removes a subscriber and closes its queue. Unknown ids are ignored.
    pub async fn unregister(&self, id: SubscriberId) {
        let _ = self.send(HubCommand::Unregister { id }).await;
    }

    /// Offers `payload` to every subscriber without waiting on any of them.
    pub async fn broadcast(&self, payload: Payload) -> AppResult<()> {
        self.send(HubCommand::Broadcast { payload }).await
    }

    /// Offers `payload` to one subscriber, same drop policy as broadcast.
    pub async fn send_to(&self, id: SubscriberId, payload: Payload) -> AppResult<()> {
        self.send(HubCommand::SendTo { id, payload }).await
    }

    /// Number of live subscribers.
    pub async fn subscriber_count(&self) -> AppResult<usize> {
        let (reply, answer) = oneshot::channel();
        self.send(HubCommand::Count { reply }).await?;
        answer.await.map_err(|_| hub_stopped())
    }

    /// Stops the hub, closing every subscriber queue.
    pub async fn shutdown(&self) {
        let _ = self.send(HubCommand::Shutdown).await;
    }

    async fn send(&self, command: HubCommand) -> AppResult<()> {
        self.commands.send(command).await.map_err(|_| hub_stopped())
    }
}

fn hub_stopped() -> AppError {
    AppError::internal("Hub is not running")
}

/// The hub loop state.
pub struct Hub {
    subscribers: HashMap<SubscriberId, Subscriber>,
    commands: mpsc::Receiver<HubCommand>,
}

impl Hub {
    /// Starts the hub on the current runtime.
    pub fn spawn(command_buffer: usize) -> (HubHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(command_buffer.max(1));
        let hub = Self {
            subscribers: HashMap::new(),
            commands: rx,
        };
        let task = tokio::spawn(hub.run());
        (HubHandle { commands: tx }, task)
    }

    async fn run(mut self) {
        info!("Hub started");
        while let Some(command) = self.commands.recv().await {
            match command {
                HubCommand::Register { subscriber, ack } => {
                    debug!(
                        subscriber = %subscriber.id,
                        user_id = subscriber.identity.user_id,
                        "Subscriber registered"
                    );
                    self.subscribers.insert(subscriber.id, subscriber);
                    let _ = ack.send(());
                }
                HubCommand::Unregister { id } => {
                    if self.subscribers.remove(&id).is_some() {
                        debug!(subscriber = %id, "Subscriber unregistered");
                    }
                }
                HubCommand::Broadcast { payload } => self.broadcast(&payload),
                HubCommand::SendTo { id, payload } => self.deliver(id, payload),
                HubCommand::Count { reply } => {
                    let _ = reply.send(self.subscribers.len());
                }
                HubCommand::Shutdown => break,
            }
        }
        info!(remaining = self.subscribers.len(), "Hub stopped");
    }

    fn broadcast(&mut self, payload: &Payload) {
        let mut dropped = Vec::new();
        for (id, subscriber) in &self.subscribers {
            if let Err(e) = subscriber.sender.try_send(payload.clone()) {
                dropped.push((*id, matches!(e, mpsc::error::TrySendError::Full(_))));
            }
        }
        for (id, full) in dropped {
            self.drop_subscriber(id, full);
        }
    }

    fn deliver(&mut self, id: SubscriberId, payload: Payload) {
        let Some(subscriber) = self.subscribers.get(&id) else {
            return;
        };
        if let Err(e) = subscriber.sender.try_send(payload) {
            let full = matches!(e, mpsc::error::TrySendError::Full(_));
            self.drop_subscriber(id, full);
        }
    }

    // Removing the entry drops the only sender, which closes the queue.
    fn drop_subscriber(&mut self, id: SubscriberId, full: bool) {
        if let Some(subscriber) = self.subscribers.remove(&id) {
            if full {
                warn!(
                    subscriber = %id,
                    user_id = subscriber.identity.user_id,
                    "Dropping slow subscriber"
                );
            } else {
                debug!(subscriber = %id, "Dropping subscriber with closed queue");
            }
        }
    }
}
