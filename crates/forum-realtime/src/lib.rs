//! # forum-realtime
//!
//! Realtime chat for the forum.
//!
//! ## Modules
//!
//! - `hub`: actor that owns the live subscriber set and fans payloads out
//! - `connection`: per-connection reader and writer pumps
//! - `message`: wire protocol types and inbound validation
//! - `content`: chat message store contract and backends
//! - `chat`: dispatch of inbound actions and list broadcasts
//! - `sweep`: periodic retention purge

pub mod chat;
pub mod connection;
pub mod content;
pub mod hub;
pub mod message;
pub mod sweep;

pub use chat::ChatService;
pub use connection::{ConnectionSettings, run_connection};
pub use content::{MemoryMessageStore, MessageStore};
pub use sweep::{SweepSettings, spawn_sweeper};
pub use hub::{Hub, HubHandle, Payload, Subscriber, SubscriberId};
