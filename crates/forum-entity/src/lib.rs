//! # forum-entity
//!
//! Domain entity models shared by the auth, realtime and API crates. Every
//! struct here is either a database row (deriving `sqlx::FromRow`) or a
//! value object crossing a crate boundary.

pub mod message;
pub mod session;
pub mod token;
pub mod user;

pub use message::ChatMessage;
pub use session::SessionIdentity;
pub use token::{RefreshTokenRecord, TokenPair};
pub use user::{User, UserRole};
