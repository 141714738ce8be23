//! # forum-database
//!
//! PostgreSQL connection management, embedded migrations, and the
//! repositories for users, refresh tokens and chat messages.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
