//! # forum-api
//!
//! HTTP layer of the forum built on Axum.
//!
//! Serves the session RPC (`/api/auth/*`), the guarded chat endpoints, the
//! WebSocket upgrade, and the middleware around them (session guard, CORS,
//! request logging).

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use error::ApiError;
pub use state::AppState;
