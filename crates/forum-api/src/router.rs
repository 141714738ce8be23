//! Route definitions for the forum HTTP API.
//!
//! Auth RPC, chat and health routes are mounted under `/api`; the WebSocket
//! upgrade lives at `/ws`.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use forum_auth::rpc::{LOGIN_PATH, LOGOUT_PATH, REFRESH_PATH, REGISTER_PATH, VALIDATE_PATH};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Builds the router with every route bound to `state`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(auth_routes())
        .merge(message_routes(state.clone()))
        .route("/api/health", get(handlers::health::health))
        .route("/ws", get(handlers::ws::ws_upgrade))
        .with_state(state)
}

/// Session RPC. The paths are shared with the remote client.
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(REGISTER_PATH, post(handlers::auth::register))
        .route(LOGIN_PATH, post(handlers::auth::login))
        .route(REFRESH_PATH, post(handlers::auth::refresh))
        .route(VALIDATE_PATH, post(handlers::auth::validate))
        .route(LOGOUT_PATH, post(handlers::auth::logout))
}

/// Chat endpoints behind the session guard.
fn message_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/messages", get(handlers::messages::list_messages))
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::session::session_guard,
        ))
}
