//! WebSocket upgrade handler.

use axum::extract::ws::WebSocket;
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::Response;
use futures::StreamExt;
use serde::Deserialize;

use forum_core::error::AppError;
use forum_entity::session::SessionIdentity;
use forum_realtime::run_connection;

use crate::error::ApiError;
use crate::extractors::bearer_token;
use crate::state::AppState;

/// Query parameters accepted on the upgrade request.
#[derive(Debug, Default, Deserialize)]
pub struct WsQuery {
    #[serde(alias = "accessToken")]
    pub token: Option<String>,
}

/// GET /ws?token={jwt}
///
/// The token is validated before the upgrade is accepted; the header form
/// `Authorization: Bearer` is checked first.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let token = bearer_token(&headers)
        .map(str::to_owned)
        .or(query.token.filter(|t| !t.is_empty()))
        .ok_or_else(|| AppError::unauthorized("Missing access token"))?;

    let identity = state.validator.validate(&token).await?;

    Ok(ws
        .max_message_size(state.connection.max_message_size)
        .on_upgrade(move |socket| serve_socket(state, identity, socket)))
}

async fn serve_socket(state: AppState, identity: SessionIdentity, socket: WebSocket) {
    let (sink, stream) = socket.split();
    run_connection(state.chat, identity, state.connection, stream, sink).await;
}
