//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use forum_auth::{SessionValidator, TokenAuthority};
use forum_core::config::AppConfig;
use forum_realtime::{ChatService, ConnectionSettings};

/// Shared dependencies handed to every handler via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    pub config: Arc<AppConfig>,
    pub connection: ConnectionSettings,

    // ── Auth ─────────────────────────────────────────────────
    /// Serves the session RPC.
    pub authority: Arc<TokenAuthority>,
    /// Resolves identities for the guard and the WebSocket upgrade. Either
    /// the local authority or a client of a remote one.
    pub validator: Arc<dyn SessionValidator>,

    // ── Realtime ─────────────────────────────────────────────
    pub chat: Arc<ChatService>,
}

impl AppState {
    pub fn new(
        config: Arc<AppConfig>,
        authority: Arc<TokenAuthority>,
        validator: Arc<dyn SessionValidator>,
        chat: Arc<ChatService>,
    ) -> Self {
        let connection = ConnectionSettings::from(&config.realtime);
        Self {
            config,
            connection,
            authority,
            validator,
            chat,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("authority", &self.authority)
            .field("chat", &self.chat)
            .field("connection", &self.connection)
            .finish_non_exhaustive()
    }
}
