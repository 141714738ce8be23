//! Forum server: token authority, session RPC and realtime chat.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at, timeout};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt};

use forum_api::{AppState, build_app};
use forum_auth::{
    AuthClient, MemoryCredentialStore, RefreshTokenStore, SessionValidator, TokenAuthority,
    UserStore,
};
use forum_core::config::AppConfig;
use forum_database::DatabasePool;
use forum_database::repositories::message::MessageRepository;
use forum_database::repositories::refresh_token::RefreshTokenRepository;
use forum_database::repositories::user::UserRepository;
use forum_realtime::{
    ChatService, Hub, MemoryMessageStore, MessageStore, SweepSettings, spawn_sweeper,
};

#[derive(Debug, Parser)]
#[command(name = "forum-server", version, about = "Forum token authority and realtime chat")]
struct Cli {
    /// Configuration overlay to load from `config/{env}.toml`.
    #[arg(long, default_value = "development")]
    env: String,

    /// Apply database migrations and exit.
    #[arg(long)]
    migrate_only: bool,

    /// Keep users, tokens and messages in memory instead of PostgreSQL.
    #[arg(long, conflicts_with = "migrate_only")]
    memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(&cli.env).context("Failed to load configuration")?;

    init_logging(&config);

    if let Err(e) = run(cli, config).await {
        tracing::error!(error = %e, "Server error");
        return Err(e);
    }
    Ok(())
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Persistence backends selected at startup.
struct Backends {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn RefreshTokenStore>,
    messages: Arc<dyn MessageStore>,
    pool: Option<DatabasePool>,
}

async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    tracing::info!(env = %cli.env, "Starting forum server v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Storage backends ─────────────────────────────────
    let backends = if cli.memory {
        tracing::warn!("Using in-memory stores; nothing survives a restart");
        let credentials = Arc::new(MemoryCredentialStore::new());
        Backends {
            users: credentials.clone(),
            tokens: credentials,
            messages: Arc::new(MemoryMessageStore::new()),
            pool: None,
        }
    } else {
        tracing::info!("Connecting to database...");
        let pool = DatabasePool::connect(&config.database).await?;

        tracing::info!("Running database migrations...");
        forum_database::migration::run_migrations(pool.pool()).await?;

        if cli.migrate_only {
            tracing::info!("Migrations applied; exiting");
            pool.close().await;
            return Ok(());
        }

        Backends {
            users: Arc::new(UserRepository::new(pool.pool().clone())),
            tokens: Arc::new(RefreshTokenRepository::new(pool.pool().clone())),
            messages: Arc::new(MessageRepository::new(pool.pool().clone())),
            pool: Some(pool),
        }
    };

    // ── Step 2: Token authority and session validator ────────────
    let authority = Arc::new(TokenAuthority::new(
        &config.auth,
        backends.users,
        backends.tokens,
    )?);

    let validator: Arc<dyn SessionValidator> = match AuthClient::from_config(&config.auth)? {
        Some(client) => {
            tracing::info!(
                url = config.auth.remote_url.as_deref().unwrap_or_default(),
                "Validating sessions against remote authority"
            );
            Arc::new(client)
        }
        None => authority.clone() as Arc<dyn SessionValidator>,
    };

    // ── Step 3: Realtime hub and chat ────────────────────────────
    let (hub, hub_task) = Hub::spawn(config.realtime.hub_command_buffer);
    let chat = Arc::new(ChatService::new(
        hub.clone(),
        backends.messages,
        config.realtime.max_message_size,
    ));

    // ── Step 4: Background sweeps ────────────────────────────────
    let cancel = CancellationToken::new();
    let sweep = SweepSettings::from(&config.realtime);
    let sweeper = spawn_sweeper(chat.clone(), sweep, cancel.clone());
    let purger = spawn_token_purge(authority.clone(), sweep.every, cancel.clone());

    // ── Step 5: HTTP server ──────────────────────────────────────
    let config = Arc::new(config);
    let app = build_app(AppState::new(config.clone(), authority, validator, chat));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(addr = %addr, "Forum server listening");

    // ── Step 6: Graceful shutdown ────────────────────────────────
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shutting down background tasks...");
    cancel.cancel();
    hub.shutdown().await;

    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let drained = timeout(grace, async {
        let _ = sweeper.await;
        let _ = purger.await;
        let _ = hub_task.await;
    })
    .await;
    if drained.is_err() {
        tracing::warn!("Background tasks did not stop within the grace period");
    }

    if let Some(pool) = backends.pool {
        pool.close().await;
    }

    tracing::info!("Forum server shut down gracefully");
    Ok(())
}

/// Reaps expired refresh tokens on a fixed interval.
fn spawn_token_purge(
    authority: Arc<TokenAuthority>,
    every: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + every, every);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    match authority.purge_expired_tokens().await {
                        Ok(0) => {}
                        Ok(purged) => tracing::info!(purged, "Purged expired refresh tokens"),
                        Err(e) => tracing::warn!(error = %e, "Refresh token purge failed"),
                    }
                }
            }
        }
    })
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
