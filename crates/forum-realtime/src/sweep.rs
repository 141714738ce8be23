//! Periodic purge of old chat messages.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use forum_core::config::RealtimeConfig;
use forum_core::result::AppResult;

use crate::chat::ChatService;

/// Retention sweep settings.
#[derive(Debug, Clone, Copy)]
pub struct SweepSettings {
    pub retention: chrono::Duration,
    pub every: Duration,
}

impl From<&RealtimeConfig> for SweepSettings {
    fn from(config: &RealtimeConfig) -> Self {
        Self {
            retention: chrono::Duration::hours(config.retention_hours as i64),
            every: Duration::from_secs(config.sweep_interval_seconds),
        }
    }
}

/// Runs one sweep: purge then rebroadcast the list.
pub async fn sweep_once(chat: &ChatService, retention: chrono::Duration) -> AppResult<u64> {
    let cutoff = Utc::now() - retention;
    let purged = chat.purge_older_than(cutoff).await?;
    if purged > 0 {
        info!(purged, cutoff = %cutoff, "Purged old chat messages");
    }
    Ok(purged)
}

/// Spawns the sweeper. The first sweep runs one interval after start.
pub fn spawn_sweeper(
    chat: Arc<ChatService>,
    settings: SweepSettings,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + settings.every, settings.every);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = sweep_once(&chat, settings.retention).await {
                        warn!(error = %e, "Chat sweep failed");
                    }
                }
            }
        }
        info!("Chat sweeper stopped");
    })
}
