//! Real-time chat hub configuration.

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) hub configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Bounded outbound queue length per subscriber. A subscriber whose
    /// queue is full when a broadcast arrives is dropped.
    #[serde(default = "default_send_queue")]
    pub send_queue_capacity: usize,
    /// Buffer of the hub command channel.
    #[serde(default = "default_hub_buffer")]
    pub hub_command_buffer: usize,
    /// Interval between server pings in seconds.
    #[serde(default = "default_ping_interval")]
    pub ping_interval_seconds: u64,
    /// Time without any inbound frame after which a connection is dropped.
    #[serde(default = "default_pong_timeout")]
    pub pong_timeout_seconds: u64,
    /// Per-frame write deadline in seconds.
    #[serde(default = "default_write_timeout")]
    pub write_timeout_seconds: u64,
    /// Maximum inbound message size in bytes.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
    /// Chat messages older than this are purged by the sweeper.
    #[serde(default = "default_retention_hours")]
    pub retention_hours: u64,
    /// How often the sweeper runs, in seconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            send_queue_capacity: default_send_queue(),
            hub_command_buffer: default_hub_buffer(),
            ping_interval_seconds: default_ping_interval(),
            pong_timeout_seconds: default_pong_timeout(),
            write_timeout_seconds: default_write_timeout(),
            max_message_size: default_max_message_size(),
            retention_hours: default_retention_hours(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

fn default_send_queue() -> usize {
    256
}

fn default_hub_buffer() -> usize {
    1024
}

// 9/10 of the pong timeout.
fn default_ping_interval() -> u64 {
    54
}

fn default_pong_timeout() -> u64 {
    60
}

fn default_write_timeout() -> u64 {
    10
}

fn default_max_message_size() -> usize {
    512
}

fn default_retention_hours() -> u64 {
    24
}

fn default_sweep_interval() -> u64 {
    3600
}
