//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section and every field has a default, so an empty source yields a
//! runnable development configuration.

pub mod app;
pub mod auth;
pub mod database;
pub mod logging;
pub mod realtime;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::auth::{Argon2Config, AuthConfig};
pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;
pub use self::realtime::RealtimeConfig;

use crate::error::AppError;

/// Minimum accepted length of the token signing secret, in bytes.
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Upper bound of `auth.access_token_ttl_minutes` (one day).
pub const MAX_ACCESS_TOKEN_TTL_MINUTES: u64 = 24 * 60;

/// Upper bound of `auth.refresh_token_ttl_days`.
pub const MAX_REFRESH_TOKEN_TTL_DAYS: u64 = 365;

/// Upper bound of `realtime.retention_hours` (ten years).
pub const MAX_RETENTION_HOURS: u64 = 10 * 365 * 24;

/// Root application configuration.
///
/// Built once at startup and handed to every component by reference; no
/// component reloads configuration on its own.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Real-time WebSocket settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `config/default.toml`, an environment-specific overlay
    /// `config/{env}.toml` and environment variables prefixed with `FORUM_`
    /// (nested keys separated by `__`, e.g. `FORUM_AUTH__JWT_SECRET`).
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("FORUM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the services cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.auth.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(AppError::configuration(format!(
                "auth.jwt_secret must be at least {MIN_JWT_SECRET_LEN} bytes"
            )));
        }
        if self.auth.access_token_ttl_minutes == 0 || self.auth.refresh_token_ttl_days == 0 {
            return Err(AppError::configuration("token TTLs must be non-zero"));
        }
        if self.auth.access_token_ttl_minutes > MAX_ACCESS_TOKEN_TTL_MINUTES {
            return Err(AppError::configuration(format!(
                "auth.access_token_ttl_minutes must not exceed {MAX_ACCESS_TOKEN_TTL_MINUTES}"
            )));
        }
        if self.auth.refresh_token_ttl_days > MAX_REFRESH_TOKEN_TTL_DAYS {
            return Err(AppError::configuration(format!(
                "auth.refresh_token_ttl_days must not exceed {MAX_REFRESH_TOKEN_TTL_DAYS}"
            )));
        }
        let refresh_minutes = self
            .auth
            .refresh_token_ttl_days
            .checked_mul(24 * 60)
            .ok_or_else(|| AppError::configuration("auth.refresh_token_ttl_days is out of range"))?;
        if self.auth.access_token_ttl_minutes >= refresh_minutes {
            return Err(AppError::configuration(
                "access token TTL must be shorter than refresh token TTL",
            ));
        }

        let rt = &self.realtime;
        if rt.send_queue_capacity == 0 || rt.hub_command_buffer == 0 {
            return Err(AppError::configuration("realtime buffers must be non-zero"));
        }
        if rt.ping_interval_seconds == 0 || rt.ping_interval_seconds >= rt.pong_timeout_seconds {
            return Err(AppError::configuration(
                "realtime.ping_interval_seconds must be non-zero and below pong_timeout_seconds",
            ));
        }
        if rt.retention_hours > MAX_RETENTION_HOURS {
            return Err(AppError::configuration(format!(
                "realtime.retention_hours must not exceed {MAX_RETENTION_HOURS}"
            )));
        }
        if rt.sweep_interval_seconds == 0 {
            return Err(AppError::configuration(
                "realtime.sweep_interval_seconds must be non-zero",
            ));
        }

        if self.server.cors.allowed_origins.iter().any(|o| o == "*") {
            return Err(AppError::configuration(
                "server.cors.allowed_origins must list explicit origins",
            ));
        }
        Ok(())
    }
}
