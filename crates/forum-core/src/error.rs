//! Unified application error types for the forum services.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. The [`ErrorKind`] codes double as the
//! wire representation of errors on the session RPC surface, so they are
//! stable and round-trip through [`ErrorKind::from_code`].

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Unknown user or wrong password. Never says which.
    InvalidCredentials,
    /// A user with the requested name already exists.
    AlreadyExists,
    /// No live refresh token matches the presented value.
    TokenNotFound,
    /// The refresh token existed but its expiry has passed.
    TokenExpired,
    /// The access token is malformed, badly signed, or expired.
    InvalidToken,
    /// The token owner has no stable identity.
    InvalidUser,
    /// Missing or rejected credentials at the transport boundary.
    Unauthorized,
    /// Input validation failed.
    Validation,
    /// The requested resource was not found.
    NotFound,
    /// An internal server error occurred.
    Internal,
    /// A database error occurred.
    Database,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// A remote service could not be reached or answered garbage.
    ExternalService,
}

impl ErrorKind {
    /// Stable string code for this kind.
    pub fn as_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::TokenNotFound => "TOKEN_NOT_FOUND",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::InvalidUser => "INVALID_USER",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Validation => "VALIDATION",
            Self::NotFound => "NOT_FOUND",
            Self::Internal => "INTERNAL",
            Self::Database => "DATABASE",
            Self::Configuration => "CONFIGURATION",
            Self::Serialization => "SERIALIZATION",
            Self::ExternalService => "EXTERNAL_SERVICE",
        }
    }

    /// Parses a code produced by [`ErrorKind::as_code`].
    pub fn from_code(code: &str) -> Option<Self> {
        let kind = match code {
            "INVALID_CREDENTIALS" => Self::InvalidCredentials,
            "ALREADY_EXISTS" => Self::AlreadyExists,
            "TOKEN_NOT_FOUND" => Self::TokenNotFound,
            "TOKEN_EXPIRED" => Self::TokenExpired,
            "INVALID_TOKEN" => Self::InvalidToken,
            "INVALID_USER" => Self::InvalidUser,
            "UNAUTHORIZED" => Self::Unauthorized,
            "VALIDATION" => Self::Validation,
            "NOT_FOUND" => Self::NotFound,
            "INTERNAL" => Self::Internal,
            "DATABASE" => Self::Database,
            "CONFIGURATION" => Self::Configuration,
            "SERIALIZATION" => Self::Serialization,
            "EXTERNAL_SERVICE" => Self::ExternalService,
            _ => return None,
        };
        Some(kind)
    }

    /// Whether this kind describes a rejected credential rather than a
    /// failure of the service itself.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::TokenNotFound
                | Self::TokenExpired
                | Self::InvalidToken
                | Self::InvalidUser
                | Self::Unauthorized
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

/// The unified application error.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn invalid_credentials() -> Self {
        Self::new(ErrorKind::InvalidCredentials, "Invalid username or password")
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AlreadyExists, message)
    }

    pub fn token_not_found() -> Self {
        Self::new(ErrorKind::TokenNotFound, "Refresh token not found")
    }

    pub fn token_expired() -> Self {
        Self::new(ErrorKind::TokenExpired, "Refresh token has expired")
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidToken, message)
    }

    pub fn invalid_user(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidUser, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn external_service(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExternalService, message)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        let kinds = [
            ErrorKind::InvalidCredentials,
            ErrorKind::AlreadyExists,
            ErrorKind::TokenNotFound,
            ErrorKind::TokenExpired,
            ErrorKind::InvalidToken,
            ErrorKind::InvalidUser,
            ErrorKind::Unauthorized,
            ErrorKind::Internal,
        ];
        for kind in kinds {
            assert_eq!(ErrorKind::from_code(kind.as_code()), Some(kind));
        }
        assert_eq!(ErrorKind::from_code("BOGUS"), None);
    }

    #[test]
    fn test_display_includes_code() {
        let err = AppError::token_not_found();
        assert_eq!(err.to_string(), "TOKEN_NOT_FOUND: Refresh token not found");
    }

    #[test]
    fn test_clone_drops_source() {
        let io = std::io::Error::other("disk");
        let err = AppError::with_source(ErrorKind::Database, "write failed", io);
        assert!(std::error::Error::source(&err).is_some());
        let cloned = err.clone();
        assert_eq!(cloned.kind, ErrorKind::Database);
        assert!(std::error::Error::source(&cloned).is_none());
    }
}
