//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use forum_auth::rpc::ErrorBody;
use forum_core::error::{AppError, ErrorKind};

/// HTTP-facing wrapper around [`AppError`].
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        self.0.kind
    }
}

/// Status code for an error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidCredentials
        | ErrorKind::TokenNotFound
        | ErrorKind::TokenExpired
        | ErrorKind::InvalidToken
        | ErrorKind::InvalidUser
        | ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::AlreadyExists => StatusCode::CONFLICT,
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Internal
        | ErrorKind::Database
        | ErrorKind::Configuration
        | ErrorKind::Serialization
        | ErrorKind::ExternalService => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = status_for(err.kind);

        let body = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(kind = err.kind.as_code(), error = %err, "Internal server error");
            ErrorBody {
                error: ErrorKind::Internal.as_code().to_string(),
                message: "Internal error".to_string(),
            }
        } else {
            ErrorBody {
                error: err.kind.as_code().to_string(),
                message: err.message,
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failures_are_401() {
        for kind in [
            ErrorKind::InvalidCredentials,
            ErrorKind::TokenNotFound,
            ErrorKind::TokenExpired,
            ErrorKind::InvalidToken,
            ErrorKind::InvalidUser,
        ] {
            assert_eq!(status_for(kind), StatusCode::UNAUTHORIZED);
        }
        assert_eq!(status_for(ErrorKind::AlreadyExists), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_internal_detail_is_not_exposed() {
        let response =
            ApiError(AppError::database("relation \"users\" does not exist")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "INTERNAL");
        assert_eq!(body.message, "Internal error");
    }
}
