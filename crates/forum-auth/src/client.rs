//! HTTP client for a remote token authority.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use forum_core::config::AuthConfig;
use forum_core::error::{AppError, ErrorKind};
use forum_core::result::AppResult;
use forum_entity::session::SessionIdentity;
use forum_entity::token::TokenPair;

use crate::rpc::{
    ErrorBody, LOGIN_PATH, LOGOUT_PATH, LoginRequest, LogoutRequest, REFRESH_PATH,
    REGISTER_PATH, RefreshRequest, RegisterRequest, VALIDATE_PATH, ValidateRequest,
    ValidateResponse,
};
use crate::validator::SessionValidator;

/// Calls the session RPC of an authority running in another process.
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: Client,
    base_url: String,
}

impl AuthClient {
    /// Builds a client for the authority at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::with_source(ErrorKind::Configuration, "Invalid HTTP client", e))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Builds a client from `auth.remote_url`, or `None` when it is unset.
    pub fn from_config(config: &AuthConfig) -> AppResult<Option<Self>> {
        config
            .remote_url
            .as_deref()
            .map(|url| Self::new(url, Duration::from_secs(config.remote_timeout_seconds)))
            .transpose()
    }

    pub async fn register(&self, username: &str, password: &str) -> AppResult<()> {
        let body = RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.post::<_, serde_json::Value>(REGISTER_PATH, &body).await?;
        Ok(())
    }

    pub async fn login(&self, username: &str, password: &str) -> AppResult<TokenPair> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.post(LOGIN_PATH, &body).await
    }

    pub async fn refresh_tokens(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let body = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        self.post(REFRESH_PATH, &body).await
    }

    /// Returns the remote verdict as-is.
    pub async fn validate_token(&self, access_token: &str) -> AppResult<ValidateResponse> {
        let body = ValidateRequest {
            access_token: access_token.to_string(),
        };
        self.post(VALIDATE_PATH, &body).await
    }

    pub async fn logout(&self, refresh_token: &str) -> AppResult<()> {
        let body = LogoutRequest {
            refresh_token: refresh_token.to_string(),
        };
        self.post::<_, serde_json::Value>(LOGOUT_PATH, &body).await?;
        Ok(())
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Calling remote authority");

        let response = self.http.post(&url).json(body).send().await.map_err(|e| {
            warn!(url = %url, error = %e, "Remote authority unreachable");
            AppError::with_source(ErrorKind::ExternalService, "Auth service unreachable", e)
        })?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        response.json::<T>().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::ExternalService,
                "Malformed response from auth service",
                e,
            )
        })
    }
}

async fn error_from_response(response: Response) -> AppError {
    let status = response.status();
    match response.json::<ErrorBody>().await {
        Ok(body) => match ErrorKind::from_code(&body.error) {
            Some(kind) => AppError::new(kind, body.message),
            None => AppError::external_service(format!(
                "Auth service returned {status} with unknown code {}",
                body.error
            )),
        },
        Err(_) => AppError::external_service(format!("Auth service returned {status}")),
    }
}

#[async_trait]
impl SessionValidator for AuthClient {
    async fn validate(&self, access_token: &str) -> AppResult<SessionIdentity> {
        self.validate_token(access_token)
            .await?
            .into_identity()
            .ok_or_else(|| AppError::invalid_token("Token rejected by auth service"))
    }

    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        self.refresh_tokens(refresh_token).await
    }
}
