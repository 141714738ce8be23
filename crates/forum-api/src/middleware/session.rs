//! Session guard for protected routes.
//!
//! A valid bearer token admits the request. Otherwise, when the client sent
//! its refresh token in `X-Refresh-Token`, the pair is rotated, the request
//! proceeds under the new access token, and the new pair is returned in the
//! `New-Access-Token` / `New-Refresh-Token` response headers.

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use forum_core::error::AppError;
use forum_entity::token::TokenPair;

use crate::error::ApiError;
use crate::extractors::bearer_token;
use crate::state::AppState;

pub const REFRESH_TOKEN_HEADER: &str = "x-refresh-token";
pub const NEW_ACCESS_TOKEN_HEADER: &str = "new-access-token";
pub const NEW_REFRESH_TOKEN_HEADER: &str = "new-refresh-token";

fn refresh_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REFRESH_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
}

pub async fn session_guard(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let access = bearer_token(request.headers()).map(str::to_owned);
    let failure = match access {
        Some(token) => match state.validator.validate(&token).await {
            Ok(identity) => {
                request.extensions_mut().insert(identity);
                return Ok(next.run(request).await);
            }
            Err(e) => e,
        },
        None => AppError::unauthorized("Missing Authorization header"),
    };

    let Some(raw_refresh) = refresh_token(request.headers()) else {
        return Err(failure.into());
    };

    debug!("Access token rejected; rotating refresh token");
    let pair = state.validator.refresh(&raw_refresh).await?;
    let identity = state.validator.validate(&pair.access_token).await?;
    request.extensions_mut().insert(identity);

    let mut response = next.run(request).await;
    attach_pair(response.headers_mut(), &pair)?;
    Ok(response)
}

fn attach_pair(headers: &mut HeaderMap, pair: &TokenPair) -> Result<(), AppError> {
    let access = HeaderValue::from_str(&pair.access_token)
        .map_err(|_| AppError::internal("Unencodable access token"))?;
    let refresh = HeaderValue::from_str(&pair.refresh_token)
        .map_err(|_| AppError::internal("Unencodable refresh token"))?;
    headers.insert(NEW_ACCESS_TOKEN_HEADER, access);
    headers.insert(NEW_REFRESH_TOKEN_HEADER, refresh);
    Ok(())
}
