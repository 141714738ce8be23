//! Session RPC handlers: register, login, refresh, validate, logout.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::debug;

use forum_auth::rpc::{
    LoginRequest, LogoutRequest, RefreshRequest, RegisterRequest, ValidateRequest,
    ValidateResponse,
};
use forum_entity::token::TokenPair;
use forum_entity::user::UserRole;

use crate::dto::SuccessResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/auth/register
///
/// Anonymous self-registration; the account always gets the `user` role.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<SuccessResponse>), ApiError> {
    state
        .authority
        .register(&req.username, &req.password, Some(UserRole::User))
        .await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::ok())))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let pair = state.authority.login(&req.username, &req.password).await?;
    Ok(Json(pair))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let pair = state.authority.refresh(&req.refresh_token).await?;
    Ok(Json(pair))
}

/// POST /api/auth/validate
///
/// Answers 200 either way; a rejected token yields `{ "valid": false }`.
pub async fn validate(
    State(state): State<AppState>,
    Json(req): Json<ValidateRequest>,
) -> Json<ValidateResponse> {
    match state.authority.validate_token(&req.access_token) {
        Ok(identity) => Json(ValidateResponse::valid(identity)),
        Err(e) => {
            debug!(error = %e, "Token rejected");
            Json(ValidateResponse::invalid())
        }
    }
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    Json(req): Json<LogoutRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.authority.logout(&req.refresh_token).await?;
    Ok(Json(SuccessResponse::ok()))
}
