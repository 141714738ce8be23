//! Integration tests for the session RPC.

use axum::http::StatusCode;
use serde_json::json;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_register_login_validate() {
    let app = TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/api/auth/register",
            Some(json!({ "username": "alice", "password": "pw1" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body, json!({ "success": true }));

    let pair = app.login("alice", "pw1").await;
    assert!(!pair.access_token.is_empty());
    assert!(!pair.refresh_token.is_empty());
    assert!(pair.access_expires_at < pair.refresh_expires_at);

    let response = app
        .request(
            "POST",
            "/api/auth/validate",
            Some(json!({ "access_token": pair.access_token })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["valid"], true);
    assert_eq!(response.body["username"], "alice");
    assert_eq!(response.body["role"], "user");
    assert_eq!(response.body["user_id"], 1);
}

#[tokio::test]
async fn test_duplicate_register_conflicts() {
    let app = TestApp::new().await;
    app.register("alice", "pw1").await;

    let response = app
        .request(
            "POST",
            "/api/auth/register",
            Some(json!({ "username": "alice", "password": "other" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["error"], "ALREADY_EXISTS");
}

#[tokio::test]
async fn test_self_registration_cannot_pick_role() {
    let app = TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/api/auth/register",
            Some(json!({ "username": "mallory", "password": "pw1", "role": "admin" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let pair = app.login("mallory", "pw1").await;
    let response = app
        .request(
            "POST",
            "/api/auth/validate",
            Some(json!({ "access_token": pair.access_token })),
            None,
        )
        .await;
    assert_eq!(response.body["valid"], true);
    assert_eq!(response.body["role"], "user");
}

#[tokio::test]
async fn test_register_rejects_bad_username() {
    let app = TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/api/auth/register",
            Some(json!({ "username": "a b", "password": "pw1" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION");
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = TestApp::new().await;
    app.register("alice", "pw1").await;

    let wrong_password = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "username": "alice", "password": "nope" })),
            None,
        )
        .await;
    let unknown_user = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "username": "mallory", "password": "nope" })),
            None,
        )
        .await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body, unknown_user.body);
    assert_eq!(wrong_password.body["error"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_refresh_rotates_once() {
    let app = TestApp::new().await;
    app.register("alice", "pw1").await;
    let pair = app.login("alice", "pw1").await;

    let rotated = app
        .request(
            "POST",
            "/api/auth/refresh",
            Some(json!({ "refresh_token": pair.refresh_token })),
            None,
        )
        .await;
    assert_eq!(rotated.status, StatusCode::OK);
    assert_ne!(rotated.body["refresh_token"], json!(pair.refresh_token));

    let replay = app
        .request(
            "POST",
            "/api/auth/refresh",
            Some(json!({ "refresh_token": pair.refresh_token })),
            None,
        )
        .await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);
    assert_eq!(replay.body["error"], "TOKEN_NOT_FOUND");
    assert_eq!(app.credentials.refresh_token_count().await, 1);
}

#[tokio::test]
async fn test_validate_rejects_garbage_without_identity() {
    let app = TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/api/auth/validate",
            Some(json!({ "access_token": "not.a.jwt" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({ "valid": false }));
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let app = TestApp::new().await;
    app.register("alice", "pw1").await;
    let pair = app.login("alice", "pw1").await;

    for _ in 0..2 {
        let response = app
            .request(
                "POST",
                "/api/auth/logout",
                Some(json!({ "refresh_token": pair.refresh_token })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, json!({ "success": true }));
    }

    let response = app
        .request(
            "POST",
            "/api/auth/refresh",
            Some(json!({ "refresh_token": pair.refresh_token })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/api/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["subscribers"], 0);
}
