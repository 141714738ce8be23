//! Integration tests for the session guard and CORS.

use axum::body::Body;
use axum::http::{Request, StatusCode};

use crate::helpers::TestApp;

fn messages_request(access: &str, refresh: Option<&str>) -> Request<Body> {
    let mut req = Request::builder()
        .method("GET")
        .uri("/api/messages")
        .header("Authorization", format!("Bearer {access}"));
    if let Some(refresh) = refresh {
        req = req.header("X-Refresh-Token", refresh);
    }
    req.body(Body::empty()).expect("Failed to build request")
}

#[tokio::test]
async fn test_messages_require_a_session() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/api/messages", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_messages_with_valid_token() {
    let app = TestApp::new().await;
    app.register("alice", "pw1").await;
    let pair = app.login("alice", "pw1").await;

    let response = app.send(messages_request(&pair.access_token, None)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, serde_json::json!([]));
    assert!(response.headers.get("new-access-token").is_none());
}

#[tokio::test]
async fn test_guard_refreshes_rejected_access_token() {
    let app = TestApp::new().await;
    app.register("alice", "pw1").await;
    let pair = app.login("alice", "pw1").await;

    let response = app
        .send(messages_request("stale.access.token", Some(&pair.refresh_token)))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let new_access = response
        .headers
        .get("new-access-token")
        .and_then(|v| v.to_str().ok())
        .expect("No new access token");
    let new_refresh = response
        .headers
        .get("new-refresh-token")
        .and_then(|v| v.to_str().ok())
        .expect("No new refresh token");
    assert_ne!(new_refresh, pair.refresh_token);

    // The new access token works on its own.
    let response = app.send(messages_request(new_access, None)).await;
    assert_eq!(response.status, StatusCode::OK);

    // The old refresh token was consumed by the rotation.
    let response = app
        .send(messages_request("stale.access.token", Some(&pair.refresh_token)))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "TOKEN_NOT_FOUND");
}

#[tokio::test]
async fn test_cors_allows_configured_origin_only() {
    let app = TestApp::new().await;

    let preflight = |origin: &str| {
        Request::builder()
            .method("OPTIONS")
            .uri("/api/messages")
            .header("Origin", origin)
            .header("Access-Control-Request-Method", "GET")
            .header("Access-Control-Request-Headers", "x-refresh-token")
            .body(Body::empty())
            .expect("Failed to build request")
    };

    let allowed = app.send(preflight("http://localhost:3000")).await;
    let header = |name: &str| {
        allowed
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };
    assert_eq!(
        header("access-control-allow-origin").as_deref(),
        Some("http://localhost:3000")
    );
    assert_eq!(
        header("access-control-allow-credentials").as_deref(),
        Some("true")
    );

    let denied = app.send(preflight("http://evil.example")).await;
    assert!(denied.headers.get("access-control-allow-origin").is_none());
}
