//! Integration tests for the WebSocket upgrade and chat fan-out.

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::StatusCode;
use futures::SinkExt;
use serde_json::json;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use crate::helpers::{Client, TestApp, next_json, try_next_json};

async fn connect(addr: SocketAddr, token: &str) -> Client {
    let (client, _) = connect_async(format!("ws://{addr}/ws?token={token}"))
        .await
        .expect("Upgrade failed");
    client
}

async fn send_json(client: &mut Client, value: serde_json::Value) {
    client
        .send(Message::text(value.to_string()))
        .await
        .expect("Send failed");
}

fn rejection_status(result: Result<impl Sized, WsError>) -> StatusCode {
    match result {
        Err(WsError::Http(response)) => {
            StatusCode::from_u16(response.status().as_u16()).expect("Bad status")
        }
        Err(e) => panic!("Unexpected error: {e}"),
        Ok(_) => panic!("Upgrade unexpectedly accepted"),
    }
}

#[tokio::test]
async fn test_upgrade_requires_valid_token() {
    let app = TestApp::new().await;
    let addr = app.spawn_server().await;

    let missing = connect_async(format!("ws://{addr}/ws")).await;
    assert_eq!(rejection_status(missing), StatusCode::UNAUTHORIZED);

    let garbage = connect_async(format!("ws://{addr}/ws?token=garbage")).await;
    assert_eq!(rejection_status(garbage), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bearer_header_and_query_alias() {
    let app = TestApp::new().await;
    app.register("alice", "pw1").await;
    let pair = app.login("alice", "pw1").await;
    let addr = app.spawn_server().await;

    let mut req = format!("ws://{addr}/ws")
        .into_client_request()
        .expect("Bad request");
    req.headers_mut().insert(
        "Authorization",
        format!("Bearer {}", pair.access_token)
            .parse()
            .expect("Bad header"),
    );
    let (mut by_header, _) = connect_async(req).await.expect("Upgrade failed");
    assert_eq!(next_json(&mut by_header).await["type"], "auth");

    let (mut by_alias, _) = connect_async(format!(
        "ws://{addr}/ws?accessToken={}",
        pair.access_token
    ))
    .await
    .expect("Upgrade failed");
    assert_eq!(
        next_json(&mut by_alias).await,
        json!({ "type": "auth", "username": "alice" })
    );
}

#[tokio::test]
async fn test_create_is_broadcast_to_everyone() {
    let app = TestApp::new().await;
    app.register("alice", "pw1").await;
    app.register("bob", "pw2").await;
    let alice_pair = app.login("alice", "pw1").await;
    let bob_pair = app.login("bob", "pw2").await;
    let addr = app.spawn_server().await;

    let mut alice = connect(addr, &alice_pair.access_token).await;
    let mut bob = connect(addr, &bob_pair.access_token).await;
    assert_eq!(next_json(&mut alice).await["username"], "alice");
    assert_eq!(next_json(&mut bob).await["username"], "bob");

    send_json(
        &mut alice,
        json!({ "action": "create", "payload": { "text": "hello", "author": "mallory" } }),
    )
    .await;

    for client in [&mut alice, &mut bob] {
        let frame = next_json(client).await;
        assert_eq!(frame["type"], "broadcast");
        assert_eq!(frame["payload"].as_array().unwrap().len(), 1);
        assert_eq!(frame["payload"][0]["text"], "hello");
        assert_eq!(frame["payload"][0]["author"], "alice");
    }

    let response = app.request("GET", "/api/health", None, None).await;
    assert_eq!(response.body["subscribers"], 2);
}

#[tokio::test]
async fn test_list_and_errors_reach_only_the_sender() {
    let app = TestApp::new().await;
    app.register("alice", "pw1").await;
    app.register("bob", "pw2").await;
    let alice_pair = app.login("alice", "pw1").await;
    let bob_pair = app.login("bob", "pw2").await;
    let addr = app.spawn_server().await;

    let mut alice = connect(addr, &alice_pair.access_token).await;
    let mut bob = connect(addr, &bob_pair.access_token).await;
    next_json(&mut alice).await;
    next_json(&mut bob).await;

    send_json(&mut bob, json!({ "action": "get_all" })).await;
    let frame = next_json(&mut bob).await;
    assert_eq!(frame, json!({ "type": "broadcast", "payload": [] }));

    send_json(&mut bob, json!({ "action": "create", "payload": { "text": "" } })).await;
    let frame = next_json(&mut bob).await;
    assert_eq!(frame["type"], "error");
    assert_eq!(frame["code"], "VALIDATION");

    assert!(
        try_next_json(&mut alice, Duration::from_millis(300))
            .await
            .is_none()
    );
}

#[tokio::test]
async fn test_only_author_may_delete() {
    let app = TestApp::new().await;
    app.register("alice", "pw1").await;
    app.register("bob", "pw2").await;
    let alice_pair = app.login("alice", "pw1").await;
    let bob_pair = app.login("bob", "pw2").await;
    let addr = app.spawn_server().await;

    let mut alice = connect(addr, &alice_pair.access_token).await;
    let mut bob = connect(addr, &bob_pair.access_token).await;
    next_json(&mut alice).await;
    next_json(&mut bob).await;

    send_json(&mut alice, json!({ "action": "create", "payload": { "text": "mine" } })).await;
    let id = next_json(&mut alice).await["payload"][0]["id"].clone();
    next_json(&mut bob).await;

    send_json(&mut bob, json!({ "action": "delete", "payload": { "id": id } })).await;
    assert_eq!(next_json(&mut bob).await["code"], "UNAUTHORIZED");

    send_json(&mut alice, json!({ "action": "delete", "payload": { "id": id } })).await;
    for client in [&mut alice, &mut bob] {
        assert_eq!(
            next_json(client).await,
            json!({ "type": "broadcast", "payload": [] })
        );
    }
}
