//! Shared test helpers for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use futures::StreamExt;
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tower::ServiceExt;

use forum_api::{AppState, build_app};
use forum_auth::{MemoryCredentialStore, TokenAuthority};
use forum_core::config::AppConfig;
use forum_entity::token::TokenPair;
use forum_realtime::{ChatService, Hub, MemoryMessageStore};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Configuration with a test secret and cheap password hashing.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = "integration-test-secret-0123456789abcdef".to_string();
    config.auth.argon2.memory_kib = 1024;
    config.auth.argon2.iterations = 1;
    config
}

/// Test application context backed by in-memory stores.
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    pub state: AppState,
    pub credentials: Arc<MemoryCredentialStore>,
}

impl TestApp {
    pub async fn new() -> Self {
        let config = Arc::new(test_config());
        let credentials = Arc::new(MemoryCredentialStore::new());

        let authority = Arc::new(
            TokenAuthority::new(&config.auth, credentials.clone(), credentials.clone())
                .expect("Failed to build authority"),
        );

        let (hub, _hub_task) = Hub::spawn(config.realtime.hub_command_buffer);
        let chat = Arc::new(ChatService::new(
            hub,
            Arc::new(MemoryMessageStore::new()),
            config.realtime.max_message_size,
        ));

        let state = AppState::new(config, authority.clone(), authority, chat);
        Self {
            router: build_app(state.clone()),
            state,
            credentials,
        }
    }

    /// Register a user through the API
    pub async fn register(&self, username: &str, password: &str) {
        let response = self
            .request(
                "POST",
                "/api/auth/register",
                Some(json!({ "username": username, "password": password })),
                None,
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "Register failed: {:?}",
            response.body
        );
    }

    /// Login and return the issued pair
    pub async fn login(&self, username: &str, password: &str) -> TokenPair {
        let response = self
            .request(
                "POST",
                "/api/auth/login",
                Some(json!({ "username": username, "password": password })),
                None,
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::OK,
            "Login failed: {:?}",
            response.body
        );
        serde_json::from_value(response.body).expect("Malformed token pair")
    }

    /// Make an HTTP request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        let body = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();
        self.send(req.body(Body::from(body)).expect("Failed to build request"))
            .await
    }

    /// Send a prepared request to the test app
    pub async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");
        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Serve the app on an ephemeral port
    pub async fn spawn_server(&self) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("No local address");
        let app = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server failed");
        });
        addr
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Parsed JSON body
    pub body: Value,
}

/// Next JSON text frame, skipping control frames.
pub async fn next_json(client: &mut Client) -> Value {
    try_next_json(client, Duration::from_secs(5))
        .await
        .expect("No frame received in time")
}

/// Next JSON text frame if one arrives within `wait`.
pub async fn try_next_json(client: &mut Client, wait: Duration) -> Option<Value> {
    tokio::time::timeout(wait, async {
        loop {
            let frame = client
                .next()
                .await
                .expect("Connection ended")
                .expect("Read failed");
            if let Message::Text(text) = frame {
                return serde_json::from_str(text.as_str()).expect("Frame is not JSON");
            }
        }
    })
    .await
    .ok()
}
