//! Shared helpers for server integration tests.
#![allow(dead_code)]

use futures_util::StreamExt;
use serde_json::Value;
use shepherd_server::config::WebSocketConfig;
use shepherd_server::{app, AppState};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long any single receive may take before a test fails.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Starts the app on an ephemeral port and returns its address and state.
pub async fn spawn_server() -> (SocketAddr, AppState) {
    spawn_server_with(WebSocketConfig::default()).await
}

pub async fn spawn_server_with(websocket: WebSocketConfig) -> (SocketAddr, AppState) {
    let state = AppState::new(websocket);
    let app = app(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    (addr, state)
}

/// Posts a raw line and returns the assigned event id.
pub async fn ingest(client: &reqwest::Client, addr: SocketAddr, raw: &str) -> String {
    let response = client
        .post(format!("http://{}/ingest", addr))
        .json(&serde_json::json!({ "raw": raw }))
        .send()
        .await
        .expect("ingest request failed");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("ingest body should be json");
    assert_eq!(body["ok"], true);
    body["id"].as_str().expect("missing id").to_string()
}

pub async fn acknowledge(client: &reqwest::Client, addr: SocketAddr, id: &str) -> Value {
    client
        .post(format!("http://{}/acknowledge/{}", addr, id))
        .send()
        .await
        .expect("acknowledge request failed")
        .json()
        .await
        .expect("acknowledge body should be json")
}

pub async fn list_events(client: &reqwest::Client, addr: SocketAddr) -> Vec<Value> {
    let body: Value = client
        .get(format!("http://{}/events", addr))
        .send()
        .await
        .expect("events request failed")
        .json()
        .await
        .expect("events body should be json");
    body["events"].as_array().expect("events array").clone()
}

pub async fn connect(addr: SocketAddr) -> WsStream {
    let (ws_stream, _) = connect_async(format!("ws://{}/ws", addr))
        .await
        .expect("failed to connect");
    ws_stream
}

/// Reads the next text frame as JSON, skipping control frames.
pub async fn next_json(ws: &mut WsStream) -> Value {
    loop {
        let frame = tokio::time::timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("timeout waiting for frame")
            .expect("connection closed")
            .expect("frame error");

        match frame {
            Message::Text(text) => {
                return serde_json::from_str(&text).expect("frame should be valid json")
            }
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("expected text frame, got: {:?}", other),
        }
    }
}

/// Polls until the registry holds `expected` subscribers.
pub async fn wait_for_subscribers(state: &AppState, expected: usize) {
    let registry = state.hub.registry();
    tokio::time::timeout(RECV_TIMEOUT, async {
        while registry.len() != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| {
        panic!(
            "expected {} subscribers, registry has {}",
            expected,
            registry.len()
        )
    });
}
