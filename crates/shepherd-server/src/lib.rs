//! Shepherd server library logic.
//!
//! Exposes the HTTP and WebSocket surface over a single [`Hub`]:
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `POST /ingest` | Classify and store one raw line, broadcast it |
//! | `POST /acknowledge/{eventId}` | Mark an event handled, broadcast the ack |
//! | `GET /events` | Full ledger in ingestion order |
//! | `GET /ws` | Live stream: `init` snapshot, then broadcasts |
//! | `GET /health` | Liveness probe |

pub mod api;
pub mod api_events;
pub mod api_ws;
pub mod config;
pub mod hub;

pub use hub::{Hub, HubError};

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use config::WebSocketConfig;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Event ledger and live subscribers.
    pub hub: Hub,
    /// Per-connection settings for `/ws` subscribers.
    pub websocket: WebSocketConfig,
}

impl AppState {
    /// Creates state around an empty ledger.
    pub fn new(websocket: WebSocketConfig) -> Self {
        Self {
            hub: Hub::new(),
            websocket,
        }
    }
}

/// Maximum request body size (1 MiB). A single log line never needs more.
const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
///
/// `/ws` needs the peer address, so serve with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ingest", post(api::ingest_handler))
        .route(
            "/acknowledge/{eventId}",
            post(api_events::acknowledge_handler),
        )
        .route("/events", get(api_events::list_events_handler))
        .route("/ws", get(api_ws::ws_handler))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
