//! WebSocket subscription endpoint.
//!
//! Each connection is one subscriber. It receives a single `init` frame
//! with the full ledger, then every `log_event` and `ack` broadcast until
//! either side closes. The exchange is one-directional: anything the
//! viewer sends is read and discarded.

use crate::AppState;
use axum::{
    body::Bytes,
    extract::{
        ws::{Message, WebSocket},
        ConnectInfo, Extension, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use shepherd_fanout::Subscription;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// WebSocket handler: `GET /ws`.
pub async fn ws_handler(
    Extension(state): Extension<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    tracing::debug!(remote_addr = %addr, "websocket upgrade requested");
    ws.on_upgrade(move |socket| handle_socket(socket, state, addr))
}

/// Why a subscriber connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseReason {
    /// The viewer sent a close frame or its stream ended.
    PeerClosed,
    /// Reading from the viewer failed.
    ReceiveError,
    /// Writing to the viewer failed.
    SendError,
    /// The registry dropped this subscriber (slow consumer).
    Unregistered,
}

/// Drives one subscriber connection from attach to close.
async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>, addr: SocketAddr) {
    let Subscription { id, mut receiver } =
        match state.hub.attach(state.websocket.channel_capacity) {
            Ok(subscription) => subscription,
            Err(e) => {
                tracing::error!(remote_addr = %addr, "failed to attach subscriber: {}", e);
                let _ = socket.close().await;
                return;
            }
        };

    tracing::info!(subscriber_id = %id, remote_addr = %addr, "websocket subscriber connected");

    let (mut sender, mut inbound) = socket.split();
    let ping_interval = state.websocket.ping_interval();

    // Forward broadcast frames (init first) to the viewer.
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = ping_interval.map(ping_timer);
        loop {
            tokio::select! {
                frame = receiver.recv() => match frame {
                    Some(frame) => {
                        if sender.send(Message::Text(frame.into())).await.is_err() {
                            return CloseReason::SendError;
                        }
                    }
                    None => {
                        let _ = sender.send(Message::Close(None)).await;
                        return CloseReason::Unregistered;
                    }
                },
                () = next_tick(&mut heartbeat) => {
                    if sender.send(Message::Ping(Bytes::new())).await.is_err() {
                        return CloseReason::SendError;
                    }
                }
            }
        }
    });

    // Drain and discard whatever the viewer sends until it goes away.
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = inbound.next().await {
            match msg {
                Ok(Message::Close(_)) => return CloseReason::PeerClosed,
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!("websocket receive error: {}", e);
                    return CloseReason::ReceiveError;
                }
            }
        }
        CloseReason::PeerClosed
    });

    let reason = tokio::select! {
        res = &mut send_task => {
            recv_task.abort();
            res.unwrap_or(CloseReason::SendError)
        }
        res = &mut recv_task => {
            send_task.abort();
            res.unwrap_or(CloseReason::ReceiveError)
        }
    };

    state.hub.detach(id);
    tracing::info!(
        subscriber_id = %id,
        remote_addr = %addr,
        reason = ?reason,
        "websocket subscriber disconnected"
    );
}

fn ping_timer(period: Duration) -> Interval {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Resolves on the next heartbeat tick, or never when pings are disabled.
async fn next_tick(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
