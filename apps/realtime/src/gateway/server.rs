//! WebSocket upgrade handler and per-connection read loop.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use super::registry::ConnectionHandle;
use super::router;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/gateway", get(ws_upgrade))
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

/// One task per socket: a writer pump drains the connection's outbound
/// queue while this loop feeds inbound frames to the message router.
async fn handle_connection(socket: WebSocket, state: AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let handle = ConnectionHandle::new(tx);
    let connection_id = handle.id;

    tracing::debug!(connection_id, "gateway connection opened");

    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if ws_tx.send(message).await.is_err() {
                break;
            }
        }
    });

    while let Some(received) = ws_rx.next().await {
        let message = match received {
            Ok(message) => message,
            Err(err) => {
                tracing::debug!(?err, connection_id, "ws read error");
                break;
            }
        };

        match message {
            Message::Text(text) => router::dispatch(&state, &handle, text.as_str()),
            Message::Ping(_) | Message::Pong(_) => continue,
            Message::Close(_) => break,
            _ => continue,
        }
    }

    // Transport closed: deregister. In-flight handler work for this user
    // completes and its unicast becomes a no-op once the entry is gone.
    state.registry.remove_by_connection(connection_id);
    writer.abort();

    tracing::debug!(connection_id, "gateway connection closed");
}
