use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time;
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use wayfarer_realtime::config::Config;
use wayfarer_realtime::error::GameError;
use wayfarer_realtime::logic::RecipeResolver;
use wayfarer_realtime::store::cache::MemoryCache;
use wayfarer_realtime::store::documents::MemoryChannelStore;
use wayfarer_realtime::AppState;

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

use axum::extract::ws::Message as WsMessage;
use tokio::sync::mpsc;
use wayfarer_realtime::gateway::registry::ConnectionHandle;

/// Register a synthetic connection for a user; returns its outbound queue.
/// Used by tests that call handlers directly instead of over a socket.
pub fn attach_user(state: &AppState, user_id: i64) -> mpsc::UnboundedReceiver<WsMessage> {
    let (tx, rx) = mpsc::unbounded_channel();
    state.registry.register(user_id, ConnectionHandle::new(tx));
    rx
}

/// A connection handle that is not registered to any user.
pub fn loose_handle() -> (ConnectionHandle, mpsc::UnboundedReceiver<WsMessage>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ConnectionHandle::new(tx), rx)
}

/// Next envelope queued on a synthetic connection, skipping non-JSON frames.
pub fn next_envelope(rx: &mut mpsc::UnboundedReceiver<WsMessage>) -> Option<serde_json::Value> {
    while let Ok(message) = rx.try_recv() {
        if let WsMessage::Text(text) = message {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(text.as_str()) {
                if value.is_object() {
                    return Some(value);
                }
            }
        }
    }
    None
}

/// Canned recipe responses standing in for the logic service.
#[derive(Default)]
pub struct StubResolver {
    pub synthesis: HashMap<String, i64>,
    pub upgrade: HashMap<String, i64>,
    /// When set, every call fails like an unreachable service.
    pub unavailable: bool,
}

impl StubResolver {
    pub fn with_synthesis(materials: &[(&str, i64)]) -> Self {
        Self {
            synthesis: materials
                .iter()
                .map(|(key, count)| (key.to_string(), *count))
                .collect(),
            ..Self::default()
        }
    }

    pub fn with_upgrade(materials: &[(&str, i64)]) -> Self {
        Self {
            upgrade: materials
                .iter()
                .map(|(key, count)| (key.to_string(), *count))
                .collect(),
            ..Self::default()
        }
    }

    pub fn unreachable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl RecipeResolver for StubResolver {
    async fn synthesis_materials(
        &self,
        _item_category: &str,
        _item_id: i64,
    ) -> Result<HashMap<String, i64>, GameError> {
        if self.unavailable {
            return Err(GameError::External("stub logic service offline".into()));
        }
        Ok(self.synthesis.clone())
    }

    async fn upgrade_materials(
        &self,
        _lab_id: i64,
        _lab_level: i64,
    ) -> Result<HashMap<String, i64>, GameError> {
        if self.unavailable {
            return Err(GameError::External("stub logic service offline".into()));
        }
        Ok(self.upgrade.clone())
    }
}

pub fn test_config() -> Config {
    Config {
        port: 0,
        redis_url: None,
        mongo_url: None,
        mongo_db: "wayfarer-test".to_string(),
        logic_url: "http://127.0.0.1:9".to_string(),
        logic_timeout_ms: 250,
    }
}

/// In-memory AppState with a default (empty-recipe) resolver.
pub fn test_state() -> AppState {
    test_state_with(StubResolver::default())
}

pub fn test_state_with(resolver: StubResolver) -> AppState {
    AppState::new(
        test_config(),
        Arc::new(MemoryCache::new()),
        Arc::new(MemoryChannelStore::new()),
        Arc::new(resolver),
    )
}

/// Start an actual TCP server for WebSocket testing. The server runs in the
/// background; the returned state shares its stores and registry.
pub async fn start_ws_server(state: AppState) -> SocketAddr {
    let app = wayfarer_realtime::routes::router().with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

pub async fn connect(addr: SocketAddr) -> WsClient {
    let url = format!("ws://{addr}/gateway");
    let (ws_stream, _) = tokio_tungstenite::connect_async(&url)
        .await
        .expect("ws connect");
    ws_stream
}

pub async fn send_frame(ws: &mut WsClient, frame: serde_json::Value) {
    ws.send(tungstenite::Message::Text(frame.to_string().into()))
        .await
        .expect("send frame");
}

/// Read the next text frame, panicking after a timeout.
pub async fn recv_text(ws: &mut WsClient) -> String {
    let msg = time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("timeout waiting for frame")
        .expect("stream ended")
        .expect("ws read error");
    msg.into_text().expect("not text").to_string()
}

/// Read frames until an envelope (JSON object) arrives, skipping the
/// transport-level `"success"` ack tokens.
pub async fn recv_envelope(ws: &mut WsClient) -> serde_json::Value {
    loop {
        let text = recv_text(ws).await;
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) {
            if value.is_object() {
                return value;
            }
        }
    }
}

/// Read frames until an envelope for the given event arrives.
pub async fn recv_event(ws: &mut WsClient, event: &str) -> serde_json::Value {
    loop {
        let envelope = recv_envelope(ws).await;
        if envelope["event"] == event {
            return envelope;
        }
    }
}

/// True when no frame arrives within a short window.
pub async fn assert_silent(ws: &mut WsClient) {
    let result = time::timeout(Duration::from_millis(300), ws.next()).await;
    assert!(result.is_err(), "expected no frame, got {:?}", result);
}

/// Join a waiting room over the socket and return the (possibly generated)
/// team code.
pub async fn join_waiting_room(
    ws: &mut WsClient,
    team_code: Option<&str>,
    user_id: i64,
    nickname: &str,
) -> String {
    let mut frame = serde_json::json!({
        "type": "waitingRoomSession",
        "event": "createWaitingRoom",
        "userId": user_id,
        "nickname": nickname,
        "avatar": 1,
    });
    if let Some(code) = team_code {
        frame["teamCode"] = serde_json::Value::String(code.to_string());
    }
    send_frame(ws, frame).await;

    let envelope = recv_event(ws, "createWaitingRoom").await;
    assert_eq!(envelope["status"], "SUCCESS");
    envelope["data"]["teamCode"]
        .as_str()
        .expect("teamCode present")
        .to_string()
}
