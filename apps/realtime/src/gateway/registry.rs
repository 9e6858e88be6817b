//! Connection registry: concurrent bidirectional mapping between users
//! and live sockets.

use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Handle used to push frames to one connected socket.
///
/// Cloning is cheap; the sender feeds the connection's writer task.
#[derive(Clone)]
pub struct ConnectionHandle {
    pub id: u64,
    tx: mpsc::UnboundedSender<Message>,
}

impl ConnectionHandle {
    pub fn new(tx: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            tx,
        }
    }

    /// Queue a frame for delivery. Returns false when the socket is gone.
    pub fn send(&self, message: Message) -> bool {
        self.tx.send(message).is_ok()
    }
}

/// User ⇄ connection mapping shared by every connection task.
///
/// `register` for an already-present user replaces the prior handle
/// (reconnect semantics) without notifying the replaced socket. Lookup
/// misses are not errors — the recipient is simply offline.
pub struct ConnectionRegistry {
    by_user: DashMap<i64, ConnectionHandle>,
    by_connection: DashMap<u64, i64>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            by_user: DashMap::new(),
            by_connection: DashMap::new(),
        }
    }

    pub fn register(&self, user_id: i64, handle: ConnectionHandle) {
        let connection_id = handle.id;
        self.by_connection.insert(connection_id, user_id);
        if let Some(previous) = self.by_user.insert(user_id, handle) {
            if previous.id != connection_id {
                self.by_connection.remove(&previous.id);
            }
        }
    }

    pub fn remove(&self, user_id: i64) {
        if let Some((_, handle)) = self.by_user.remove(&user_id) {
            self.by_connection.remove(&handle.id);
        }
    }

    /// Deregister on transport close. A connection that was already replaced
    /// by a reconnect leaves the newer registration untouched.
    pub fn remove_by_connection(&self, connection_id: u64) {
        if let Some((_, user_id)) = self.by_connection.remove(&connection_id) {
            self.by_user
                .remove_if(&user_id, |_, handle| handle.id == connection_id);
        }
    }

    pub fn lookup(&self, user_id: i64) -> Option<ConnectionHandle> {
        self.by_user.get(&user_id).map(|entry| entry.value().clone())
    }

    pub fn reverse_lookup(&self, connection_id: u64) -> Option<i64> {
        self.by_connection
            .get(&connection_id)
            .map(|entry| *entry.value())
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
