//! Unicast/broadcast dispatch of envelopes to connected players.
//!
//! Delivery is best-effort, fire-and-lose: an offline recipient or a dead
//! socket drops the message without failing the caller. Broadcast resolves
//! the member set once, at call time.

use std::sync::Arc;

use axum::extract::ws::Message;

use super::envelope::Envelope;
use super::registry::{ConnectionHandle, ConnectionRegistry};
use crate::error::GameError;
use crate::store::repos::MembershipRepository;

#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ConnectionRegistry>,
    members: MembershipRepository,
}

impl Dispatcher {
    pub fn new(registry: Arc<ConnectionRegistry>, members: MembershipRepository) -> Self {
        Self { registry, members }
    }

    /// Send to one user. Offline recipients are dropped, not queued.
    pub fn unicast(&self, user_id: i64, envelope: &Envelope) {
        let Some(handle) = self.registry.lookup(user_id) else {
            tracing::debug!(user_id, event = %envelope.event, "unicast dropped: recipient offline");
            return;
        };
        self.send_to(&handle, envelope);
    }

    /// Send straight to a socket, bypassing the registry. Used for failures
    /// addressed to requesters that are not (or no longer) registered.
    pub fn send_to(&self, handle: &ConnectionHandle, envelope: &Envelope) {
        let text = match serde_json::to_string(envelope) {
            Ok(text) => text,
            Err(err) => {
                tracing::error!(?err, event = %envelope.event, "envelope serialization failed");
                return;
            }
        };
        if !handle.send(Message::Text(text.into())) {
            tracing::debug!(
                connection_id = handle.id,
                event = %envelope.event,
                "send dropped: socket closed"
            );
        }
    }

    /// Send to every current member of a room (team code or channel id).
    /// Per-recipient failures do not fail the batch; the call completes once
    /// every send has been attempted.
    pub async fn broadcast(&self, room_id: &str, envelope: &Envelope) -> Result<(), GameError> {
        let members = self.members.members(room_id).await?;
        tracing::debug!(room_id, event = %envelope.event, recipients = members.len(), "broadcasting");
        for user_id in members {
            self.unicast(user_id, envelope);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::envelope::{CastingType, EventName};
    use crate::store::cache::MemoryCache;
    use tokio::sync::mpsc;

    fn dispatcher() -> (Dispatcher, Arc<ConnectionRegistry>, MembershipRepository) {
        let registry = Arc::new(ConnectionRegistry::new());
        let members = MembershipRepository::new(Arc::new(MemoryCache::new()));
        (
            Dispatcher::new(registry.clone(), members.clone()),
            registry,
            members,
        )
    }

    fn connect(registry: &ConnectionRegistry, user_id: i64) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        registry.register(user_id, ConnectionHandle::new(tx));
        rx
    }

    fn received_event(rx: &mut mpsc::UnboundedReceiver<Message>) -> Option<String> {
        match rx.try_recv().ok()? {
            Message::Text(text) => {
                let value: serde_json::Value = serde_json::from_str(text.as_str()).ok()?;
                Some(value["event"].as_str()?.to_string())
            }
            _ => None,
        }
    }

    #[tokio::test]
    async fn unicast_reaches_registered_user() {
        let (dispatcher, registry, _) = dispatcher();
        let mut rx = connect(&registry, 1);

        let envelope = Envelope::notice(EventName::GAME_START, CastingType::Unicast);
        dispatcher.unicast(1, &envelope);

        assert_eq!(received_event(&mut rx).as_deref(), Some("gameStart"));
    }

    #[tokio::test]
    async fn unicast_to_offline_user_is_dropped() {
        let (dispatcher, _, _) = dispatcher();
        // No registration — must not panic or error.
        dispatcher.unicast(42, &Envelope::notice(EventName::GAME_START, CastingType::Unicast));
    }

    #[tokio::test]
    async fn broadcast_hits_exactly_the_member_set() {
        let (dispatcher, registry, members) = dispatcher();
        let mut member_a = connect(&registry, 1);
        let mut member_b = connect(&registry, 2);
        let mut outsider = connect(&registry, 3);

        members.add("ROOM42", 1, 0).await.unwrap();
        members.add("ROOM42", 2, 0).await.unwrap();

        let envelope = Envelope::notice(EventName::LEAVE_WAITING_ROOM, CastingType::Broadcast);
        dispatcher.broadcast("ROOM42", &envelope).await.unwrap();

        assert!(received_event(&mut member_a).is_some());
        assert!(received_event(&mut member_b).is_some());
        assert!(received_event(&mut outsider).is_none());
    }

    #[tokio::test]
    async fn broadcast_survives_offline_members() {
        let (dispatcher, registry, members) = dispatcher();
        let mut online = connect(&registry, 1);

        members.add("ROOM42", 1, 0).await.unwrap();
        members.add("ROOM42", 2, 0).await.unwrap(); // never connected

        let envelope = Envelope::notice(EventName::GAME_START, CastingType::Broadcast);
        dispatcher.broadcast("ROOM42", &envelope).await.unwrap();

        assert!(received_event(&mut online).is_some());
    }
}
