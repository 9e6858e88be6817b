//! Inbound frame parsing and (type, event) dispatch.

use std::future::Future;

use axum::extract::ws::Message;
use serde::de::DeserializeOwned;

use super::envelope::{CastingType, Envelope, EventName, FrameType, InboundFrame, ACK_TOKEN};
use super::registry::ConnectionHandle;
use crate::error::GameError;
use crate::game::{inventory, laboratory};
use crate::session::{ingame, waiting_room};
use crate::AppState;

/// Parse one raw text frame and dispatch it to the matching handler.
///
/// Malformed frames and unrecognized (type, event) pairs are logged and
/// dropped; the connection stays open either way. A recognized dispatch is
/// acknowledged with the transport-level `"success"` token before the
/// handler's own unicast/broadcast lands.
pub fn dispatch(state: &AppState, conn: &ConnectionHandle, raw: &str) {
    let frame: InboundFrame = match serde_json::from_str(raw) {
        Ok(frame) => frame,
        Err(err) => {
            tracing::warn!(%err, "dropping malformed frame");
            return;
        }
    };

    if route(state, conn, &frame) {
        conn.send(Message::Text(ACK_TOKEN.into()));
    } else {
        tracing::debug!(
            frame_type = %frame.frame_type,
            event = %frame.event,
            "ignoring unrecognized frame"
        );
    }
}

/// Returns true when the frame was handed to a handler.
fn route(state: &AppState, conn: &ConnectionHandle, frame: &InboundFrame) -> bool {
    match (frame.frame_type.as_str(), frame.event.as_str()) {
        (FrameType::WAITING_ROOM_SESSION, EventName::CREATE_WAITING_ROOM) => spawn_handler(
            state,
            conn,
            frame,
            EventName::CREATE_WAITING_ROOM,
            waiting_room::create_waiting_room,
        ),
        (FrameType::INGAME_SESSION, EventName::GAME_START) => {
            spawn_handler(state, conn, frame, EventName::GAME_START, ingame::game_start)
        }
        // Channel-scoped game events are routed by event name alone.
        (_, EventName::USE_ITEM) => {
            spawn_handler(state, conn, frame, EventName::USE_ITEM, inventory::use_item)
        }
        (_, EventName::SYNTHESIZE) => {
            spawn_handler(state, conn, frame, EventName::SYNTHESIZE, laboratory::synthesize)
        }
        (_, EventName::UPGRADE) => {
            spawn_handler(state, conn, frame, EventName::UPGRADE, laboratory::upgrade)
        }
        (_, EventName::RESTART_GAME) => {
            spawn_handler(state, conn, frame, EventName::RESTART_GAME, ingame::restart_game)
        }
        (_, EventName::LEAVE_WAITING_ROOM) => spawn_handler(
            state,
            conn,
            frame,
            EventName::LEAVE_WAITING_ROOM,
            waiting_room::leave_waiting_room,
        ),
        _ => false,
    }
}

/// Deserialize the event payload and run the handler in its own task so the
/// read loop never blocks on store or compute I/O.
fn spawn_handler<P, F, Fut>(
    state: &AppState,
    conn: &ConnectionHandle,
    frame: &InboundFrame,
    event: &'static str,
    handler: F,
) -> bool
where
    P: DeserializeOwned + Send + 'static,
    F: FnOnce(AppState, ConnectionHandle, P) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), GameError>> + Send + 'static,
{
    let payload: P = match serde_json::from_value(frame.rest.clone()) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::warn!(%err, event, "dropping frame with missing or invalid fields");
            return false;
        }
    };

    let state = state.clone();
    let conn = conn.clone();
    tokio::spawn(async move {
        if let Err(error) = handler(state.clone(), conn.clone(), payload).await {
            fail_requester(&state, &conn, event, error);
        }
    });
    true
}

/// Handler-boundary error policy: domain and upstream failures become one
/// FAIL envelope unicast to the requester only. Nothing is broadcast and
/// the connection stays open.
fn fail_requester(state: &AppState, conn: &ConnectionHandle, event: &str, error: GameError) {
    match &error {
        GameError::Validation(_) | GameError::NotFound(_) => {
            tracing::debug!(event, %error, "handler rejected event");
        }
        GameError::External(detail) => {
            tracing::error!(event, %detail, "logic service call failed");
        }
        GameError::Store(detail) => {
            tracing::error!(event, %detail, "state store failure");
        }
        GameError::Protocol(detail) => {
            tracing::warn!(event, %detail, "protocol error after dispatch");
        }
    }

    if let Some(code) = error.code() {
        state
            .dispatcher
            .send_to(conn, &Envelope::fail(event, CastingType::Unicast, code));
    }
}
