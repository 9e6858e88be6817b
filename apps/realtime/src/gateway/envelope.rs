//! Wire-format envelopes and event payloads for both directions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ErrorCode;
use crate::store::repos::UserProfile;

/// Transport-level ack token echoed after every recognized dispatch,
/// independent of the asynchronous business outcome.
pub const ACK_TOKEN: &str = "success";

// ---------------------------------------------------------------------------
// Outbound envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CastingType {
    #[serde(rename = "UNICAST")]
    Unicast,
    #[serde(rename = "BROADCAST")]
    Broadcast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "FAIL")]
    Fail,
}

/// A message sent from the server to one or more clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub event: String,
    pub casting_type: CastingType,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Envelope {
    pub fn success(event: &str, casting_type: CastingType, data: Value) -> Self {
        Self {
            event: event.to_string(),
            casting_type,
            status: Status::Success,
            error_code: None,
            message: None,
            data: Some(data),
        }
    }

    /// A SUCCESS envelope with no payload (pure notification).
    pub fn notice(event: &str, casting_type: CastingType) -> Self {
        Self {
            event: event.to_string(),
            casting_type,
            status: Status::Success,
            error_code: None,
            message: None,
            data: None,
        }
    }

    pub fn fail(event: &str, casting_type: CastingType, code: ErrorCode) -> Self {
        Self {
            event: event.to_string(),
            casting_type,
            status: Status::Fail,
            error_code: Some(code.as_str().to_string()),
            message: Some(code.message().to_string()),
            data: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Inbound frame
// ---------------------------------------------------------------------------

/// A message received from a client. Event-specific fields stay in `rest`
/// until the matching handler deserializes them.
#[derive(Debug, Deserialize)]
pub struct InboundFrame {
    #[serde(rename = "type")]
    pub frame_type: String,
    pub event: String,
    #[serde(flatten)]
    pub rest: Value,
}

/// Frame `type` values carrying session-scoped events.
pub struct FrameType;

impl FrameType {
    pub const WAITING_ROOM_SESSION: &'static str = "waitingRoomSession";
    pub const INGAME_SESSION: &'static str = "ingameSession";
}

/// Event names, inbound and outbound.
pub struct EventName;

impl EventName {
    pub const CREATE_WAITING_ROOM: &'static str = "createWaitingRoom";
    pub const LEAVE_WAITING_ROOM: &'static str = "leaveWaitingRoom";
    pub const GAME_START: &'static str = "gameStart";
    pub const RESTART_GAME: &'static str = "restartGame";
    pub const USE_ITEM: &'static str = "useItemInInventory";
    pub const SYNTHESIZE: &'static str = "synthesize";
    pub const UPGRADE: &'static str = "upgrade";
}

// ---------------------------------------------------------------------------
// Event payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWaitingRoomPayload {
    /// Join an existing room, or omit to open a new one.
    #[serde(default)]
    pub team_code: Option<String>,
    #[serde(flatten)]
    pub user: UserProfile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveWaitingRoomPayload {
    #[serde(default)]
    pub team_code: Option<String>,
    pub user_id: i64,
    pub is_leader: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStartPayload {
    pub team_code: String,
    #[serde(default)]
    pub channel_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestartGamePayload {
    pub channel_id: String,
    #[serde(flatten)]
    pub user: UserProfile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UseItemPayload {
    pub channel_id: String,
    pub user_id: i64,
    pub inventory_idx: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizePayload {
    pub channel_id: String,
    pub user_id: i64,
    pub item_category: String,
    pub item_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradePayload {
    pub channel_id: String,
    pub user_id: i64,
    pub lab_id: i64,
}
