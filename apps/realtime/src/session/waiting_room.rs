//! Waiting-room lifecycle: opening/joining a room and leaving it.

use wayfarer_common::team_code;

use crate::error::{ErrorCode, GameError};
use crate::gateway::envelope::{
    CastingType, CreateWaitingRoomPayload, Envelope, EventName, LeaveWaitingRoomPayload,
};
use crate::gateway::registry::ConnectionHandle;
use crate::AppState;

/// Slot assigned to every member while the room is still waiting.
const WAITING_SLOT: i64 = 0;

/// Register the connection and record the user in the room. Repeated calls
/// with the same team code refresh membership, so the operation is
/// idempotent per user.
pub async fn create_waiting_room(
    state: AppState,
    conn: ConnectionHandle,
    payload: CreateWaitingRoomPayload,
) -> Result<(), GameError> {
    let team_code = match payload.team_code {
        Some(code) if !code.is_empty() => code,
        _ => team_code::generate(),
    };
    let user_id = payload.user.user_id;
    tracing::info!(%team_code, user_id, "joining waiting room");

    state.registry.register(user_id, conn);
    state.stores.users.save(&payload.user, &team_code, 0).await?;
    state.stores.members.add(&team_code, user_id, WAITING_SLOT).await?;

    let data = serde_json::json!({ "teamCode": team_code, "userId": user_id });
    state.dispatcher.unicast(
        user_id,
        &Envelope::success(EventName::CREATE_WAITING_ROOM, CastingType::Unicast, data),
    );
    Ok(())
}

/// A leader leaving tears the whole room down; a member leaving only
/// removes themselves. An unknown team code fails back to the requester
/// alone.
pub async fn leave_waiting_room(
    state: AppState,
    _conn: ConnectionHandle,
    payload: LeaveWaitingRoomPayload,
) -> Result<(), GameError> {
    let team_code = payload.team_code.unwrap_or_default();
    tracing::info!(%team_code, user_id = payload.user_id, is_leader = payload.is_leader, "leaving waiting room");

    if team_code.is_empty() || !state.stores.members.exists(&team_code).await? {
        return Err(GameError::NotFound(ErrorCode::NotExistTeamcode));
    }

    if payload.is_leader {
        close_room(&state, &team_code).await
    } else {
        leave_room(&state, &team_code, payload.user_id).await
    }
}

async fn close_room(state: &AppState, team_code: &str) -> Result<(), GameError> {
    state
        .dispatcher
        .broadcast(
            team_code,
            &Envelope::notice(EventName::LEAVE_WAITING_ROOM, CastingType::Broadcast),
        )
        .await?;

    for user_id in state.stores.members.members(team_code).await? {
        state.stores.users.delete(user_id).await?;
    }
    state.stores.members.delete(team_code).await?;
    Ok(())
}

async fn leave_room(state: &AppState, team_code: &str, user_id: i64) -> Result<(), GameError> {
    let data = serde_json::json!({ "userId": user_id });
    state
        .dispatcher
        .broadcast(
            team_code,
            &Envelope::success(EventName::LEAVE_WAITING_ROOM, CastingType::Broadcast, data),
        )
        .await?;

    state.stores.users.delete(user_id).await?;
    state.stores.members.remove(team_code, user_id).await?;
    state.registry.remove(user_id);
    Ok(())
}
