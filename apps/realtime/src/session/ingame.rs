//! In-game lifecycle: starting a channel from a waiting room and
//! re-entering one after a disconnect.

use crate::error::{ErrorCode, GameError};
use crate::gateway::envelope::{
    CastingType, Envelope, EventName, GameStartPayload, RestartGamePayload,
};
use crate::gateway::registry::ConnectionHandle;
use crate::store::documents::ChannelDoc;
use crate::AppState;

use super::{DEFAULT_MAP_ID, INITIAL_INVENTORY_CAPACITY};

/// Promote a waiting room into a durable channel.
///
/// Every step is sequenced and checked; the ephemeral team record is only
/// cleared once all members have been migrated, so a failure part-way never
/// strands players between a dead team code and a half-built channel.
pub async fn game_start(
    state: AppState,
    _conn: ConnectionHandle,
    payload: GameStartPayload,
) -> Result<(), GameError> {
    let team_code = payload.team_code;
    tracing::info!(%team_code, "starting game");

    // Tell the waiting room the game is starting before the record moves.
    state
        .dispatcher
        .broadcast(
            &team_code,
            &Envelope::notice(EventName::GAME_START, CastingType::Broadcast),
        )
        .await?;

    let entries = state.stores.members.entries(&team_code).await?;
    if entries.is_empty() {
        return Err(GameError::NotFound(ErrorCode::NotExistTeamcode));
    }

    let members: Vec<i64> = entries.iter().map(|(user_id, _)| *user_id).collect();
    let name = payload.channel_name.unwrap_or_else(|| team_code.clone());
    let channel_id = state
        .channels
        .insert(ChannelDoc::new(&name, members.clone()))
        .await?;
    tracing::info!(%team_code, %channel_id, players = members.len(), "allocated channel");

    for (user_id, slot) in &entries {
        state.stores.members.add(&channel_id, *user_id, *slot).await?;
        state
            .stores
            .users
            .update_room(*user_id, &channel_id, DEFAULT_MAP_ID)
            .await?;
        state
            .stores
            .players
            .seed(&channel_id, *user_id, INITIAL_INVENTORY_CAPACITY)
            .await?;
    }
    state.stores.maps.assign(&channel_id, DEFAULT_MAP_ID).await?;
    state.stores.members.delete(&team_code).await?;

    let data = serde_json::json!({ "channelId": channel_id });
    state
        .dispatcher
        .broadcast(
            &channel_id,
            &Envelope::success(EventName::GAME_START, CastingType::Broadcast, data),
        )
        .await?;
    Ok(())
}

/// Re-seed a player's state and connection binding on an existing channel.
///
/// The channel's recorded map is reused when present; otherwise the default
/// map is assigned and persisted. Either path ends with the map state
/// unicast to the reconnecting user.
pub async fn restart_game(
    state: AppState,
    conn: ConnectionHandle,
    payload: RestartGamePayload,
) -> Result<(), GameError> {
    let channel_id = payload.channel_id;
    let user_id = payload.user.user_id;
    tracing::info!(%channel_id, user_id, "re-entering channel");

    state.registry.register(user_id, conn);

    let map_id = match state.stores.maps.current(&channel_id).await? {
        Some(map_id) => map_id,
        None => {
            state.stores.maps.assign(&channel_id, DEFAULT_MAP_ID).await?;
            DEFAULT_MAP_ID
        }
    };

    state.stores.users.save(&payload.user, &channel_id, map_id).await?;
    state.stores.members.add(&channel_id, user_id, 0).await?;
    state
        .stores
        .players
        .seed(&channel_id, user_id, INITIAL_INVENTORY_CAPACITY)
        .await?;

    let data = serde_json::json!({ "mapId": map_id });
    state.dispatcher.unicast(
        user_id,
        &Envelope::success(EventName::RESTART_GAME, CastingType::Unicast, data),
    );
    Ok(())
}
