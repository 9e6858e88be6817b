//! Laboratory events: compound synthesis and lab upgrades.

use std::collections::HashMap;

use crate::error::{ErrorCode, GameError};
use crate::gateway::envelope::{CastingType, Envelope, EventName, SynthesizePayload, UpgradePayload};
use crate::gateway::registry::ConnectionHandle;
use crate::AppState;

/// Lab levels run `[0, MAX_LAB_LEVEL)`; a lab at the cap cannot upgrade.
const MAX_LAB_LEVEL: i64 = 3;

/// Synthesize a compound from the channel's stored elements.
///
/// The required materials come from the logic service. Any single
/// insufficiency rejects the whole request before anything is consumed.
pub async fn synthesize(
    state: AppState,
    _conn: ConnectionHandle,
    payload: SynthesizePayload,
) -> Result<(), GameError> {
    let SynthesizePayload {
        channel_id,
        user_id,
        item_category,
        item_id,
    } = payload;
    tracing::debug!(%channel_id, user_id, %item_category, item_id, "synthesizing compound");

    let required = state.logic.synthesis_materials(&item_category, item_id).await?;

    // The sufficiency check and the consume step below must not interleave
    // with another synthesis in the same channel.
    let lock = state.lab_locks.get(&channel_id);
    let _guard = lock.lock().await;

    check_materials(&state, &channel_id, &required).await?;
    for (material, count) in &required {
        state.stores.laboratory.consume(&channel_id, material, *count).await?;
    }
    state.stores.laboratory.add_compound(&channel_id, item_id).await?;

    let snapshot = laboratory_snapshot(&state, &channel_id).await?;
    state.dispatcher.unicast(
        user_id,
        &Envelope::success(EventName::SYNTHESIZE, CastingType::Unicast, snapshot),
    );
    Ok(())
}

/// Raise the lab level by one, consuming the upgrade materials.
pub async fn upgrade(
    state: AppState,
    _conn: ConnectionHandle,
    payload: UpgradePayload,
) -> Result<(), GameError> {
    let UpgradePayload {
        channel_id,
        user_id,
        lab_id,
    } = payload;
    tracing::debug!(%channel_id, user_id, lab_id, "upgrading laboratory");

    // Locked from the level read onward so two racing upgrades cannot both
    // pass the gate.
    let lock = state.lab_locks.get(&channel_id);
    let _guard = lock.lock().await;

    let level = state.stores.laboratory.level(&channel_id, lab_id).await?;
    if !(0..MAX_LAB_LEVEL).contains(&level) {
        return Err(GameError::Validation(ErrorCode::CannotUpdate));
    }

    let required = state.logic.upgrade_materials(lab_id, level).await?;

    check_materials(&state, &channel_id, &required).await?;
    for (material, count) in &required {
        state.stores.laboratory.consume(&channel_id, material, *count).await?;
    }
    let new_level = state.stores.laboratory.raise_level(&channel_id, lab_id).await?;

    let data = serde_json::json!({ "labId": lab_id, "labLevel": new_level });
    state.dispatcher.unicast(
        user_id,
        &Envelope::success(EventName::UPGRADE, CastingType::Unicast, data),
    );
    Ok(())
}

/// All-or-nothing sufficiency check; the first shortfall rejects the whole
/// request with `noItem` and nothing is mutated.
async fn check_materials(
    state: &AppState,
    channel_id: &str,
    required: &HashMap<String, i64>,
) -> Result<(), GameError> {
    for (material, count) in required {
        let stored = state.stores.laboratory.material_count(channel_id, material).await?;
        if stored < *count {
            tracing::debug!(%channel_id, %material, required = count, stored, "insufficient material");
            return Err(GameError::NotFound(ErrorCode::NoItem));
        }
    }
    Ok(())
}

/// The full elements + compounds view unicast after a successful synthesis.
async fn laboratory_snapshot(
    state: &AppState,
    channel_id: &str,
) -> Result<serde_json::Value, GameError> {
    let elements = state.stores.laboratory.elements(channel_id).await?;
    let compounds = state.stores.laboratory.compounds(channel_id).await?;
    Ok(serde_json::json!({ "element": elements, "compound": compounds }))
}
