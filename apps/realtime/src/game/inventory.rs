//! Inventory events.

use crate::error::{ErrorCode, GameError};
use crate::gateway::envelope::{CastingType, Envelope, EventName, UseItemPayload};
use crate::gateway::registry::ConnectionHandle;
use crate::store::repos::InventorySlot;
use crate::AppState;

/// Consume one unit from an inventory slot.
///
/// A slot that drains to zero is deleted, never stored as zero; the acting
/// user gets the updated slot either way.
pub async fn use_item(
    state: AppState,
    _conn: ConnectionHandle,
    payload: UseItemPayload,
) -> Result<(), GameError> {
    let UseItemPayload {
        channel_id,
        user_id,
        inventory_idx,
    } = payload;
    tracing::debug!(%channel_id, user_id, inventory_idx, "using inventory item");

    let capacity = state
        .stores
        .players
        .inventory_capacity(&channel_id, user_id)
        .await?;
    if inventory_idx < 0 || i64::from(inventory_idx) >= capacity {
        return Err(GameError::Validation(ErrorCode::OutOfRangeIndex));
    }

    let mut slot = state
        .stores
        .inventories
        .slot(&channel_id, user_id, inventory_idx)
        .await?
        .ok_or(GameError::NotFound(ErrorCode::EmptyInventory))?;

    slot.item_cnt -= 1;
    let response = if slot.item_cnt > 0 {
        state
            .stores
            .inventories
            .save(&channel_id, user_id, &slot)
            .await?;
        slot
    } else {
        state
            .stores
            .inventories
            .delete(&channel_id, user_id, inventory_idx)
            .await?;
        InventorySlot::empty(inventory_idx)
    };

    let data = serde_json::json!({
        "inventoryIdx": response.inventory_idx,
        "itemId": response.item_id,
        "itemCnt": response.item_cnt,
    });
    state.dispatcher.unicast(
        user_id,
        &Envelope::success(EventName::USE_ITEM, CastingType::Unicast, data),
    );
    Ok(())
}
