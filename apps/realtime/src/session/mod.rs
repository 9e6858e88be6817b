//! Channel lifecycle, driven purely by inbound events.
//!
//! A room moves waiting room → starting → in game. While waiting, its
//! state is ephemeral and keyed by team code; `gameStart` migrates it to a
//! freshly allocated durable channel id and retires the code. Restart
//! re-enters an existing channel, it never transitions the channel itself.

pub mod ingame;
pub mod waiting_room;

/// Map assigned to a channel that has no recorded assignment.
pub const DEFAULT_MAP_ID: i64 = 1;

/// Inventory capacity a player starts a game with.
pub const INITIAL_INVENTORY_CAPACITY: i64 = 8;
