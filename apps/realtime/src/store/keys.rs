//! Cache key builders, one per key family.
//!
//! Room membership hashes use a single family for both team codes and
//! channel ids: game start migrates the fields from `channel:{teamCode}`
//! to `channel:{channelId}` and deletes the former.

pub fn user(user_id: i64) -> String {
    format!("user:{user_id}")
}

pub fn members(room_id: &str) -> String {
    format!("channel:{room_id}")
}

pub fn player(channel_id: &str, user_id: i64) -> String {
    format!("player:{channel_id}:{user_id}")
}

pub fn inventory(channel_id: &str, user_id: i64) -> String {
    format!("inventory:{channel_id}:{user_id}")
}

pub fn lab_elements(channel_id: &str) -> String {
    format!("lab:{channel_id}")
}

pub fn lab_compounds(channel_id: &str) -> String {
    format!("compound:{channel_id}")
}

pub fn lab_level(channel_id: &str) -> String {
    format!("labLevel:{channel_id}")
}

pub fn current_map(channel_id: &str) -> String {
    format!("currentMap:{channel_id}")
}
