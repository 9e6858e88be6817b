//! Narrow repositories over the cache — the one state adapter every
//! handler goes through.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::cache::CacheStore;
use super::keys;
use crate::error::GameError;

/// Identity fields carried by session events and stored per user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: i64,
    pub nickname: String,
    pub avatar: i32,
}

/// One inventory slot. A slot with count 0 is deleted, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventorySlot {
    pub inventory_idx: i32,
    pub item_id: Option<i64>,
    pub item_cnt: i64,
}

impl InventorySlot {
    /// The representation unicast for a slot that was just drained.
    pub fn empty(inventory_idx: i32) -> Self {
        Self {
            inventory_idx,
            item_id: None,
            item_cnt: 0,
        }
    }

    fn encode(&self) -> String {
        format!("{}:{}", self.item_id.unwrap_or(0), self.item_cnt)
    }

    fn decode(inventory_idx: i32, raw: &str) -> Option<Self> {
        let (item_id, item_cnt) = raw.split_once(':')?;
        Some(Self {
            inventory_idx,
            item_id: Some(item_id.parse().ok()?),
            item_cnt: item_cnt.parse().ok()?,
        })
    }
}

/// All repositories bundled for composition into `AppState`.
#[derive(Clone)]
pub struct GameStores {
    pub users: UserRepository,
    pub members: MembershipRepository,
    pub players: PlayerRepository,
    pub inventories: InventoryRepository,
    pub laboratory: LaboratoryRepository,
    pub maps: MapRepository,
}

impl GameStores {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self {
            users: UserRepository::new(cache.clone()),
            members: MembershipRepository::new(cache.clone()),
            players: PlayerRepository::new(cache.clone()),
            inventories: InventoryRepository::new(cache.clone()),
            laboratory: LaboratoryRepository::new(cache.clone()),
            maps: MapRepository::new(cache),
        }
    }
}

// ---------------------------------------------------------------------------
// User records
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct UserRepository {
    cache: Arc<dyn CacheStore>,
}

impl UserRepository {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self { cache }
    }

    pub async fn save(
        &self,
        profile: &UserProfile,
        room_id: &str,
        map_id: i64,
    ) -> Result<(), GameError> {
        let key = keys::user(profile.user_id);
        self.cache.hset(&key, "nickname", &profile.nickname).await?;
        self.cache
            .hset(&key, "avatar", &profile.avatar.to_string())
            .await?;
        self.cache.hset(&key, "channelId", room_id).await?;
        self.cache.hset(&key, "mapId", &map_id.to_string()).await?;
        Ok(())
    }

    /// Repoint an existing record at a new room without touching identity
    /// fields. Used when a waiting room becomes a channel.
    pub async fn update_room(
        &self,
        user_id: i64,
        room_id: &str,
        map_id: i64,
    ) -> Result<(), GameError> {
        let key = keys::user(user_id);
        self.cache.hset(&key, "channelId", room_id).await?;
        self.cache.hset(&key, "mapId", &map_id.to_string()).await?;
        Ok(())
    }

    pub async fn delete(&self, user_id: i64) -> Result<(), GameError> {
        self.cache.del(&keys::user(user_id)).await
    }

    pub async fn find(&self, user_id: i64) -> Result<HashMap<String, String>, GameError> {
        self.cache.hgetall(&keys::user(user_id)).await
    }
}

// ---------------------------------------------------------------------------
// Room membership (team codes and channel ids share one hash family)
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct MembershipRepository {
    cache: Arc<dyn CacheStore>,
}

impl MembershipRepository {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self { cache }
    }

    pub async fn add(&self, room_id: &str, user_id: i64, slot: i64) -> Result<(), GameError> {
        self.cache
            .hset(&keys::members(room_id), &user_id.to_string(), &slot.to_string())
            .await
    }

    pub async fn remove(&self, room_id: &str, user_id: i64) -> Result<bool, GameError> {
        self.cache
            .hdel(&keys::members(room_id), &user_id.to_string())
            .await
    }

    /// The member set as it exists right now.
    pub async fn members(&self, room_id: &str) -> Result<Vec<i64>, GameError> {
        let entries = self.cache.hgetall(&keys::members(room_id)).await?;
        Ok(entries.keys().filter_map(|k| k.parse().ok()).collect())
    }

    /// Members with their slot values, for migration at game start.
    pub async fn entries(&self, room_id: &str) -> Result<Vec<(i64, i64)>, GameError> {
        let entries = self.cache.hgetall(&keys::members(room_id)).await?;
        Ok(entries
            .into_iter()
            .filter_map(|(user, slot)| Some((user.parse().ok()?, slot.parse().unwrap_or(0))))
            .collect())
    }

    pub async fn exists(&self, room_id: &str) -> Result<bool, GameError> {
        self.cache.exists(&keys::members(room_id)).await
    }

    pub async fn delete(&self, room_id: &str) -> Result<(), GameError> {
        self.cache.del(&keys::members(room_id)).await
    }
}

// ---------------------------------------------------------------------------
// Per-player in-game state
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PlayerRepository {
    cache: Arc<dyn CacheStore>,
}

impl PlayerRepository {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self { cache }
    }

    /// Seed a fresh player record: inventory capacity and spawn position.
    pub async fn seed(
        &self,
        channel_id: &str,
        user_id: i64,
        inventory_capacity: i64,
    ) -> Result<(), GameError> {
        let key = keys::player(channel_id, user_id);
        self.cache
            .hset(&key, "inventoryCnt", &inventory_capacity.to_string())
            .await?;
        self.cache.hset(&key, "posX", "0").await?;
        self.cache.hset(&key, "posY", "0").await?;
        Ok(())
    }

    /// The player's inventory capacity; 0 when the record is missing.
    pub async fn inventory_capacity(
        &self,
        channel_id: &str,
        user_id: i64,
    ) -> Result<i64, GameError> {
        let raw = self
            .cache
            .hget(&keys::player(channel_id, user_id), "inventoryCnt")
            .await?;
        Ok(raw.and_then(|v| v.parse().ok()).unwrap_or(0))
    }
}

// ---------------------------------------------------------------------------
// Inventories
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct InventoryRepository {
    cache: Arc<dyn CacheStore>,
}

impl InventoryRepository {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self { cache }
    }

    pub async fn slot(
        &self,
        channel_id: &str,
        user_id: i64,
        inventory_idx: i32,
    ) -> Result<Option<InventorySlot>, GameError> {
        let raw = self
            .cache
            .hget(&keys::inventory(channel_id, user_id), &inventory_idx.to_string())
            .await?;
        Ok(raw.and_then(|v| InventorySlot::decode(inventory_idx, &v)))
    }

    pub async fn save(
        &self,
        channel_id: &str,
        user_id: i64,
        slot: &InventorySlot,
    ) -> Result<(), GameError> {
        self.cache
            .hset(
                &keys::inventory(channel_id, user_id),
                &slot.inventory_idx.to_string(),
                &slot.encode(),
            )
            .await
    }

    pub async fn delete(
        &self,
        channel_id: &str,
        user_id: i64,
        inventory_idx: i32,
    ) -> Result<bool, GameError> {
        self.cache
            .hdel(&keys::inventory(channel_id, user_id), &inventory_idx.to_string())
            .await
    }
}

// ---------------------------------------------------------------------------
// Laboratory: elements, compounds, level
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct LaboratoryRepository {
    cache: Arc<dyn CacheStore>,
}

impl LaboratoryRepository {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self { cache }
    }

    pub async fn material_count(&self, channel_id: &str, material: &str) -> Result<i64, GameError> {
        let raw = self
            .cache
            .hget(&keys::lab_elements(channel_id), material)
            .await?;
        Ok(raw.and_then(|v| v.parse().ok()).unwrap_or(0))
    }

    pub async fn add_material(
        &self,
        channel_id: &str,
        material: &str,
        count: i64,
    ) -> Result<i64, GameError> {
        self.cache
            .hincr_by(&keys::lab_elements(channel_id), material, count)
            .await
    }

    pub async fn consume(
        &self,
        channel_id: &str,
        material: &str,
        count: i64,
    ) -> Result<i64, GameError> {
        self.cache
            .hincr_by(&keys::lab_elements(channel_id), material, -count)
            .await
    }

    pub async fn add_compound(&self, channel_id: &str, item_id: i64) -> Result<(), GameError> {
        self.cache
            .hincr_by(&keys::lab_compounds(channel_id), &item_id.to_string(), 1)
            .await?;
        Ok(())
    }

    pub async fn elements(&self, channel_id: &str) -> Result<HashMap<String, i64>, GameError> {
        let raw = self.cache.hgetall(&keys::lab_elements(channel_id)).await?;
        Ok(raw
            .into_iter()
            .filter_map(|(material, count)| Some((material, count.parse().ok()?)))
            .collect())
    }

    pub async fn compounds(&self, channel_id: &str) -> Result<Vec<i64>, GameError> {
        let raw = self.cache.hgetall(&keys::lab_compounds(channel_id)).await?;
        let mut ids: Vec<i64> = raw.keys().filter_map(|k| k.parse().ok()).collect();
        ids.sort_unstable();
        Ok(ids)
    }

    /// Current level for a lab; a lab that was never touched is level 0.
    pub async fn level(&self, channel_id: &str, lab_id: i64) -> Result<i64, GameError> {
        let raw = self
            .cache
            .hget(&keys::lab_level(channel_id), &lab_id.to_string())
            .await?;
        Ok(raw.and_then(|v| v.parse().ok()).unwrap_or(0))
    }

    pub async fn set_level(
        &self,
        channel_id: &str,
        lab_id: i64,
        level: i64,
    ) -> Result<(), GameError> {
        self.cache
            .hset(&keys::lab_level(channel_id), &lab_id.to_string(), &level.to_string())
            .await
    }

    /// Increment the lab level by exactly one; returns the new level.
    pub async fn raise_level(&self, channel_id: &str, lab_id: i64) -> Result<i64, GameError> {
        self.cache
            .hincr_by(&keys::lab_level(channel_id), &lab_id.to_string(), 1)
            .await
    }
}

// ---------------------------------------------------------------------------
// Map assignment
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct MapRepository {
    cache: Arc<dyn CacheStore>,
}

impl MapRepository {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self { cache }
    }

    pub async fn current(&self, channel_id: &str) -> Result<Option<i64>, GameError> {
        let raw = self
            .cache
            .hget(&keys::current_map(channel_id), "mapId")
            .await?;
        Ok(raw.and_then(|v| v.parse().ok()))
    }

    pub async fn assign(&self, channel_id: &str, map_id: i64) -> Result<(), GameError> {
        self.cache
            .hset(&keys::current_map(channel_id), "mapId", &map_id.to_string())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::cache::MemoryCache;

    fn stores() -> GameStores {
        GameStores::new(Arc::new(MemoryCache::new()))
    }

    #[test]
    fn slot_encoding_round_trips() {
        let slot = InventorySlot {
            inventory_idx: 3,
            item_id: Some(42),
            item_cnt: 7,
        };
        assert_eq!(slot.encode(), "42:7");
        assert_eq!(InventorySlot::decode(3, "42:7").unwrap(), slot);
        assert!(InventorySlot::decode(3, "garbage").is_none());
    }

    #[tokio::test]
    async fn membership_add_remove_and_entries() {
        let stores = stores();
        stores.members.add("QWERTY", 10, 0).await.unwrap();
        stores.members.add("QWERTY", 11, 2).await.unwrap();

        let mut members = stores.members.members("QWERTY").await.unwrap();
        members.sort_unstable();
        assert_eq!(members, vec![10, 11]);

        let mut entries = stores.members.entries("QWERTY").await.unwrap();
        entries.sort_unstable();
        assert_eq!(entries, vec![(10, 0), (11, 2)]);

        assert!(stores.members.remove("QWERTY", 10).await.unwrap());
        assert!(stores.members.exists("QWERTY").await.unwrap());
        assert!(stores.members.remove("QWERTY", 11).await.unwrap());
        assert!(!stores.members.exists("QWERTY").await.unwrap());
    }

    #[tokio::test]
    async fn user_record_save_and_repoint() {
        let stores = stores();
        let profile = UserProfile {
            user_id: 7,
            nickname: "scout".to_string(),
            avatar: 2,
        };
        stores.users.save(&profile, "QWERTY", 0).await.unwrap();

        let record = stores.users.find(7).await.unwrap();
        assert_eq!(record["nickname"], "scout");
        assert_eq!(record["channelId"], "QWERTY");

        stores.users.update_room(7, "ch_abc", 1).await.unwrap();
        let record = stores.users.find(7).await.unwrap();
        assert_eq!(record["nickname"], "scout");
        assert_eq!(record["channelId"], "ch_abc");
        assert_eq!(record["mapId"], "1");
    }

    #[tokio::test]
    async fn laboratory_materials_and_level() {
        let stores = stores();
        stores.laboratory.add_material("ch_1", "element:3", 5).await.unwrap();
        assert_eq!(
            stores.laboratory.material_count("ch_1", "element:3").await.unwrap(),
            5
        );
        assert_eq!(
            stores.laboratory.material_count("ch_1", "element:9").await.unwrap(),
            0
        );

        stores.laboratory.consume("ch_1", "element:3", 2).await.unwrap();
        assert_eq!(
            stores.laboratory.material_count("ch_1", "element:3").await.unwrap(),
            3
        );

        assert_eq!(stores.laboratory.level("ch_1", 0).await.unwrap(), 0);
        assert_eq!(stores.laboratory.raise_level("ch_1", 0).await.unwrap(), 1);
        assert_eq!(stores.laboratory.level("ch_1", 0).await.unwrap(), 1);

        stores.laboratory.add_compound("ch_1", 101).await.unwrap();
        stores.laboratory.add_compound("ch_1", 100).await.unwrap();
        assert_eq!(stores.laboratory.compounds("ch_1").await.unwrap(), vec![100, 101]);
    }

    #[tokio::test]
    async fn map_assignment_defaults_to_none() {
        let stores = stores();
        assert!(stores.maps.current("ch_1").await.unwrap().is_none());
        stores.maps.assign("ch_1", 4).await.unwrap();
        assert_eq!(stores.maps.current("ch_1").await.unwrap(), Some(4));
    }
}
