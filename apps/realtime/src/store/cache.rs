//! Abstraction over the hash-oriented cache holding ephemeral game state.
//!
//! Backed by Redis in production and an in-memory map in tests. Every
//! operation is atomic at the single-key level only; callers that need
//! multi-key consistency bring their own coordination.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::error::GameError;

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, GameError>;
    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), GameError>;
    /// Returns true when the field existed and was removed.
    async fn hdel(&self, key: &str, field: &str) -> Result<bool, GameError>;
    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, GameError>;
    /// Atomic per-field increment; negative deltas decrement.
    async fn hincr_by(&self, key: &str, field: &str, delta: i64) -> Result<i64, GameError>;
    async fn del(&self, key: &str) -> Result<(), GameError>;
    async fn exists(&self, key: &str) -> Result<bool, GameError>;
}

// ---------------------------------------------------------------------------
// In-memory implementation (tests / no REDIS_URL)
// ---------------------------------------------------------------------------

pub struct MemoryCache {
    data: Mutex<HashMap<String, HashMap<String, String>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, GameError> {
        Ok(self
            .data
            .lock()
            .get(key)
            .and_then(|hash| hash.get(field))
            .cloned())
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), GameError> {
        self.data
            .lock()
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<bool, GameError> {
        let mut data = self.data.lock();
        let Some(hash) = data.get_mut(key) else {
            return Ok(false);
        };
        let removed = hash.remove(field).is_some();
        // Redis drops a hash key once its last field is gone; mirror that so
        // `exists` agrees between backends.
        if hash.is_empty() {
            data.remove(key);
        }
        Ok(removed)
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, GameError> {
        Ok(self.data.lock().get(key).cloned().unwrap_or_default())
    }

    async fn hincr_by(&self, key: &str, field: &str, delta: i64) -> Result<i64, GameError> {
        let mut data = self.data.lock();
        let hash = data.entry(key.to_string()).or_default();
        let current = hash
            .get(field)
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(0);
        let next = current + delta;
        hash.insert(field.to_string(), next.to_string());
        Ok(next)
    }

    async fn del(&self, key: &str) -> Result<(), GameError> {
        self.data.lock().remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, GameError> {
        Ok(self.data.lock().contains_key(key))
    }
}

// ---------------------------------------------------------------------------
// Redis implementation
// ---------------------------------------------------------------------------

pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(url: &str) -> Result<Self, GameError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, GameError> {
        let mut conn = self.conn.clone();
        Ok(conn.hget(key, field).await?)
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), GameError> {
        let mut conn = self.conn.clone();
        let _: () = conn.hset(key, field, value).await?;
        Ok(())
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<bool, GameError> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.hdel(key, field).await?;
        Ok(removed > 0)
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, GameError> {
        let mut conn = self.conn.clone();
        Ok(conn.hgetall(key).await?)
    }

    async fn hincr_by(&self, key: &str, field: &str, delta: i64) -> Result<i64, GameError> {
        let mut conn = self.conn.clone();
        Ok(conn.hincr(key, field, delta).await?)
    }

    async fn del(&self, key: &str) -> Result<(), GameError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, GameError> {
        let mut conn = self.conn.clone();
        Ok(conn.exists(key).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hset_and_hget_round_trip() {
        let cache = MemoryCache::new();
        cache.hset("k", "f", "v").await.unwrap();
        assert_eq!(cache.hget("k", "f").await.unwrap().as_deref(), Some("v"));
        assert!(cache.hget("k", "other").await.unwrap().is_none());
        assert!(cache.hget("missing", "f").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn hdel_reports_presence_and_drops_empty_hashes() {
        let cache = MemoryCache::new();
        cache.hset("k", "f", "v").await.unwrap();

        assert!(cache.hdel("k", "f").await.unwrap());
        assert!(!cache.hdel("k", "f").await.unwrap());
        // Last field removed — the key itself is gone.
        assert!(!cache.exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn hincr_by_starts_from_zero_and_goes_negative() {
        let cache = MemoryCache::new();
        assert_eq!(cache.hincr_by("k", "n", 3).await.unwrap(), 3);
        assert_eq!(cache.hincr_by("k", "n", -5).await.unwrap(), -2);
        assert_eq!(cache.hget("k", "n").await.unwrap().as_deref(), Some("-2"));
    }

    #[tokio::test]
    async fn hgetall_returns_full_hash() {
        let cache = MemoryCache::new();
        cache.hset("k", "a", "1").await.unwrap();
        cache.hset("k", "b", "2").await.unwrap();

        let all = cache.hgetall("k").await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all["a"], "1");
        assert_eq!(all["b"], "2");
    }

    #[tokio::test]
    async fn del_removes_whole_key() {
        let cache = MemoryCache::new();
        cache.hset("k", "a", "1").await.unwrap();
        cache.del("k").await.unwrap();
        assert!(!cache.exists("k").await.unwrap());
    }
}
