//! Durable channel records in the document store.
//!
//! A channel document is written exactly once, at game start; the id it
//! carries is immutable for the life of the game.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::doc;
use mongodb::Collection;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::GameError;
use wayfarer_common::id;

/// A game channel, created when a waiting room starts its game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelDoc {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub members: Vec<i64>,
    pub created_at: DateTime<Utc>,
}

impl ChannelDoc {
    /// Allocate a fresh channel with a `ch_`-prefixed id. Team codes are
    /// never reused as channel ids.
    pub fn new(name: &str, members: Vec<i64>) -> Self {
        Self {
            id: id::prefixed_ulid(id::prefix::CHANNEL),
            name: name.to_string(),
            members,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait ChannelStore: Send + Sync {
    /// Persist a new channel record; returns the allocated channel id.
    async fn insert(&self, doc: ChannelDoc) -> Result<String, GameError>;
    async fn find(&self, id: &str) -> Result<Option<ChannelDoc>, GameError>;
}

// ---------------------------------------------------------------------------
// In-memory implementation (tests / no MONGO_URL)
// ---------------------------------------------------------------------------

pub struct MemoryChannelStore {
    data: Mutex<HashMap<String, ChannelDoc>>,
}

impl MemoryChannelStore {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryChannelStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChannelStore for MemoryChannelStore {
    async fn insert(&self, doc: ChannelDoc) -> Result<String, GameError> {
        let id = doc.id.clone();
        self.data.lock().insert(id.clone(), doc);
        Ok(id)
    }

    async fn find(&self, id: &str) -> Result<Option<ChannelDoc>, GameError> {
        Ok(self.data.lock().get(id).cloned())
    }
}

// ---------------------------------------------------------------------------
// MongoDB implementation
// ---------------------------------------------------------------------------

pub struct MongoChannelStore {
    channels: Collection<ChannelDoc>,
}

impl MongoChannelStore {
    pub async fn connect(url: &str, database: &str) -> Result<Self, GameError> {
        let client = mongodb::Client::with_uri_str(url).await?;
        let channels = client.database(database).collection::<ChannelDoc>("channels");
        Ok(Self { channels })
    }
}

#[async_trait]
impl ChannelStore for MongoChannelStore {
    async fn insert(&self, doc: ChannelDoc) -> Result<String, GameError> {
        let id = doc.id.clone();
        self.channels.insert_one(&doc).await?;
        Ok(id)
    }

    async fn find(&self, id: &str) -> Result<Option<ChannelDoc>, GameError> {
        Ok(self.channels.find_one(doc! { "_id": id }).await?)
    }
}
