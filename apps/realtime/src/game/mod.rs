pub mod inventory;
pub mod laboratory;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

/// Per-channel mutexes serializing laboratory check-and-consume sections.
///
/// Cache decrements are atomic per key only; without this, two syntheses in
/// the same channel can interleave between the sufficiency check and the
/// consume step and drive materials negative.
pub struct ChannelLocks {
    inner: DashMap<String, Arc<Mutex<()>>>,
}

impl ChannelLocks {
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }

    pub fn get(&self, channel_id: &str) -> Arc<Mutex<()>> {
        self.inner
            .entry(channel_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Default for ChannelLocks {
    fn default() -> Self {
        Self::new()
    }
}
