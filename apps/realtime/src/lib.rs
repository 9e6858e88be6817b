pub mod config;
pub mod error;
pub mod game;
pub mod gateway;
pub mod logic;
pub mod routes;
pub mod session;
pub mod store;

use std::sync::Arc;

use config::Config;
use game::ChannelLocks;
use gateway::dispatch::Dispatcher;
use gateway::registry::ConnectionRegistry;
use logic::RecipeResolver;
use store::cache::CacheStore;
use store::documents::ChannelStore;
use store::repos::GameStores;

/// Shared application state available to every connection task.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<ConnectionRegistry>,
    pub dispatcher: Dispatcher,
    pub stores: GameStores,
    pub channels: Arc<dyn ChannelStore>,
    pub logic: Arc<dyn RecipeResolver>,
    pub lab_locks: Arc<ChannelLocks>,
}

impl AppState {
    /// Wire the component graph from its leaf collaborators.
    pub fn new(
        config: Config,
        cache: Arc<dyn CacheStore>,
        channels: Arc<dyn ChannelStore>,
        logic: Arc<dyn RecipeResolver>,
    ) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let stores = GameStores::new(cache);
        let dispatcher = Dispatcher::new(registry.clone(), stores.members.clone());
        Self {
            config: Arc::new(config),
            registry,
            dispatcher,
            stores,
            channels,
            logic,
            lab_locks: Arc::new(ChannelLocks::new()),
        }
    }
}
