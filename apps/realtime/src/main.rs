use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wayfarer_realtime::config::Config;
use wayfarer_realtime::logic::LogicClient;
use wayfarer_realtime::store::cache::{CacheStore, MemoryCache, RedisCache};
use wayfarer_realtime::store::documents::{ChannelStore, MemoryChannelStore, MongoChannelStore};
use wayfarer_realtime::AppState;

#[tokio::main]
async fn main() {
    // Load .env file (silently skip if missing — env vars may be set externally)
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let port = config.port;

    let cache: Arc<dyn CacheStore> = match &config.redis_url {
        Some(url) => Arc::new(RedisCache::connect(url).await.expect("redis connection")),
        None => {
            tracing::warn!("REDIS_URL not set — using the in-memory cache");
            Arc::new(MemoryCache::new())
        }
    };

    let channels: Arc<dyn ChannelStore> = match &config.mongo_url {
        Some(url) => Arc::new(
            MongoChannelStore::connect(url, &config.mongo_db)
                .await
                .expect("mongodb connection"),
        ),
        None => {
            tracing::warn!("MONGO_URL not set — using the in-memory channel store");
            Arc::new(MemoryChannelStore::new())
        }
    };

    let logic = Arc::new(LogicClient::new(
        &config.logic_url,
        Duration::from_millis(config.logic_timeout_ms),
    ));

    tracing::info!(logic_url = %config.logic_url, "realtime server configured");

    let state = AppState::new(config, cache, channels, logic);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = axum::Router::new()
        .merge(wayfarer_realtime::routes::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "realtime server listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
