/// Realtime server configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the gateway binds to.
    pub port: u16,
    /// Redis connection string. Falls back to the in-memory cache when unset.
    pub redis_url: Option<String>,
    /// MongoDB connection string. Falls back to the in-memory store when unset.
    pub mongo_url: Option<String>,
    /// MongoDB database name.
    pub mongo_db: String,
    /// Base URL of the logic (compute) service.
    pub logic_url: String,
    /// Per-request timeout for logic calls, in milliseconds.
    pub logic_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Panics with a descriptive message if a required variable is missing.
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4010),
            redis_url: std::env::var("REDIS_URL").ok().filter(|s| !s.is_empty()),
            mongo_url: std::env::var("MONGO_URL").ok().filter(|s| !s.is_empty()),
            mongo_db: std::env::var("MONGO_DB").unwrap_or_else(|_| "wayfarer".to_string()),
            logic_url: required_var("LOGIC_URL"),
            logic_timeout_ms: std::env::var("LOGIC_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
        }
    }
}

fn required_var(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| panic!("{name} env var is required"))
}
