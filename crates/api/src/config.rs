//! Environment-driven service configuration.

use tracing::warn;

/// Runtime configuration, read once at startup.
///
/// `database_url` and `redis_url` are optional so the service can run fully
/// in-memory for local development; production deployments set both.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub stream_key: String,
    pub consumer_group: String,
    pub consumer_name: String,
    pub block_ms: u64,
    pub cache_capacity: usize,
}

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_STREAM_KEY: &str = "wareflow:events";
const DEFAULT_CONSUMER_GROUP: &str = "warehouse-service";
const DEFAULT_BLOCK_MS: u64 = 1000;
const DEFAULT_CACHE_CAPACITY: usize = 1024;

impl Config {
    pub fn from_env() -> Self {
        let bind_addr = std::env::var("WAREFLOW_BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        let database_url = std::env::var("DATABASE_URL").ok();
        if database_url.is_none() {
            warn!("DATABASE_URL not set; using in-memory stores");
        }

        let redis_url = std::env::var("REDIS_URL").ok();
        if redis_url.is_none() {
            warn!("REDIS_URL not set; event consumption disabled");
        }

        let consumer_name = std::env::var("WAREFLOW_CONSUMER_NAME").unwrap_or_else(|_| {
            format!("worker-{}", std::process::id())
        });

        Self {
            bind_addr,
            database_url,
            redis_url,
            stream_key: std::env::var("WAREFLOW_STREAM_KEY")
                .unwrap_or_else(|_| DEFAULT_STREAM_KEY.to_string()),
            consumer_group: std::env::var("WAREFLOW_CONSUMER_GROUP")
                .unwrap_or_else(|_| DEFAULT_CONSUMER_GROUP.to_string()),
            consumer_name,
            block_ms: std::env::var("WAREFLOW_BLOCK_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_BLOCK_MS),
            cache_capacity: std::env::var("WAREFLOW_CACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_CACHE_CAPACITY),
        }
    }
}
