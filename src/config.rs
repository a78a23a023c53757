use clap::{Parser, ValueEnum};
use std::time::Duration;

// One year
pub const MAX_RATE_WINDOW_SECS: u64 = 365 * 24 * 60 * 60;

// Which backend holds the rate counters
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateStoreKind {
    Redis,
    Memory,
}

// CLI argument structure, every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "public-api-gateway")]
#[command(about = "Public gateway in front of the user and listing services")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 6002)]
    pub port: u16,

    // User service base address
    // Example: "localhost:6001" or "http://user-service:6001"
    #[arg(long, env = "USER_SERVICE_URL", default_value = "localhost:6001")]
    pub user_service_url: String,

    // Listing service base address
    #[arg(long, env = "LISTING_SERVICE_URL", default_value = "localhost:6000")]
    pub listing_service_url: String,

    #[arg(long, env = "REDIS_HOST", default_value = "localhost")]
    pub redis_host: String,

    #[arg(long, env = "REDIS_PORT", default_value_t = 6379)]
    pub redis_port: u16,

    // Where rate counters live
    #[arg(long, env = "RATE_STORE", value_enum, default_value_t = RateStoreKind::Redis)]
    pub rate_store: RateStoreKind,

    // Rate limit max requests per window
    #[arg(long, env = "RATE_LIMIT", default_value_t = 5)]
    pub rate_limit: u64,

    // Rate limit window in seconds
    #[arg(long, env = "RATE_WINDOW", default_value_t = 60)]
    pub rate_window: u64,

    // Timeout for primary collaborator calls, in seconds
    #[arg(long, env = "UPSTREAM_TIMEOUT", default_value_t = 10)]
    pub upstream_timeout: u64,

    // Deadline for a single owner lookup, in milliseconds
    #[arg(long, env = "ENRICH_TIMEOUT_MS", default_value_t = 2000)]
    pub enrich_timeout_ms: u64,

    // Max owner lookups in flight for one listings request
    #[arg(long, env = "ENRICH_CONCURRENCY", default_value_t = 8)]
    pub enrich_concurrency: usize,

    // Deadline for one counter store round trip, in milliseconds
    #[arg(long, env = "STORE_TIMEOUT_MS", default_value_t = 500)]
    pub store_timeout_ms: u64,

    #[arg(long, env = "MAX_BODY_BYTES", default_value_t = 1024 * 1024)]
    pub max_body_bytes: usize,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("rate limit must be at least 1")]
    ZeroRateLimit,
    #[error("rate window must be at least 1 second")]
    ZeroRateWindow,
    #[error("rate window must be at most one year")]
    RateWindowTooLong,
    #[error("enrichment concurrency must be at least 1")]
    ZeroConcurrency,
}

impl Args {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_limit == 0 {
            return Err(ConfigError::ZeroRateLimit);
        }
        if self.rate_window == 0 {
            return Err(ConfigError::ZeroRateWindow);
        }
        if self.rate_window > MAX_RATE_WINDOW_SECS {
            return Err(ConfigError::RateWindowTooLong);
        }
        if self.enrich_concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }

    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}", self.redis_host, self.redis_port)
    }

    pub fn rate_window(&self) -> Duration {
        Duration::from_secs(self.rate_window)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout)
    }

    pub fn enrich_timeout(&self) -> Duration {
        Duration::from_millis(self.enrich_timeout_ms)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}
