use std::time::Duration;
use crate::rate_limit::RateLimiter;
use crate::upstream::Upstream;

// Owner lookup settings for get-listings
#[derive(Debug, Clone, Copy)]
pub struct EnrichSettings {
    pub timeout: Duration,   // deadline per lookup
    pub concurrency: usize,  // lookups in flight per request
}

// app's shared state

pub struct AppState {
    pub client: reqwest::Client,
    pub upstream: Upstream,
    pub rate_limiter: RateLimiter,
    pub enrich: EnrichSettings,
    pub max_body_bytes: usize,
}
