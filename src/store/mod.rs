//! Shared counter store backing the rate limiter.
//!
//! A backend exposes one operation: increment a key and, when that increment
//! opened a fresh window, give the key a time to live. Both halves happen in
//! one atomic step so concurrent requests never observe a lost count.

mod memory;
mod redis_store;

pub use memory::{MemoryCounterStore, sweeper};
pub use redis_store::RedisCounterStore;

use async_trait::async_trait;
use std::time::Duration;

use crate::error::StoreError;

#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically increments `key` and returns the post-increment count.
    /// The expiry is set to `window` only when the count is 1 and is never
    /// pushed back by later increments in the same window.
    async fn incr_window(&self, key: &str, window: Duration) -> Result<u64, StoreError>;
}
