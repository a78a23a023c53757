use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, interval};

use super::CounterStore;
use crate::error::StoreError;

// Counter for one key, expires a fixed time after its first increment
struct Window {
    count: u64,
    expires_at: Instant,
}

/// In-process counter store for single-instance deployments and tests.
#[derive(Default)]
pub struct MemoryCounterStore {
    windows: DashMap<String, Window>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Drop keys whose window has elapsed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.windows.len();
        self.windows.retain(|_, w| w.expires_at > now);
        before - self.windows.len()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn incr_window(&self, key: &str, window: Duration) -> Result<u64, StoreError> {
        let now = Instant::now();
        let expires_at = now
            .checked_add(window)
            .ok_or_else(|| StoreError::Command(format!("window {:?} is out of range", window)))?;

        // the shard lock held by the entry guard makes this read-modify-write atomic
        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            expires_at,
        });

        // window elapsed..? the key is gone, start a fresh one
        if entry.expires_at <= now {
            entry.count = 0;
            entry.expires_at = expires_at;
        }

        entry.count += 1;
        Ok(entry.count)
    }
}

// Periodically drops expired counters so idle addresses don't pile up
pub async fn sweeper(store: Arc<MemoryCounterStore>, every: Duration) {
    let mut interval = interval(every);

    tracing::info!(interval = ?every, "rate counter sweeper started");

    loop {
        interval.tick().await;

        let removed = store.purge_expired();
        if removed > 0 {
            tracing::debug!(removed, remaining = store.len(), "purged expired rate counters");
        }
    }
}
