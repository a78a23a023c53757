use async_trait::async_trait;
use redis::Script;
use redis::aio::ConnectionManager;
use std::time::Duration;
use tokio::sync::OnceCell;

use super::CounterStore;
use crate::error::StoreError;

// INCR and the first-increment PEXPIRE run as one script, so the count and
// the window start are decided in a single round trip.
const INCR_WINDOW: &str = r#"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('PEXPIRE', KEYS[1], ARGV[1])
end
return count
"#;

/// Redis-backed counters, shared by every gateway instance.
pub struct RedisCounterStore {
    client: redis::Client,
    // established on first use so a Redis outage at boot only fails requests
    connection: OnceCell<ConnectionManager>,
    script: Script,
    op_timeout: Duration,
}

impl RedisCounterStore {
    pub fn new(url: &str, op_timeout: Duration) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)
            .map_err(|e| StoreError::Unavailable(format!("invalid redis url {}: {}", url, e)))?;

        Ok(Self {
            client,
            connection: OnceCell::new(),
            script: Script::new(INCR_WINDOW),
            op_timeout,
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                let manager = ConnectionManager::new(self.client.clone()).await?;
                tracing::info!("connected to redis counter store");
                Ok::<_, StoreError>(manager)
            })
            .await?;
        Ok(manager.clone())
    }

    async fn run_script(&self, key: &str, window: Duration) -> Result<u64, StoreError> {
        // checked before INCR runs, a rejected PEXPIRE would leave the key without a TTL
        let ttl_ms = ttl_millis(window)?;
        let mut conn = self.connection().await?;
        let count: u64 = self
            .script
            .key(key)
            .arg(ttl_ms)
            .invoke_async(&mut conn)
            .await?;
        Ok(count)
    }
}

// PEXPIRE takes a positive signed 64-bit millisecond count
fn ttl_millis(window: Duration) -> Result<u64, StoreError> {
    u64::try_from(window.as_millis())
        .ok()
        .filter(|ms| *ms <= i64::MAX as u64)
        .map(|ms| ms.max(1))
        .ok_or_else(|| StoreError::Command(format!("window {:?} is out of range", window)))
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn incr_window(&self, key: &str, window: Duration) -> Result<u64, StoreError> {
        match tokio::time::timeout(self.op_timeout, self.run_script(key, window)).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout),
        }
    }
}
