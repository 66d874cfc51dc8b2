use super::CounterStore;
use crate::error::{Error, Result};
use async_trait::async_trait;
use redis::AsyncCommands;
use std::time::Duration;

/// Multi-node [`CounterStore`] backed by Redis, selected when `REDIS_HOST` is configured so that
/// the rate limit (and, via the same client, the shared caches) is consistent across replicas.
pub struct RedisCounterStore {
    client: redis::Client,
}

impl RedisCounterStore {
    pub fn new(host: &str, port: u16) -> Result<Self> {
        let url = format!("redis://{host}:{port}");
        let client = redis::Client::open(url)
            .map_err(|e| Error::Other(anyhow::anyhow!("invalid redis url: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn increment(&self, key: &str, window: Duration) -> Result<u64> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| Error::Other(anyhow::anyhow!("redis connection failed: {e}")))?;
        let count: u64 = conn
            .incr(key, 1u64)
            .await
            .map_err(|e| Error::Other(anyhow::anyhow!("redis INCR failed: {e}")))?;
        if count == 1 {
            let _: () = conn
                .expire(key, window.as_secs() as i64)
                .await
                .map_err(|e| Error::Other(anyhow::anyhow!("redis EXPIRE failed: {e}")))?;
        }
        Ok(count)
    }
}
