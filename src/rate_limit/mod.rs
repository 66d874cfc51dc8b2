mod memory;
#[cfg(feature = "redis-cache")]
mod redis_backend;

pub use memory::InMemoryCounterStore;
#[cfg(feature = "redis-cache")]
pub use redis_backend::RedisCounterStore;

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Fixed window for the inbox/shared-inbox rate limiter.
pub const WINDOW: Duration = Duration::from_secs(60);
/// Maximum requests allowed per IP within [`WINDOW`].
pub const MAX_REQUESTS: u64 = 100;

/// Shared counter abstraction backing the rate limiter: an in-process implementation for
/// single-node deployments, a Redis-backed one for multi-node deployments.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Increment the counter for `key`, setting its TTL to `window` only on first increment, and
    /// return the new count.
    async fn increment(&self, key: &str, window: Duration) -> Result<u64>;
}

/// Enforce the per-IP fixed-window rate limit; returns `Err(TooManyRequests)` once an IP exceeds
/// [`MAX_REQUESTS`] within [`WINDOW`].
pub async fn check(store: &dyn CounterStore, ip: &str) -> Result<()> {
    let key = format!("ratelimit:{ip}");
    let count = store.increment(&key, WINDOW).await?;
    if count > MAX_REQUESTS {
        return Err(crate::error::Error::TooManyRequests);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allows_up_to_max_then_rejects() {
        let store = InMemoryCounterStore::new();
        for _ in 0..MAX_REQUESTS {
            check(&store, "1.2.3.4").await.unwrap();
        }
        let result = check(&store, "1.2.3.4").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn different_ips_are_independent() {
        let store = InMemoryCounterStore::new();
        for _ in 0..MAX_REQUESTS {
            check(&store, "1.1.1.1").await.unwrap();
        }
        assert!(check(&store, "2.2.2.2").await.is_ok());
    }
}
