use super::CounterStore;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

struct Window {
    count: u64,
    expires_at: Instant,
}

/// Single-node [`CounterStore`] backed by an in-process map. Selected when no Redis host is
/// configured.
#[derive(Default)]
pub struct InMemoryCounterStore {
    windows: Mutex<HashMap<String, Window>>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn increment(&self, key: &str, window: Duration) -> Result<u64> {
        let mut guard = self.windows.lock().await;
        let now = Instant::now();
        let entry = guard.get_mut(key);
        match entry {
            Some(w) if w.expires_at > now => {
                w.count += 1;
                Ok(w.count)
            }
            _ => {
                guard.insert(
                    key.to_string(),
                    Window {
                        count: 1,
                        expires_at: now + window,
                    },
                );
                Ok(1)
            }
        }
    }
}
