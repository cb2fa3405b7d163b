use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use tokio::sync::Mutex;

use crate::config::CacheConfig;
use crate::pipeline::types::TriageResult;

#[derive(Debug, Clone)]
struct CacheEntry {
    result: TriageResult,
    inserted_at: Instant,
}

/// Bounded LRU of triage results keyed by normalized report text, with an
/// optional time-to-live. The lock is held only for map operations.
pub struct TriageCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    ttl: Option<Duration>,
}

impl TriageCache {
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.capacity, config.ttl_secs.map(Duration::from_secs))
    }

    /// Cached result for `key`. Expired entries are dropped and read as a miss.
    pub async fn get(&self, key: &str) -> Option<TriageResult> {
        let mut entries = self.entries.lock().await;
        let expired = match entries.get(key) {
            Some(entry) => self
                .ttl
                .is_some_and(|ttl| entry.inserted_at.elapsed() >= ttl),
            None => return None,
        };
        if expired {
            entries.pop(key);
            return None;
        }
        entries.get(key).map(|entry| entry.result.clone())
    }

    /// Insert or replace. Last writer wins.
    pub async fn put(&self, key: String, result: TriageResult) {
        self.entries.lock().await.put(
            key,
            CacheEntry {
                result,
                inserted_at: Instant::now(),
            },
        );
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}
