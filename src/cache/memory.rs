use super::RecordCache;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use clru::CLruCache;
use serde_json::Value;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-process LRU cache. The least recently used entry is evicted once
/// `capacity` is reached; expired entries are dropped when read.
pub struct MemoryCache {
    entries: Mutex<CLruCache<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(CLruCache::new(capacity)),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, CLruCache<String, CacheEntry>>> {
        self.entries
            .lock()
            .map_err(|e| anyhow!("Memory cache lock poisoned: {}", e))
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_key(&self, key: &str) -> bool {
        let now = Instant::now();
        self.lock()
            .map(|entries| {
                entries
                    .peek(&key.to_string())
                    .is_some_and(|entry| !entry.is_expired(now))
            })
            .unwrap_or(false)
    }
}

impl fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCache")
            .field("len", &self.len())
            .finish()
    }
}

#[async_trait]
impl RecordCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let key = key.to_string();
        let now = Instant::now();
        let mut entries = self.lock()?;

        let expired = match entries.get(&key) {
            None => return Ok(None),
            Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
            Some(_) => true,
        };
        if expired {
            entries.pop(&key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<()> {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.lock()?.put(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.lock()?.pop(&key.to_string());
        Ok(())
    }
}
