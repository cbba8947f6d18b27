pub mod keys;
pub mod memory;

pub use keys::metric_records_cache_key;
pub use memory::MemoryCache;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;
use std::time::Duration;

/// Key/value cache with per-entry expiry.
///
/// No locking across calls: a reader racing a writer sees either the old
/// entry or a miss.
#[async_trait]
pub trait RecordCache: Send + Sync + Debug {
    async fn get(&self, key: &str) -> Result<Option<Value>>;
    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
}
