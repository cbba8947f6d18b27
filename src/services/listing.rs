use super::ServiceError;
use crate::cache::{RecordCache, metric_records_cache_key};
use crate::datamodel::{MetricId, MetricRecord, RecordId, UserId};
use crate::storage::StorageInstance;
use anyhow::Context;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Read path of metric records, with a read-through cache of the listing.
#[derive(Debug, Clone)]
pub struct ListingService {
    storage: Arc<dyn StorageInstance>,
    cache: Arc<dyn RecordCache>,
    ttl: Duration,
}

impl ListingService {
    pub fn new(
        storage: Arc<dyn StorageInstance>,
        cache: Arc<dyn RecordCache>,
        ttl: Duration,
    ) -> Self {
        Self {
            storage,
            cache,
            ttl,
        }
    }

    /// Serialized records of a metric, newest first.
    ///
    /// A cached payload is returned as is, without looking at the store.
    /// Metrics that are missing or not owned by `user_id` list as empty.
    pub async fn list(&self, user_id: UserId, metric_id: MetricId) -> Result<Value, ServiceError> {
        let cache_key = metric_records_cache_key(metric_id, user_id);

        match self.cache.get(&cache_key).await {
            Ok(Some(payload)) => {
                debug!("Cache hit for {}", cache_key);
                return Ok(payload);
            }
            Ok(None) => debug!("Cache miss for {}", cache_key),
            Err(err) => warn!("Cache read of {} failed, loading from store: {:?}", cache_key, err),
        }

        let records = self.storage.list_records(metric_id, user_id).await?;
        let payload = serde_json::to_value(&records).context("Failed to serialize records")?;

        if let Err(err) = self.cache.set(&cache_key, payload.clone(), self.ttl).await {
            warn!("Failed to populate cache key {}: {:?}", cache_key, err);
        }

        Ok(payload)
    }

    /// One record. Not cached.
    pub async fn get_record(
        &self,
        user_id: UserId,
        metric_id: MetricId,
        record_id: RecordId,
    ) -> Result<MetricRecord, ServiceError> {
        Ok(self
            .storage
            .get_record(metric_id, record_id, user_id)
            .await?)
    }
}
