use super::ServiceError;
use crate::cache::{RecordCache, metric_records_cache_key};
use crate::datamodel::{
    MetricId, MetricRecord, NewRecord, UserId, normalize_record_value, validate_unix_timestamp,
};
use crate::storage::{RecordDraft, StorageInstance};
use std::sync::Arc;
use tracing::{debug, error};

/// Write path of metric records.
#[derive(Debug, Clone)]
pub struct IngestionService {
    storage: Arc<dyn StorageInstance>,
    cache: Arc<dyn RecordCache>,
}

impl IngestionService {
    pub fn new(storage: Arc<dyn StorageInstance>, cache: Arc<dyn RecordCache>) -> Self {
        Self { storage, cache }
    }

    /// Creates a record in a metric owned by `user_id`.
    ///
    /// A metric that does not exist and a metric owned by someone else both
    /// give [`ServiceError::NotFound`]. The listing cache of the metric is
    /// invalidated once the record is committed.
    pub async fn submit(
        &self,
        user_id: UserId,
        metric_id: MetricId,
        payload: NewRecord,
    ) -> Result<MetricRecord, ServiceError> {
        let metric = self
            .storage
            .get_metric(metric_id, user_id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        validate_unix_timestamp(payload.timestamp)?;
        let value = normalize_record_value(payload.value)?;

        let draft = RecordDraft {
            value,
            timestamp: payload.timestamp,
            tag_ids: payload.tags,
        };
        let record = self.storage.create_record(&metric, &draft).await?;

        let cache_key = metric_records_cache_key(metric_id, user_id);
        debug!("Invalidating cached records of metric {}", metric_id);
        if let Err(err) = self.cache.delete(&cache_key).await {
            // The record is committed, a stale listing expires with its TTL
            error!(
                "Failed to invalidate cache key {} after creating record {}: {:?}",
                cache_key, record.id, err
            );
        }

        Ok(record)
    }
}
