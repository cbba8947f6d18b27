use super::StorageError;
use super::unit_of_work::UnitOfWork;
use crate::datamodel::{Metric, MetricId, MetricRecord, NewMetric, RecordId, Tag, TagId, UserId};
use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::fmt::Debug;

/// Fields of a record about to be written. The value is already validated and rescaled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDraft {
    pub value: Decimal,
    pub timestamp: i64,
    pub tag_ids: Vec<TagId>,
}

#[async_trait]
pub trait StorageInstance: Send + Sync + Debug {
    async fn create_or_migrate(&self) -> Result<()>;
    async fn health_check(&self) -> Result<()>;

    async fn create_metric(
        &self,
        owner_id: UserId,
        metric: &NewMetric,
    ) -> Result<Metric, StorageError>;
    async fn list_metrics(&self, owner_id: UserId) -> Result<Vec<Metric>, StorageError>;
    async fn get_metric(
        &self,
        metric_id: MetricId,
        owner_id: UserId,
    ) -> Result<Option<Metric>, StorageError>;

    /// Opens a unit of work for metric updates.
    async fn begin(&self) -> Result<UnitOfWork, StorageError>;

    async fn create_tag(&self, name: &str) -> Result<Tag, StorageError>;
    /// All tags, ordered by name.
    async fn list_tags(&self) -> Result<Vec<Tag>, StorageError>;

    /// Persists a record and its tag links atomically.
    ///
    /// The record's name and name version are copied from the stored metric
    /// when the row is inserted.
    async fn create_record(
        &self,
        metric: &Metric,
        draft: &RecordDraft,
    ) -> Result<MetricRecord, StorageError>;

    /// Records of a metric owned by `owner_id`, newest first.
    /// Empty when the metric is missing or owned by someone else.
    async fn list_records(
        &self,
        metric_id: MetricId,
        owner_id: UserId,
    ) -> Result<Vec<MetricRecord>, StorageError>;

    async fn get_record(
        &self,
        metric_id: MetricId,
        record_id: RecordId,
        owner_id: UserId,
    ) -> Result<MetricRecord, StorageError>;

    /// Rewrites the denormalized name of every record of the metric stamped
    /// with an older name version. Returns the number of updated rows.
    async fn rename_records(
        &self,
        metric_id: MetricId,
        new_name: &str,
        version: i64,
    ) -> Result<u64, StorageError>;
}
