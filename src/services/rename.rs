use crate::datamodel::{Metric, MetricId};
use crate::storage::StorageInstance;
use crate::tasks::{Job, TaskQueue};
use std::sync::Arc;
use tracing::{debug, error, info};

/// A committed change of a metric's display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameChange {
    pub metric_id: MetricId,
    pub old_name: String,
    pub new_name: String,
    /// Name version of the metric after the rename.
    pub version: i64,
}

impl RenameChange {
    /// Compares the metric before and after an update.
    ///
    /// Returns `None` when the name did not change, so nothing needs propagating.
    pub fn detect(before: &Metric, after: &Metric) -> Option<Self> {
        if before.id != after.id || before.name == after.name {
            return None;
        }
        Some(Self {
            metric_id: after.id,
            old_name: before.name.clone(),
            new_name: after.name.clone(),
            version: after.name_version,
        })
    }

    pub fn to_job(&self) -> Job {
        Job::RenameRecords {
            metric_id: self.metric_id,
            new_name: self.new_name.clone(),
            version: self.version,
        }
    }
}

/// How a rename reached the records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagationOutcome {
    /// Handed to the task queue, the workers take it from there.
    Enqueued,
    /// The queue refused the job and the records were updated in-process.
    RanInline { updated: u64 },
    /// Both the queue and the inline update failed. Records stay stale.
    Failed,
}

/// Pushes renamed metric names into the denormalized record names.
#[derive(Debug, Clone)]
pub struct RenamePropagator {
    queue: Arc<dyn TaskQueue>,
    storage: Arc<dyn StorageInstance>,
}

impl RenamePropagator {
    pub fn new(queue: Arc<dyn TaskQueue>, storage: Arc<dyn StorageInstance>) -> Self {
        Self { queue, storage }
    }

    /// Must only be called once the rename is committed.
    pub async fn propagate(&self, change: RenameChange) -> PropagationOutcome {
        debug!(
            "Propagating rename of metric {} from '{}' to '{}'",
            change.metric_id, change.old_name, change.new_name
        );

        let enqueue_error = match self.queue.enqueue(change.to_job()).await {
            Ok(()) => return PropagationOutcome::Enqueued,
            Err(err) => err,
        };
        error!(
            "Failed to enqueue rename of metric {}, updating records synchronously: {:?}",
            change.metric_id,
            anyhow::Error::new(enqueue_error)
        );

        match self
            .storage
            .rename_records(change.metric_id, &change.new_name, change.version)
            .await
        {
            Ok(updated) => {
                info!(
                    "Renamed {} records of metric {} to '{}' synchronously",
                    updated, change.metric_id, change.new_name
                );
                PropagationOutcome::RanInline { updated }
            }
            Err(err) => {
                error!(
                    "Synchronous rename of metric {} to '{}' failed, records keep a stale name: {:?}",
                    change.metric_id,
                    change.new_name,
                    anyhow::Error::new(err)
                );
                PropagationOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FailingTaskQueue, RecordingTaskQueue, memory_storage, seed_metric};

    fn metric(name: &str, version: i64) -> Metric {
        Metric::new(
            1,
            name.to_string(),
            None,
            "2024-01-01T00:00:00.000Z".to_string(),
            1,
            version,
        )
    }

    #[test]
    fn test_detect() {
        assert_eq!(RenameChange::detect(&metric("a", 0), &metric("a", 0)), None);

        let change = RenameChange::detect(&metric("a", 0), &metric("b", 1)).unwrap();
        assert_eq!(change.old_name, "a");
        assert_eq!(change.new_name, "b");
        assert_eq!(change.version, 1);
        assert_eq!(
            change.to_job(),
            Job::RenameRecords {
                metric_id: 1,
                new_name: "b".to_string(),
                version: 1
            }
        );
    }

    #[tokio::test]
    async fn test_propagate_enqueues() {
        let storage = memory_storage().await;
        let queue = Arc::new(RecordingTaskQueue::default());
        let propagator = RenamePropagator::new(queue.clone(), storage);

        let change = RenameChange::detect(&metric("a", 0), &metric("b", 1)).unwrap();
        let outcome = propagator.propagate(change.clone()).await;

        assert_eq!(outcome, PropagationOutcome::Enqueued);
        assert_eq!(queue.jobs(), vec![change.to_job()]);
    }

    #[tokio::test]
    async fn test_propagate_falls_back_to_inline_update() {
        let storage = memory_storage().await;
        let seeded = seed_metric(&storage, 1, "old", &[1_704_067_200, 1_704_067_260]).await;
        let queue = Arc::new(FailingTaskQueue::default());
        let propagator = RenamePropagator::new(queue.clone(), storage.clone());

        let mut renamed = seeded.clone();
        renamed.name = "new".to_string();
        renamed.name_version += 1;
        let change = RenameChange::detect(&seeded, &renamed).unwrap();

        let outcome = propagator.propagate(change).await;

        assert_eq!(outcome, PropagationOutcome::RanInline { updated: 2 });
        assert_eq!(queue.attempts(), 1);
        let records = storage.list_records(seeded.id, 1).await.unwrap();
        assert!(
            records
                .iter()
                .all(|r| r.metric_name.as_deref() == Some("new"))
        );
    }
}
