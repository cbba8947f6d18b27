use super::ServiceError;
use super::rename::{RenameChange, RenamePropagator};
use crate::datamodel::metric::validate_metric_name;
use crate::datamodel::tag::validate_tag_name;
use crate::datamodel::{Metric, MetricChanges, MetricId, NewMetric, Tag, UserId};
use crate::storage::StorageInstance;
use std::sync::Arc;
use tracing::info;

/// Metric and tag management. Renames are propagated to records after commit.
#[derive(Debug, Clone)]
pub struct MetricService {
    storage: Arc<dyn StorageInstance>,
    propagator: RenamePropagator,
}

impl MetricService {
    pub fn new(storage: Arc<dyn StorageInstance>, propagator: RenamePropagator) -> Self {
        Self {
            storage,
            propagator,
        }
    }

    pub async fn create_metric(
        &self,
        user_id: UserId,
        payload: NewMetric,
    ) -> Result<Metric, ServiceError> {
        let payload = NewMetric {
            name: payload.name.trim().to_string(),
            description: payload.description,
        };
        validate_metric_name(&payload.name).map_err(|msg| ServiceError::validation("name", msg))?;

        let metric = self.storage.create_metric(user_id, &payload).await?;
        info!("Created metric {} ({}) for user {}", metric.id, metric, user_id);
        Ok(metric)
    }

    pub async fn list_metrics(&self, user_id: UserId) -> Result<Vec<Metric>, ServiceError> {
        Ok(self.storage.list_metrics(user_id).await?)
    }

    pub async fn get_metric(
        &self,
        user_id: UserId,
        metric_id: MetricId,
    ) -> Result<Metric, ServiceError> {
        self.storage
            .get_metric(metric_id, user_id)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    /// Applies `changes` to an owned metric.
    ///
    /// The previous name is read from the store inside the transaction, not
    /// from anything the caller holds. A name change bumps the name version
    /// and schedules propagation to run once the transaction has committed.
    pub async fn update_metric(
        &self,
        user_id: UserId,
        metric_id: MetricId,
        changes: MetricChanges,
    ) -> Result<Metric, ServiceError> {
        let mut uow = self.storage.begin().await?;

        let before = uow
            .transaction()
            .stored_metric(metric_id, user_id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        let mut after = before.clone();
        changes.apply(&mut after);
        validate_metric_name(&after.name).map_err(|msg| ServiceError::validation("name", msg))?;
        if after.name != before.name {
            after.name_version = before.name_version + 1;
        }

        let updated = uow.transaction().update_metric(&after).await?;

        if let Some(change) = RenameChange::detect(&before, &updated) {
            info!(
                "Metric {} renamed from '{}' to '{}'",
                change.metric_id, change.old_name, change.new_name
            );
            let propagator = self.propagator.clone();
            uow.on_commit(move || async move {
                propagator.propagate(change).await;
            });
        }

        uow.commit().await?;
        Ok(updated)
    }

    pub async fn create_tag(&self, name: &str) -> Result<Tag, ServiceError> {
        let name = name.trim();
        validate_tag_name(name).map_err(|msg| ServiceError::validation("name", msg))?;
        Ok(self.storage.create_tag(name).await?)
    }

    pub async fn list_tags(&self) -> Result<Vec<Tag>, ServiceError> {
        Ok(self.storage.list_tags().await?)
    }
}
