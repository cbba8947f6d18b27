use super::sqlite_utilities::MetricRow;
use crate::datamodel::{Metric, MetricId, UserId};
use crate::storage::error::is_unique_violation;
use crate::storage::{MetricTransaction, StorageError};
use async_trait::async_trait;
use sqlx::{Sqlite, Transaction};

pub struct SqliteMetricTransaction {
    transaction: Transaction<'static, Sqlite>,
}

impl SqliteMetricTransaction {
    pub fn new(transaction: Transaction<'static, Sqlite>) -> Self {
        Self { transaction }
    }
}

#[async_trait]
impl MetricTransaction for SqliteMetricTransaction {
    async fn stored_metric(
        &mut self,
        metric_id: MetricId,
        owner_id: UserId,
    ) -> Result<Option<Metric>, StorageError> {
        let row: Option<MetricRow> = sqlx::query_as(
            r#"
            SELECT id, owner_id, name, description, created_at, name_version
            FROM metrics
            WHERE id = ? AND owner_id = ?
            "#,
        )
        .bind(metric_id)
        .bind(owner_id)
        .fetch_optional(&mut *self.transaction)
        .await?;

        Ok(row.map(Metric::from))
    }

    async fn update_metric(&mut self, metric: &Metric) -> Result<Metric, StorageError> {
        let row: Option<MetricRow> = sqlx::query_as(
            r#"
            UPDATE metrics
            SET name = ?, description = ?, name_version = ?
            WHERE id = ? AND owner_id = ?
            RETURNING id, owner_id, name, description, created_at, name_version
            "#,
        )
        .bind(&metric.name)
        .bind(&metric.description)
        .bind(metric.name_version)
        .bind(metric.id)
        .bind(metric.owner_id)
        .fetch_optional(&mut *self.transaction)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StorageError::DuplicateMetricName {
                    name: metric.name.clone(),
                }
            } else {
                StorageError::from(e)
            }
        })?;

        row.map(Metric::from)
            .ok_or(StorageError::MetricNotFound {
                metric_id: metric.id,
            })
    }

    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        self.transaction.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StorageError> {
        self.transaction.rollback().await?;
        Ok(())
    }
}
