use super::sqlite_transaction::SqliteMetricTransaction;
use super::sqlite_utilities::{
    MetricRow, RecordRow, begin_write, find_unknown_tag_ids, get_tag_ids_by_metric,
    get_tag_ids_by_record,
};
use crate::datamodel::{Metric, MetricId, MetricRecord, NewMetric, RecordId, Tag, UserId};
use crate::storage::error::is_unique_violation;
use crate::storage::{RecordDraft, StorageError, StorageInstance, UnitOfWork};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::collections::BTreeSet;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

// SQLite implementation
#[derive(Debug)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let in_memory =
            connection_string.contains(":memory:") || connection_string.contains("mode=memory");

        let mut connect_options = SqliteConnectOptions::from_str(connection_string)
            .context("Failed to create sqlite connection options")?
            // Create the database file if it doesn't exist
            .create_if_missing(true)
            // Records are deleted with their metric
            .foreign_keys(true)
            // Set a busy timeout of 5 seconds
            .busy_timeout(Duration::from_secs(5));

        if !in_memory {
            connect_options = connect_options.journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);
        }

        // An in-memory database lives and dies with its connection,
        // so the pool keeps exactly one open for good.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .context("Failed to create sqlite pool")?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl StorageInstance for SqliteStorage {
    async fn create_or_migrate(&self) -> Result<()> {
        sqlx::migrate!("src/storage/sqlite/migrations")
            .run(&self.pool)
            .await
            .context("Failed to migrate database")?;

        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database health check failed")?;
        Ok(())
    }

    async fn create_metric(
        &self,
        owner_id: UserId,
        metric: &NewMetric,
    ) -> Result<Metric, StorageError> {
        let row: MetricRow = sqlx::query_as(
            r#"
            INSERT INTO metrics (owner_id, name, description)
            VALUES (?, ?, ?)
            RETURNING id, owner_id, name, description, created_at, name_version
            "#,
        )
        .bind(owner_id)
        .bind(&metric.name)
        .bind(&metric.description)
        .fetch_one(&self.pool)
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

        Ok(row.into())
    }

    async fn list_metrics(&self, owner_id: UserId) -> Result<Vec<Metric>, StorageError> {
        let rows: Vec<MetricRow> = sqlx::query_as(
            r#"
            SELECT id, owner_id, name, description, created_at, name_version
            FROM metrics
            WHERE owner_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Metric::from).collect())
    }

    async fn get_metric(
        &self,
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
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Metric::from))
    }

    async fn begin(&self) -> Result<UnitOfWork, StorageError> {
        let transaction = begin_write(&self.pool).await?;
        Ok(UnitOfWork::new(Box::new(SqliteMetricTransaction::new(
            transaction,
        ))))
    }

    async fn create_tag(&self, name: &str) -> Result<Tag, StorageError> {
        let id = sqlx::query("INSERT INTO tags (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StorageError::DuplicateTagName {
                        name: name.to_string(),
                    }
                } else {
                    StorageError::from(e)
                }
            })?
            .last_insert_rowid();

        Ok(Tag::new(id, name.to_string()))
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, StorageError> {
        #[derive(sqlx::FromRow)]
        struct TagRow {
            id: i64,
            name: String,
        }

        let rows: Vec<TagRow> = sqlx::query_as("SELECT id, name FROM tags ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|row| Tag::new(row.id, row.name)).collect())
    }

    async fn create_record(
        &self,
        metric: &Metric,
        draft: &RecordDraft,
    ) -> Result<MetricRecord, StorageError> {
        // A record links a tag at most once
        let tag_ids: Vec<i64> = draft
            .tag_ids
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut transaction = begin_write(&self.pool).await?;

        // Returning early drops the transaction, which rolls it back
        let unknown = find_unknown_tag_ids(&mut transaction, &tag_ids).await?;
        if !unknown.is_empty() {
            return Err(StorageError::UnknownTags { tag_ids: unknown });
        }

        // The name is copied from the stored metric, so a rename committed
        // since the caller read the metric is not missed.
        let stamped: Option<(i64, String, i64)> = sqlx::query_as(
            r#"
            INSERT INTO metric_records (metric_id, value, timestamp, metric_name, metric_name_version)
            SELECT id, ?, ?, name, name_version FROM metrics WHERE id = ?
            RETURNING id, metric_name, metric_name_version
            "#,
        )
        .bind(draft.value.to_string())
        .bind(draft.timestamp)
        .bind(metric.id)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StorageError::DuplicateTimestamp {
                    metric_id: metric.id,
                    timestamp: draft.timestamp,
                }
            } else {
                StorageError::from(e)
            }
        })?;
        let (record_id, metric_name, metric_name_version) =
            stamped.ok_or(StorageError::MetricNotFound {
                metric_id: metric.id,
            })?;

        for tag_id in &tag_ids {
            sqlx::query("INSERT INTO metric_record_tags (record_id, tag_id) VALUES (?, ?)")
                .bind(record_id)
                .bind(tag_id)
                .execute(&mut *transaction)
                .await?;
        }

        transaction.commit().await?;
        debug!(
            "Created record {} for metric {} at {}",
            record_id, metric.id, draft.timestamp
        );

        Ok(MetricRecord {
            id: record_id,
            metric_id: metric.id,
            metric_name: Some(metric_name),
            value: draft.value,
            timestamp: draft.timestamp,
            tag_ids,
            metric_name_version,
        })
    }

    async fn list_records(
        &self,
        metric_id: MetricId,
        owner_id: UserId,
    ) -> Result<Vec<MetricRecord>, StorageError> {
        let mut connection = self.pool.acquire().await?;

        let rows: Vec<RecordRow> = sqlx::query_as(
            r#"
            SELECT r.id, r.metric_id, r.value, r.timestamp, r.metric_name, r.metric_name_version
            FROM metric_records r
            JOIN metrics m ON m.id = r.metric_id
            WHERE r.metric_id = ? AND m.owner_id = ?
            ORDER BY r.timestamp DESC
            "#,
        )
        .bind(metric_id)
        .bind(owner_id)
        .fetch_all(&mut *connection)
        .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut tags = get_tag_ids_by_metric(&mut connection, metric_id).await?;
        rows.into_iter()
            .map(|row| {
                let tag_ids = tags.remove(&row.id).unwrap_or_default();
                row.into_record(tag_ids)
            })
            .collect()
    }

    async fn get_record(
        &self,
        metric_id: MetricId,
        record_id: RecordId,
        owner_id: UserId,
    ) -> Result<MetricRecord, StorageError> {
        let mut connection = self.pool.acquire().await?;

        let row: Option<RecordRow> = sqlx::query_as(
            r#"
            SELECT r.id, r.metric_id, r.value, r.timestamp, r.metric_name, r.metric_name_version
            FROM metric_records r
            JOIN metrics m ON m.id = r.metric_id
            WHERE r.id = ? AND r.metric_id = ? AND m.owner_id = ?
            "#,
        )
        .bind(record_id)
        .bind(metric_id)
        .bind(owner_id)
        .fetch_optional(&mut *connection)
        .await?;

        let row = row.ok_or(StorageError::RecordNotFound {
            metric_id,
            record_id,
        })?;
        let tag_ids = get_tag_ids_by_record(&mut connection, record_id).await?;
        row.into_record(tag_ids)
    }

    async fn rename_records(
        &self,
        metric_id: MetricId,
        new_name: &str,
        version: i64,
    ) -> Result<u64, StorageError> {
        // Rows already stamped with this version or a newer one are left alone,
        // which makes replays and late deliveries harmless.
        let result = sqlx::query(
            r#"
            UPDATE metric_records
            SET metric_name = ?, metric_name_version = ?
            WHERE metric_id = ? AND metric_name_version < ?
            "#,
        )
        .bind(new_name)
        .bind(version)
        .bind(metric_id)
        .bind(version)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
