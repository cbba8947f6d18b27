use crate::datamodel::{Metric, MetricId, MetricRecord, RecordId, TagId};
use crate::storage::StorageError;
use rust_decimal::Decimal;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(sqlx::FromRow)]
pub struct MetricRow {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub name_version: i64,
}

impl From<MetricRow> for Metric {
    fn from(row: MetricRow) -> Self {
        Metric::new(
            row.id,
            row.name,
            row.description,
            row.created_at,
            row.owner_id,
            row.name_version,
        )
    }
}

#[derive(sqlx::FromRow)]
pub struct RecordRow {
    pub id: i64,
    pub metric_id: i64,
    pub value: String,
    pub timestamp: i64,
    pub metric_name: Option<String>,
    pub metric_name_version: i64,
}

impl RecordRow {
    pub fn into_record(self, tag_ids: Vec<TagId>) -> Result<MetricRecord, StorageError> {
        // Values are stored as TEXT to keep their exact decimal representation
        let value = Decimal::from_str(&self.value).map_err(|e| {
            StorageError::invalid_data_format(
                &format!("Failed to parse value '{}': {}", self.value, e),
                self.id,
            )
        })?;

        Ok(MetricRecord {
            id: self.id,
            metric_id: self.metric_id,
            metric_name: self.metric_name,
            value,
            timestamp: self.timestamp,
            tag_ids,
            metric_name_version: self.metric_name_version,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RecordTagRow {
    record_id: i64,
    tag_id: i64,
}

fn group_tag_rows(rows: Vec<RecordTagRow>) -> BTreeMap<RecordId, Vec<TagId>> {
    let mut tags: BTreeMap<RecordId, Vec<TagId>> = BTreeMap::new();
    for row in rows {
        tags.entry(row.record_id).or_default().push(row.tag_id);
    }
    tags
}

/// Opens a transaction holding the write lock from `BEGIN`.
///
/// Required for any transaction that reads before it writes: SQLite refuses
/// to upgrade a deferred read lock while another connection holds a snapshot,
/// and fails with SQLITE_BUSY without waiting on the busy timeout.
pub async fn begin_write(
    pool: &SqlitePool,
) -> Result<Transaction<'static, Sqlite>, StorageError> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

/// Tag ids of every record of a metric, keyed by record id.
pub async fn get_tag_ids_by_metric(
    connection: &mut SqliteConnection,
    metric_id: MetricId,
) -> Result<BTreeMap<RecordId, Vec<TagId>>, StorageError> {
    let rows: Vec<RecordTagRow> = sqlx::query_as(
        r#"
        SELECT rt.record_id, rt.tag_id
        FROM metric_record_tags rt
        JOIN metric_records r ON r.id = rt.record_id
        WHERE r.metric_id = ?
        ORDER BY rt.record_id ASC, rt.tag_id ASC
        "#,
    )
    .bind(metric_id)
    .fetch_all(connection)
    .await?;

    Ok(group_tag_rows(rows))
}

pub async fn get_tag_ids_by_record(
    connection: &mut SqliteConnection,
    record_id: RecordId,
) -> Result<Vec<TagId>, StorageError> {
    let rows: Vec<RecordTagRow> = sqlx::query_as(
        r#"
        SELECT record_id, tag_id
        FROM metric_record_tags
        WHERE record_id = ?
        ORDER BY tag_id ASC
        "#,
    )
    .bind(record_id)
    .fetch_all(connection)
    .await?;

    Ok(rows.into_iter().map(|row| row.tag_id).collect())
}

/// Returns the ids among `tag_ids` that have no matching tag.
pub async fn find_unknown_tag_ids(
    connection: &mut SqliteConnection,
    tag_ids: &[TagId],
) -> Result<Vec<TagId>, StorageError> {
    let mut unknown = Vec::new();
    for tag_id in tag_ids {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM tags WHERE id = ?")
            .bind(tag_id)
            .fetch_optional(&mut *connection)
            .await?;
        if found.is_none() {
            unknown.push(*tag_id);
        }
    }
    Ok(unknown)
}
