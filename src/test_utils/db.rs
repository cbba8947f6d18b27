use crate::datamodel::{Metric, NewMetric, UserId, normalize_record_value};
use crate::storage::sqlite::SqliteStorage;
use crate::storage::{RecordDraft, StorageInstance};
use rust_decimal::Decimal;
use std::path::Path;
use std::sync::Arc;

/// Fresh, migrated, in-memory SQLite store.
///
/// The pool holds a single connection, so transactions never overlap.
/// Panics when the store cannot be created.
pub async fn memory_storage() -> Arc<dyn StorageInstance> {
    migrated_storage("sqlite::memory:").await
}

/// Migrated SQLite store in a database file, with a pool of several
/// connections. Use it when transactions have to run concurrently.
pub async fn file_storage(path: &Path) -> Arc<dyn StorageInstance> {
    migrated_storage(&format!("sqlite://{}", path.display())).await
}

async fn migrated_storage(connection_string: &str) -> Arc<dyn StorageInstance> {
    let storage = SqliteStorage::connect(connection_string)
        .await
        .expect("Failed to create storage");
    storage
        .create_or_migrate()
        .await
        .expect("Failed to migrate storage");
    Arc::new(storage)
}

/// Creates a metric with one record per timestamp. Record values count up from 1.
pub async fn seed_metric(
    storage: &Arc<dyn StorageInstance>,
    owner_id: UserId,
    name: &str,
    timestamps: &[i64],
) -> Metric {
    let metric = storage
        .create_metric(
            owner_id,
            &NewMetric {
                name: name.to_string(),
                description: None,
            },
        )
        .await
        .expect("Failed to create metric");

    for (index, timestamp) in timestamps.iter().enumerate() {
        let draft = RecordDraft {
            value: normalize_record_value(Decimal::from(index as i64 + 1))
                .expect("Seed values are valid"),
            timestamp: *timestamp,
            tag_ids: vec![],
        };
        storage
            .create_record(&metric, &draft)
            .await
            .expect("Failed to create record");
    }

    metric
}
