use crate::datamodel::{MetricId, RecordId, TagId};
use thiserror::Error;

/// Storage-specific errors that can occur during database operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database connection or query execution error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The (metric, timestamp) uniqueness constraint was violated
    #[error("A record already exists for metric {metric_id} at timestamp {timestamp}")]
    DuplicateTimestamp { metric_id: MetricId, timestamp: i64 },

    /// Some tag ids did not resolve
    #[error("Unknown tag ids: {tag_ids:?}")]
    UnknownTags { tag_ids: Vec<TagId> },

    /// The (owner, name) uniqueness constraint was violated
    #[error("A metric named '{name}' already exists")]
    DuplicateMetricName { name: String },

    #[error("A tag named '{name}' already exists")]
    DuplicateTagName { name: String },

    /// Missing, or owned by someone else. The two cases are not told apart.
    #[error("Metric not found: {metric_id}")]
    MetricNotFound { metric_id: MetricId },

    #[error("Record not found: {record_id} in metric {metric_id}")]
    RecordNotFound {
        metric_id: MetricId,
        record_id: RecordId,
    },

    /// Invalid data format in database
    #[error("Invalid data format: {message} for record {record_id}")]
    InvalidDataFormat { message: String, record_id: RecordId },
}

impl StorageError {
    pub fn invalid_data_format(message: &str, record_id: RecordId) -> Self {
        StorageError::InvalidDataFormat {
            message: message.to_string(),
            record_id,
        }
    }
}

/// True when the database refused a write because of a UNIQUE constraint.
pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db_error) if db_error.is_unique_violation())
}
