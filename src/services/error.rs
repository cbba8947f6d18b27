use crate::datamodel::{TimestampError, ValueError};
use crate::storage::StorageError;
use thiserror::Error;

/// Errors surfaced to callers of the services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Bad input, attached to the offending field.
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Missing, or not owned by the caller.
    #[error("Not found.")]
    NotFound,

    #[error("A record already exists for timestamp {timestamp}.")]
    DuplicateTimestamp { timestamp: i64 },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ServiceError::Validation {
            field,
            message: message.into(),
        }
    }

    /// Field a client error is attached to, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ServiceError::Validation { field, .. } => Some(field),
            ServiceError::DuplicateTimestamp { .. } => Some("timestamp"),
            _ => None,
        }
    }

    /// Message without the field prefix.
    pub fn message(&self) -> String {
        match self {
            ServiceError::Validation { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::DuplicateTimestamp { timestamp, .. } => {
                ServiceError::DuplicateTimestamp { timestamp }
            }
            StorageError::UnknownTags { tag_ids } => ServiceError::validation(
                "tags",
                format!(
                    "Invalid pk {} - object does not exist.",
                    tag_ids
                        .iter()
                        .map(|id| format!("\"{}\"", id))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            ),
            StorageError::DuplicateMetricName { .. } => {
                ServiceError::validation("name", "A metric with this name already exists.")
            }
            StorageError::DuplicateTagName { .. } => {
                ServiceError::validation("name", "A tag with this name already exists.")
            }
            StorageError::MetricNotFound { .. } | StorageError::RecordNotFound { .. } => {
                ServiceError::NotFound
            }
            other => ServiceError::Internal(other.into()),
        }
    }
}

impl From<TimestampError> for ServiceError {
    fn from(error: TimestampError) -> Self {
        ServiceError::validation("timestamp", error.to_string())
    }
}

impl From<ValueError> for ServiceError {
    fn from(error: ValueError) -> Self {
        ServiceError::validation("value", error.to_string())
    }
}
