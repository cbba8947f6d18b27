use crate::datamodel::MetricId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Work handed to the task queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Job {
    /// Copy a metric's new name onto its records.
    RenameRecords {
        metric_id: MetricId,
        new_name: String,
        /// Name version of the metric after the rename.
        version: i64,
    },
}

impl Job {
    pub fn name(&self) -> &'static str {
        match self {
            Job::RenameRecords { .. } => "rename_records",
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Job::RenameRecords {
                metric_id,
                new_name,
                version,
            } => write!(
                f,
                "rename_records(metric_id={}, new_name='{}', version={})",
                metric_id, new_name, version
            ),
        }
    }
}
