use super::{MetricId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

pub const METRIC_NAME_MAX_LENGTH: usize = 256;

/// A named, user-owned time series definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Metric {
    pub id: MetricId,

    /// The display name, unique per owner.
    pub name: String,

    pub description: Option<String>,

    /// Creation time, RFC 3339 in UTC.
    pub created_at: String,

    #[serde(skip)]
    pub owner_id: UserId,

    /// Bumped on every rename. Records remember the version their name was copied from.
    #[serde(skip)]
    pub name_version: i64,
}

impl Metric {
    pub fn new(
        id: MetricId,
        name: String,
        description: Option<String>,
        created_at: String,
        owner_id: UserId,
        name_version: i64,
    ) -> Self {
        Self {
            id,
            name,
            description,
            created_at,
            owner_id,
            name_version,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Fields accepted when a metric is created.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct NewMetric {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial update of a metric. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct MetricChanges {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl MetricChanges {
    pub fn apply(&self, metric: &mut Metric) {
        if let Some(name) = &self.name {
            metric.name = name.trim().to_string();
        }
        if let Some(description) = &self.description {
            metric.description = Some(description.clone());
        }
    }
}

/// Checks a metric name before it reaches the store.
pub fn validate_metric_name(name: &str) -> Result<(), String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("This field may not be blank.".to_string());
    }
    if name.chars().count() > METRIC_NAME_MAX_LENGTH {
        return Err(format!(
            "Ensure this field has no more than {} characters.",
            METRIC_NAME_MAX_LENGTH
        ));
    }
    Ok(())
}
