use super::{MetricId, RecordId, TagId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// One timestamped value belonging to a metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MetricRecord {
    pub id: RecordId,

    #[serde(rename = "metric")]
    pub metric_id: MetricId,

    /// Copy of the metric name, kept in sync by rename propagation.
    pub metric_name: Option<String>,

    #[schema(value_type = String, example = "21.5000")]
    pub value: Decimal,

    /// Unix timestamp in seconds.
    pub timestamp: i64,

    /// Linked tag ids, ascending.
    #[serde(rename = "tags")]
    pub tag_ids: Vec<TagId>,

    #[serde(skip)]
    pub metric_name_version: i64,
}

impl fmt::Display for MetricRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} @ {}",
            self.metric_name.as_deref().unwrap_or("<unnamed>"),
            self.value,
            self.timestamp
        )
    }
}

/// Payload of a record submission.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct NewRecord {
    #[schema(value_type = String, example = "21.5")]
    pub value: Decimal,
    pub timestamp: i64,
    #[serde(default)]
    pub tags: Vec<TagId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_record_serialization() {
        let record = MetricRecord {
            id: 12,
            metric_id: 3,
            metric_name: Some("temperature".to_string()),
            value: Decimal::from_str("21.5000").unwrap(),
            timestamp: 1_704_067_200,
            tag_ids: vec![1, 2],
            metric_name_version: 4,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 12,
                "metric": 3,
                "metric_name": "temperature",
                "value": "21.5000",
                "timestamp": 1_704_067_200,
                "tags": [1, 2],
            })
        );
        assert_eq!(format!("{}", record), "temperature: 21.5000 @ 1704067200");
    }

    #[test]
    fn test_new_record_accepts_string_and_number_values() {
        let payload: NewRecord =
            serde_json::from_str(r#"{"value": "10.25", "timestamp": 1704067200}"#).unwrap();
        assert_eq!(payload.value, Decimal::from_str("10.25").unwrap());
        assert!(payload.tags.is_empty());

        let payload: NewRecord =
            serde_json::from_str(r#"{"value": 3, "timestamp": 1704067200, "tags": [4]}"#)
                .unwrap();
        assert_eq!(payload.value, Decimal::from(3));
        assert_eq!(payload.tags, vec![4]);
    }
}
