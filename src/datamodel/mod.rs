pub mod metric;
pub mod record;
pub mod tag;
pub mod timestamp;
pub mod value;

pub type UserId = i64;
pub type MetricId = i64;
pub type RecordId = i64;
pub type TagId = i64;

pub use metric::{Metric, MetricChanges, NewMetric};
pub use record::{MetricRecord, NewRecord};
pub use tag::{NewTag, Tag};
pub use timestamp::{TimestampError, validate_unix_timestamp};
pub use value::{ValueError, normalize_record_value};
