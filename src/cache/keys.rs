use crate::datamodel::{MetricId, UserId};

/// Cache key of a record listing, scoped to the requesting user.
///
/// Both parts are integers and `:` separates them, so distinct pairs never share a key.
pub fn metric_records_cache_key(metric_id: MetricId, user_id: UserId) -> String {
    format!("metric:{}:{}:records", metric_id, user_id)
}
