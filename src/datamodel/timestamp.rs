use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// 2020-01-01T00:00:00Z
pub const MIN_TIMESTAMP: i64 = 1_577_836_800;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TimestampError {
    #[error("Timestamp must be a positive number.")]
    NonPositive,

    #[error(
        "Timestamp {timestamp} is out of range: it must be after 2020-01-01 and not in the future."
    )]
    OutOfRange { timestamp: i64, now: i64 },
}

/// Current wall clock as Unix seconds.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Validates a Unix timestamp in seconds against the ingestion window.
///
/// The upper bound is read from the clock on every call.
pub fn validate_unix_timestamp(timestamp: i64) -> Result<(), TimestampError> {
    validate_unix_timestamp_at(timestamp, unix_now())
}

/// Same as [`validate_unix_timestamp`] with an explicit `now`.
pub fn validate_unix_timestamp_at(timestamp: i64, now: i64) -> Result<(), TimestampError> {
    if timestamp <= 0 {
        return Err(TimestampError::NonPositive);
    }
    if !(MIN_TIMESTAMP..=now).contains(&timestamp) {
        return Err(TimestampError::OutOfRange { timestamp, now });
    }
    Ok(())
}
