//! Timestamp utilities for store epoch-millisecond fields.

use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;

/// Represents a timestamp that can be serialized/deserialized.
pub type Timestamp = DateTime<Utc>;

/// Errors that can occur during timestamp conversion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    /// The millisecond value is outside the range chrono can represent.
    #[error("Epoch milliseconds out of range: {0}")]
    OutOfRange(i64),
}

/// Returns the current UTC time as an ISO 8601 formatted string.
///
/// # Examples
///
/// ```
/// use runresolver::utils::iso_timestamp;
///
/// let ts = iso_timestamp();
/// assert!(ts.contains('T'));
/// assert!(ts.ends_with("+00:00"));
/// ```
#[must_use]
pub fn iso_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f+00:00").to_string()
}

/// Returns the current UTC timestamp.
#[must_use]
pub fn now_utc() -> Timestamp {
    Utc::now()
}

/// Converts milliseconds since the Unix epoch into a UTC timestamp.
///
/// # Errors
///
/// Returns `TimestampError::OutOfRange` if chrono cannot represent the value.
pub fn from_epoch_millis(millis: i64) -> Result<Timestamp, TimestampError> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or(TimestampError::OutOfRange(millis))
}

/// Converts a UTC timestamp into milliseconds since the Unix epoch.
#[must_use]
pub fn to_epoch_millis(ts: &Timestamp) -> i64 {
    ts.timestamp_millis()
}
