//! Timestamp utilities
//!
//! The store keeps every timestamp as epoch milliseconds (UTC).

use chrono::{DateTime, TimeZone, Utc};

/// Milliseconds in one hour
pub const HOUR_MS: i64 = 60 * 60 * 1000;

/// Milliseconds in one day
pub const DAY_MS: i64 = 24 * HOUR_MS;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current time as epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert epoch milliseconds to a UTC datetime
///
/// Out-of-range values clamp to the Unix epoch.
pub fn from_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Calendar day (`YYYY-MM-DD`, UTC) of an epoch millisecond timestamp
pub fn day_stamp(millis: i64) -> String {
    from_millis(millis).format("%Y-%m-%d").to_string()
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}
