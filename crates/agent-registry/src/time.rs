//! Timestamp helpers. Registry timestamps are Unix epoch microseconds.

use chrono::{DateTime, SecondsFormat, Utc};

/// Current time in microseconds since the Unix epoch.
///
/// Clocks set before 1970 report 0.
pub fn now_micros() -> u64 {
    u64::try_from(Utc::now().timestamp_micros()).unwrap_or(0)
}

/// Render a microsecond timestamp as RFC 3339 (UTC, second precision).
pub fn micros_to_rfc3339(micros: u64) -> String {
    let secs = i64::try_from(micros / 1_000_000).unwrap_or(i64::MAX);
    let nsecs = ((micros % 1_000_000) * 1000) as u32;
    DateTime::from_timestamp(secs, nsecs)
        .unwrap_or(DateTime::UNIX_EPOCH)
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}
