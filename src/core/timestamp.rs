//! Timestamp helpers
//!
//! Every wire format renders record time as ISO 8601 UTC with millisecond
//! precision, whatever representation the time arrived in.

use chrono::{DateTime, Utc};
use std::time::SystemTime;

/// `2025-01-08T10:30:45.123Z`
pub const ISO8601_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Record time as supplied by an upstream engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeInput {
    EpochMillis(i64),
    DateTime(DateTime<Utc>),
    System(SystemTime),
}

impl TimeInput {
    /// Resolve to UTC; out-of-range epoch values clamp to the epoch origin
    pub fn to_utc(self) -> DateTime<Utc> {
        match self {
            TimeInput::EpochMillis(ms) => {
                DateTime::from_timestamp_millis(ms).unwrap_or(DateTime::UNIX_EPOCH)
            }
            TimeInput::DateTime(dt) => dt,
            TimeInput::System(st) => st.into(),
        }
    }
}

impl From<i64> for TimeInput {
    fn from(ms: i64) -> Self {
        TimeInput::EpochMillis(ms)
    }
}

impl From<DateTime<Utc>> for TimeInput {
    fn from(dt: DateTime<Utc>) -> Self {
        TimeInput::DateTime(dt)
    }
}

impl From<SystemTime> for TimeInput {
    fn from(st: SystemTime) -> Self {
        TimeInput::System(st)
    }
}

#[must_use]
pub fn to_iso8601(datetime: &DateTime<Utc>) -> String {
    datetime.format(ISO8601_FORMAT).to_string()
}
