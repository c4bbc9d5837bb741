//! File-level primitives: the fixed timestamp format, the hour index and
//! the owned log file handle.

pub mod index;
pub mod log_file;

pub use index::TimeIndex;
pub use log_file::LogFile;

use chrono::{NaiveDateTime, Timelike};

/// Text format of every timestamp key, both in log lines and emitted records.
///
/// Example: `Jan 05 2024 13:45:02`.
pub const TIMESTAMP_FORMAT: &str = "%b %d %Y %H:%M:%S";

/// Byte length of a timestamp rendered with [`TIMESTAMP_FORMAT`].
pub const TIMESTAMP_LEN: usize = 20;

/// Renders a timestamp with [`TIMESTAMP_FORMAT`].
pub fn format_timestamp(tm: NaiveDateTime) -> String {
    tm.format(TIMESTAMP_FORMAT).to_string()
}

/// Parses a timestamp rendered with [`TIMESTAMP_FORMAT`].
pub fn parse_timestamp_key(key: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(key.trim(), TIMESTAMP_FORMAT).ok()
}

/// Drops minutes, seconds and sub-second precision.
pub fn truncate_to_hour(tm: NaiveDateTime) -> NaiveDateTime {
    tm.date()
        .and_hms_opt(tm.hour(), 0, 0)
        .unwrap_or(tm)
}

/// Serializes a timestamp as a [`TIMESTAMP_FORMAT`] string.
pub fn serialize_timestamp<S>(tm: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(&tm.format(TIMESTAMP_FORMAT))
}
