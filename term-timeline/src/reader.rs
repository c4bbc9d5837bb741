//! The reader collaborator: timestamp parsing, hour indexing and time
//! expression parsing for one log format.
//!
//! The scanner never interprets log text itself; everything format-specific
//! goes through [`LogReader`]. [`ServerLogReader`] handles server logs whose
//! lines begin with a [`TIMESTAMP_FORMAT`] timestamp:
//!
//! ```text
//! Jan 05 2024 13:45:02 GMT: INFO (info): (ticker.c:160) cluster-size 3
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::{Duration, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument};

use crate::error::{ErrorContext, Result, TimelineError};
use crate::scan::TermMode;
use crate::timeline::{parse_timestamp_key, TimeIndex, TIMESTAMP_FORMAT, TIMESTAMP_LEN};

/// Arguments for an external grep fast path.
#[derive(Debug, Clone, Copy)]
pub struct GrepRequest<'a> {
    /// Search terms.
    pub terms: &'a [String],
    /// Lines containing this substring are dropped.
    pub ignore: Option<&'a str>,
    /// File to search.
    pub path: &'a Path,
    /// Whether all terms or any term must match.
    pub mode: TermMode,
    /// Literal case-sensitive match vs case-insensitive.
    pub case_sensitive: bool,
}

/// Format-specific operations the scanner depends on.
pub trait LogReader {
    /// Builds the hour → byte offset index for `path`.
    fn build_time_index(&self, path: &Path) -> Result<TimeIndex>;

    /// Extracts the timestamp a line starts with.
    fn parse_timestamp(&self, line: &str) -> Option<NaiveDateTime>;

    /// Resolves a start-time expression against the last timestamp of the file.
    fn parse_relative_time(&self, expr: &str, reference_end: NaiveDateTime) -> Result<NaiveDateTime>;

    /// Parses a duration expression.
    fn parse_duration(&self, expr: &str) -> Result<Duration>;

    /// Optional fast path returning the matching lines of the whole file,
    /// newline separated. `None` means unsupported.
    fn system_grep(&self, _request: &GrepRequest<'_>) -> Option<Result<String>> {
        None
    }
}

/// [`LogReader`] for server logs with a leading [`TIMESTAMP_FORMAT`] stamp.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerLogReader;

impl ServerLogReader {
    /// Creates a reader.
    pub fn new() -> Self {
        Self
    }
}

impl LogReader for ServerLogReader {
    #[instrument(skip(self), fields(path = %path.display()))]
    fn build_time_index(&self, path: &Path) -> Result<TimeIndex> {
        let file = File::open(path).with_context(|| format!("indexing {}", path.display()))?;
        let mut stream = BufReader::new(file);
        let mut index = TimeIndex::new();
        let mut offset = 0u64;
        let mut buf = Vec::with_capacity(256);
        loop {
            buf.clear();
            let n = stream.read_until(b'\n', &mut buf)?;
            if n == 0 {
                break;
            }
            // Only the fixed-width prefix matters; avoid decoding the rest.
            let head = String::from_utf8_lossy(&buf[..buf.len().min(TIMESTAMP_LEN)]);
            if let Some(tm) = self.parse_timestamp(&head) {
                index.record(tm, offset);
            }
            offset += n as u64;
        }
        debug!(hours = index.len(), bytes = offset, "built time index");
        Ok(index)
    }

    fn parse_timestamp(&self, line: &str) -> Option<NaiveDateTime> {
        let head = line.get(..TIMESTAMP_LEN)?;
        NaiveDateTime::parse_from_str(head, TIMESTAMP_FORMAT).ok()
    }

    fn parse_relative_time(&self, expr: &str, reference_end: NaiveDateTime) -> Result<NaiveDateTime> {
        let expr = expr.trim();
        if let Some(back) = expr.strip_prefix('-') {
            return Ok(reference_end - self.parse_duration(back)?);
        }
        parse_timestamp_key(expr).ok_or_else(|| {
            TimelineError::parse(format!(
                "'{expr}' is neither '-<duration>' nor a '{TIMESTAMP_FORMAT}' timestamp"
            ))
        })
    }

    fn parse_duration(&self, expr: &str) -> Result<Duration> {
        parse_duration(expr)
    }
}

static CLOCK_DURATION: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^(\d+):(\d{1,2}):(\d{1,2})$").expect("Hard-coded regex pattern should be valid")
});

static UNIT_DURATION: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^(?:(\d+)d)?(?:(\d+)h)?(?:(\d+)m)?(?:(\d+)s?)?$")
        .expect("Hard-coded regex pattern should be valid")
});

/// Parses `"10"` (seconds), `"1h30m"`, `"2d"`, `"45s"` or `"HH:MM:SS"`.
pub fn parse_duration(expr: &str) -> Result<Duration> {
    let expr = expr.trim().to_ascii_lowercase();
    let invalid = || TimelineError::parse(format!("invalid duration '{expr}'"));
    if expr.is_empty() {
        return Err(invalid());
    }

    let (days, hours, minutes, seconds) = if let Some(caps) = CLOCK_DURATION.captures(&expr) {
        (None, caps.get(1), caps.get(2), caps.get(3))
    } else if let Some(caps) = UNIT_DURATION.captures(&expr) {
        (caps.get(1), caps.get(2), caps.get(3), caps.get(4))
    } else {
        return Err(invalid());
    };

    let total = [(days, 86_400i64), (hours, 3_600), (minutes, 60), (seconds, 1)]
        .into_iter()
        .try_fold(0i64, |acc, (part, unit)| {
            let n = part.map_or(Ok(0), |m| m.as_str().parse::<i64>()).ok()?;
            n.checked_mul(unit)?.checked_add(acc)
        })
        .ok_or_else(invalid)?;
    Duration::try_seconds(total).ok_or_else(invalid)
}
