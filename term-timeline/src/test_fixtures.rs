//! Synthetic server logs for tests and benchmarks.
//!
//! Fixtures are written to temporary files that are deleted when the
//! returned handle is dropped.

use std::io::Write;

use chrono::{Duration, NaiveDateTime};
use tempfile::NamedTempFile;

use crate::counter::CounterShape;
use crate::error::Result;
use crate::timeline::{format_timestamp, parse_timestamp_key};

/// Start time shared by the fixtures: `Jan 05 2024 13:00:00`.
pub fn fixture_start() -> NaiveDateTime {
    parse_timestamp_key("Jan 05 2024 13:00:00").unwrap_or_default()
}

/// Formats one server log line.
pub fn log_line(tm: NaiveDateTime, message: &str) -> String {
    format!("{} GMT: INFO (info): (fixture.c:42) {message}", format_timestamp(tm))
}

/// Formats a line carrying `values` next to `term` in the given layout.
pub fn counter_line(tm: NaiveDateTime, term: &str, shape: CounterShape, values: &[i64]) -> String {
    let joined = values
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let first = values.first().copied().unwrap_or_default();
    let second = values.get(1).copied().unwrap_or_default();
    let message = match shape {
        CounterShape::Single => format!("{term} {first}"),
        CounterShape::CommaList => format!("{term} ({joined})"),
        CounterShape::PairBefore => format!("{first}({second}) {term}"),
        CounterShape::OpenGroup => format!("{term} ({first} total"),
    };
    log_line(tm, &message)
}

/// Writes `lines` to a temporary file, one per line.
pub fn write_log<I, S>(lines: I) -> Result<NamedTempFile>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut file = NamedTempFile::new()?;
    for line in lines {
        writeln!(file, "{}", line.as_ref())?;
    }
    file.flush()?;
    Ok(file)
}

/// `count` lines spread evenly over `span` seconds from [`fixture_start`],
/// plus one closing line at exactly `start + span`. Every `every`-th line
/// (starting with the first) contains `term`.
pub fn evenly_spaced_log(count: usize, span: Duration, term: &str, every: usize) -> Result<NamedTempFile> {
    let start = fixture_start();
    let span_secs = span.num_seconds();
    let every = every.max(1);
    let lines = (0..count)
        .map(|i| {
            let offset = span_secs * i as i64 / count.max(1) as i64;
            let tm = start + Duration::seconds(offset);
            if i % every == 0 {
                log_line(tm, &format!("{term} event {i}"))
            } else {
                log_line(tm, &format!("heartbeat {i}"))
            }
        })
        .chain(std::iter::once(log_line(start + span, "closing heartbeat")));
    write_log(lines)
}

/// Number of lines [`evenly_spaced_log`] writes with the term.
pub fn expected_matches(count: usize, every: usize) -> usize {
    let every = every.max(1);
    (count + every - 1) / every
}
