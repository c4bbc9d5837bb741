//! Hour-granular index from timestamps to byte offsets.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{format_timestamp, parse_timestamp_key, truncate_to_hour};

/// Maps hour-truncated timestamps to the byte offset of the first line
/// logged in that hour.
///
/// Built once per file by a [`LogReader`](crate::reader::LogReader) and never
/// mutated afterwards. Lookups are hour-granular only: callers truncate the
/// requested time before asking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeIndex {
    hours: BTreeMap<NaiveDateTime, u64>,
}

impl TimeIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index from `(hour-string, offset)` pairs as produced by
    /// external index builders. Keys that do not parse are dropped; the
    /// first offset seen for an hour wins.
    pub fn from_hour_strings<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, u64)>,
        K: AsRef<str>,
    {
        let mut index = Self::new();
        for (key, offset) in entries {
            if let Some(tm) = parse_timestamp_key(key.as_ref()) {
                index.record(tm, offset);
            }
        }
        index
    }

    /// Records `offset` for the hour containing `tm` unless that hour is
    /// already indexed.
    pub(crate) fn record(&mut self, tm: NaiveDateTime, offset: u64) {
        self.hours.entry(truncate_to_hour(tm)).or_insert(offset);
    }

    /// Offset of the exact hour `hour`.
    pub fn offset_of(&self, hour: NaiveDateTime) -> Option<u64> {
        self.hours.get(&hour).copied()
    }

    /// First indexed hour in `[from, until)` with its offset.
    pub fn first_between(&self, from: NaiveDateTime, until: NaiveDateTime) -> Option<(NaiveDateTime, u64)> {
        if from >= until {
            return None;
        }
        self.hours
            .range(from..until)
            .next()
            .map(|(hour, offset)| (*hour, *offset))
    }

    /// Number of indexed hours.
    pub fn len(&self) -> usize {
        self.hours.len()
    }

    /// Whether the index has no entries.
    pub fn is_empty(&self) -> bool {
        self.hours.is_empty()
    }

    /// Iterates `(hour-string, offset)` pairs in time order.
    pub fn hour_strings(&self) -> impl Iterator<Item = (String, u64)> + '_ {
        self.hours
            .iter()
            .map(|(hour, offset)| (format_timestamp(*hour), *offset))
    }
}
