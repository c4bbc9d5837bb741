//! Per-slice counter sums and their change against the previous sampled
//! slice.

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::{json, Value};

use crate::timeline::{format_timestamp, serialize_timestamp};

/// One emitted diff row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffRecord {
    /// Start of the slice the values were summed over.
    #[serde(serialize_with = "serialize_timestamp")]
    pub slice_start: NaiveDateTime,
    /// Elementwise sum of the slice's counter vectors.
    pub value: Vec<i64>,
    /// `value` minus the previous sampled slice's value.
    pub diff: Vec<i64>,
}

impl DiffRecord {
    /// Keyed form: `{"value": {"<ts>": [..]}, "diff": {"<ts>": [..]}}`.
    pub fn to_record(&self) -> Value {
        let key = format_timestamp(self.slice_start);
        json!({
            "value": { key.clone(): self.value },
            "diff": { key: self.diff },
        })
    }
}

/// Running state of the diff view.
///
/// Values of the active slice accumulate in `slice_val`; closing a sampled
/// slice compares it with `prev` and makes it the new `prev`. Closing an
/// unsampled slice only drops its values.
#[derive(Debug, Clone, Default)]
pub struct DiffAccumulator {
    prev: Vec<i64>,
    slice_val: Vec<i64>,
    upper_limit: Option<i64>,
}

impl DiffAccumulator {
    /// Creates an accumulator with an optional noise floor.
    pub fn new(upper_limit: Option<i64>) -> Self {
        Self {
            upper_limit,
            ..Self::default()
        }
    }

    /// Adds one line's counter vector to the active slice.
    ///
    /// Vectors of different widths sum over the shorter width.
    pub fn add(&mut self, values: &[i64]) {
        if self.slice_val.is_empty() {
            self.slice_val = values.to_vec();
        } else {
            self.slice_val = self
                .slice_val
                .iter()
                .zip(values)
                .map(|(acc, v)| acc.saturating_add(*v))
                .collect();
        }
    }

    /// Values summed into the active slice so far.
    pub fn slice_values(&self) -> &[i64] {
        &self.slice_val
    }

    /// Value of the last closed sampled slice.
    pub fn previous(&self) -> &[i64] {
        &self.prev
    }

    /// Applies the noise floor to the active slice.
    ///
    /// Without a previous value the diff is the raw value. A record survives
    /// when there is no threshold or some diff element reaches it; otherwise
    /// both halves come back empty.
    pub fn value_and_diff(&self) -> (Vec<i64>, Vec<i64>) {
        let diff: Vec<i64> = if self.prev.is_empty() {
            self.slice_val.clone()
        } else {
            self.slice_val
                .iter()
                .zip(&self.prev)
                .map(|(cur, prev)| cur.saturating_sub(*prev))
                .collect()
        };
        match self.upper_limit {
            Some(limit) if !diff.iter().any(|d| *d >= limit) => (Vec::new(), Vec::new()),
            _ => (self.slice_val.clone(), diff),
        }
    }

    /// Closes a sampled slice: returns its record when both value and diff
    /// are non-empty, then makes its values the new baseline.
    pub fn close_sampled(&mut self, slice_start: NaiveDateTime) -> Option<DiffRecord> {
        let (value, diff) = self.value_and_diff();
        self.prev = std::mem::take(&mut self.slice_val);
        (!value.is_empty() && !diff.is_empty()).then_some(DiffRecord {
            slice_start,
            value,
            diff,
        })
    }

    /// Drops the values of an unsampled slice; the baseline is untouched.
    pub fn discard(&mut self) {
        self.slice_val.clear();
    }

    /// Emits the final slice at end of stream without moving the baseline.
    pub fn finish(&mut self, slice_start: NaiveDateTime) -> Option<DiffRecord> {
        if self.slice_val.is_empty() {
            return None;
        }
        let (value, diff) = self.value_and_diff();
        self.slice_val.clear();
        (!value.is_empty() && !diff.is_empty()).then_some(DiffRecord {
            slice_start,
            value,
            diff,
        })
    }
}
