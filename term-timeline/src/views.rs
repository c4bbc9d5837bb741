//! Lazy result streams layered over a [`WindowedScanner`].
//!
//! Each view holds the scanner's cursor mutably for as long as it lives.
//! Dropping a view part way is always safe; a view that is kept resumes
//! where it stopped.

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::counter::{CounterExtractor, Extraction};
use crate::diff::{DiffAccumulator, DiffRecord};
use crate::error::{Result, TimelineError};
use crate::latency::{LatencyAggregator, LatencyRequest};
use crate::log_slice;
use crate::reader::LogReader;
use crate::scan::{TimedLine, WindowedScanner};
use crate::slice::Slice;
use crate::timeline::{format_timestamp, serialize_timestamp};

/// Key of the closing row of the count view.
pub const TOTAL_ROW_KEY: &str = "Total";

/// One row of the count view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CountRecord {
    /// Matching lines in one slice.
    Slice {
        /// Slice start.
        #[serde(serialize_with = "serialize_timestamp")]
        start: NaiveDateTime,
        /// Lines counted.
        count: u64,
    },
    /// Sum over all slices; always the last row.
    Total {
        /// Lines counted over the whole window.
        total: u64,
    },
}

impl CountRecord {
    /// Keyed form: `{"count": {"<ts>": n}}`, or `{"count": {"Total": n}}`.
    pub fn to_record(&self) -> Value {
        match self {
            CountRecord::Slice { start, count } => json!({ "count": { format_timestamp(*start): count } }),
            CountRecord::Total { total } => json!({ "count": { TOTAL_ROW_KEY: total } }),
        }
    }
}

/// Every matching line in the process window.
#[derive(Debug)]
pub struct Lines<'a, R: LogReader> {
    scanner: &'a mut WindowedScanner<R>,
}

impl<R: LogReader> Iterator for Lines<'_, R> {
    type Item = TimedLine;

    fn next(&mut self) -> Option<Self::Item> {
        self.scanner.next_line(None, None)
    }
}

/// Per-slice match counts followed by a total row.
#[derive(Debug)]
pub struct Counts<'a, R: LogReader> {
    scanner: &'a mut WindowedScanner<R>,
    slice: Slice,
    total: u64,
    finished: bool,
}

impl<R: LogReader> Iterator for Counts<'_, R> {
    type Item = CountRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let (start, end) = (self.slice.start(), self.slice.end());
        if start >= self.scanner.process_end() {
            self.finished = true;
            return Some(CountRecord::Total { total: self.total });
        }
        let mut count = 0u64;
        while self.scanner.next_line(Some(start), Some(end)).is_some() {
            count += 1;
        }
        self.total += count;
        self.slice.step();
        log_slice!(self.scanner.log_config(), %start, count, "closed count slice");
        Some(CountRecord::Slice { start, count })
    }
}

/// Sampled counter sums and their change between sampled slices.
#[derive(Debug)]
pub struct Diffs<'a, R: LogReader> {
    scanner: &'a mut WindowedScanner<R>,
    extractor: CounterExtractor,
    accumulator: DiffAccumulator,
    slice: Option<Slice>,
    finished: bool,
}

impl<R: LogReader> Diffs<'_, R> {
    /// Feeds one line's counter into the active slice.
    fn take_sample(&mut self, line: &TimedLine) {
        match self.extractor.extract(&line.text) {
            Extraction::Sample(sample) => self.accumulator.add(&sample.values),
            Extraction::NoMatch => {}
            Extraction::Unparsable => self.scanner.diagnostics_mut().counter_lines_unparsed += 1,
        }
    }

    /// Opens the first slice on the first line carrying a counter.
    fn start_on(&mut self, line: &TimedLine) {
        match self.extractor.extract(&line.text) {
            Extraction::Sample(sample) => {
                let config = self.scanner.config();
                let mut slice = Slice::first(
                    self.scanner.process_start(),
                    config.slice_duration(),
                    self.scanner.process_end(),
                    config.every_nth_slice(),
                );
                slice.advance_to(line.time);
                if slice.is_kept() {
                    self.accumulator.add(&sample.values);
                }
                debug!(shape = ?sample.shape, slice_start = %slice.start(), "counter shape locked");
                self.slice = Some(slice);
            }
            Extraction::NoMatch => self.scanner.diagnostics_mut().counter_lines_unmatched += 1,
            Extraction::Unparsable => self.scanner.diagnostics_mut().counter_lines_unparsed += 1,
        }
    }
}

impl<R: LogReader> Iterator for Diffs<'_, R> {
    type Item = DiffRecord;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            let Some(line) = self.scanner.next_line(None, None) else {
                self.finished = true;
                return self
                    .slice
                    .filter(Slice::is_kept)
                    .and_then(|slice| self.accumulator.finish(slice.start()));
            };
            let Some(mut slice) = self.slice else {
                self.start_on(&line);
                continue;
            };

            let mut emitted = None;
            if line.time >= slice.end() {
                if slice.is_kept() {
                    emitted = self.accumulator.close_sampled(slice.start());
                } else {
                    self.accumulator.discard();
                }
                slice.advance_to(line.time);
                self.slice = Some(slice);
            }
            if slice.is_kept() {
                self.take_sample(&line);
            }
            if let Some(record) = emitted {
                log_slice!(self.scanner.log_config(), slice_start = %record.slice_start, "emitted diff");
                return Some(record);
            }
        }
        None
    }
}

impl<R: LogReader> WindowedScanner<R> {
    /// Matching lines in the process window.
    pub fn lines(&mut self) -> Lines<'_, R> {
        Lines { scanner: self }
    }

    /// Match counts per slice from the process start, then a total row.
    pub fn counts(&mut self) -> Counts<'_, R> {
        let slice = Slice::first(
            self.process_start(),
            self.config().slice_duration(),
            self.process_end(),
            1,
        );
        Counts {
            scanner: self,
            slice,
            total: 0,
            finished: false,
        }
    }

    /// Counter value and diff per sampled slice, keyed on the first search
    /// term.
    pub fn diffs(&mut self) -> Result<Diffs<'_, R>> {
        let config = self.config();
        let term = config
            .primary_term()
            .ok_or_else(|| TimelineError::configuration("diff view requires a search term"))?;
        let extractor = CounterExtractor::new(term, config.case_sensitive())?;
        let accumulator = DiffAccumulator::new(config.upper_limit());
        Ok(Diffs {
            scanner: self,
            extractor,
            accumulator,
            slice: None,
            finished: false,
        })
    }

    /// Hands the line stream to `aggregator` with the window and bucket
    /// parameters of the active configuration.
    pub fn latency<'a, A: LatencyAggregator>(
        &'a mut self,
        aggregator: &'a A,
    ) -> Result<Box<dyn Iterator<Item = (NaiveDateTime, A::Histogram)> + 'a>>
    where
        R: 'a,
    {
        let config = self.config();
        let term = config
            .primary_term()
            .ok_or_else(|| TimelineError::configuration("latency view requires a search term"))?;
        let request = LatencyRequest {
            term: term.to_string(),
            slice_duration: config.slice_duration(),
            start: self.process_start().max(self.file_start()),
            end: self.process_end(),
            bucket_count: config.bucket_count(),
            every_nth_bucket: config.every_nth_bucket(),
            rounding: config.rounding(),
        };
        Ok(aggregator.compute_latency(Box::new(self.lines()), request))
    }
}
