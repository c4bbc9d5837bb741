//! Hand-off point to an external latency histogram aggregator.

use chrono::{Duration, NaiveDateTime};

use crate::scan::TimedLine;

/// Parameters handed to a [`LatencyAggregator`] along with the line stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatencyRequest {
    /// Histogram name to look for; the first search term.
    pub term: String,
    /// Aggregation slice width.
    pub slice_duration: Duration,
    /// Later of the process start and the file's first timestamp.
    pub start: NaiveDateTime,
    /// End of the process window.
    pub end: NaiveDateTime,
    /// Number of latency buckets to report.
    pub bucket_count: usize,
    /// Report every Nth bucket only.
    pub every_nth_bucket: usize,
    /// Whether bucket values are rounded.
    pub rounding: bool,
}

/// Turns a stream of matching lines into time-keyed histograms.
///
/// The scanner only drives the stream; parsing histogram lines and the
/// histogram representation belong to the implementor.
pub trait LatencyAggregator {
    /// Histogram produced per reported time.
    type Histogram;

    /// Lazily aggregates `lines` according to `request`.
    fn compute_latency<'a>(
        &'a self,
        lines: Box<dyn Iterator<Item = TimedLine> + 'a>,
        request: LatencyRequest,
    ) -> Box<dyn Iterator<Item = (NaiveDateTime, Self::Histogram)> + 'a>;
}
