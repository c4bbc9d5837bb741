//! Scan parameters, validated once at configure time.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TimelineError};

/// Minimum bytes read per block before the filter is tested.
pub const DEFAULT_BLOCK_BYTES: usize = 1024;

/// Every Nth non-matching block read in one search is returned as its
/// trailing line so callers regain control in long quiet regions.
pub const DEFAULT_FORCED_RETURN_EVERY: usize = 5;

/// Padding added past the last timestamp of the file to form the default end
/// of the process window.
pub const END_PADDING_SECS: i64 = 10;

/// Default slice width.
pub const DEFAULT_SLICE_SECS: i64 = 10;

/// Default number of latency buckets.
pub const DEFAULT_BUCKET_COUNT: usize = 3;

/// How multiple search terms combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TermMode {
    /// Every term must occur.
    And,
    /// At least one term must occur.
    #[default]
    Or,
}

/// Where the process window starts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StartTime {
    /// First timestamp of the file.
    #[default]
    Head,
    /// Absolute timestamp.
    At(NaiveDateTime),
    /// Expression resolved by the reader against the file's last timestamp,
    /// such as `-1h`.
    Relative(String),
}

/// Immutable parameters for one scan.
///
/// # Examples
///
/// ```rust
/// use chrono::Duration;
/// use term_timeline::scan::{ScanConfig, TermMode};
///
/// let config = ScanConfig::builder()
///     .term("migrate")
///     .term("rebalance")
///     .mode(TermMode::Or)
///     .ignore("DEBUG")
///     .slice_duration(Duration::seconds(30))
///     .every_nth_slice(2)
///     .build()
///     .unwrap();
/// assert_eq!(config.terms().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub(crate) terms: Vec<String>,
    pub(crate) mode: TermMode,
    pub(crate) ignore: Option<String>,
    pub(crate) case_sensitive: bool,
    pub(crate) start: StartTime,
    pub(crate) duration: Option<Duration>,
    pub(crate) slice_duration: Duration,
    pub(crate) upper_limit: Option<i64>,
    pub(crate) bucket_count: usize,
    pub(crate) every_nth_bucket: usize,
    pub(crate) every_nth_slice: usize,
    pub(crate) read_all_lines: bool,
    pub(crate) rounding: bool,
    pub(crate) system_grep: bool,
    pub(crate) block_bytes: usize,
    pub(crate) forced_return_every: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            terms: Vec::new(),
            mode: TermMode::Or,
            ignore: None,
            case_sensitive: true,
            start: StartTime::Head,
            duration: None,
            slice_duration: Duration::seconds(DEFAULT_SLICE_SECS),
            upper_limit: None,
            bucket_count: DEFAULT_BUCKET_COUNT,
            every_nth_bucket: 1,
            every_nth_slice: 1,
            read_all_lines: false,
            rounding: true,
            system_grep: false,
            block_bytes: DEFAULT_BLOCK_BYTES,
            forced_return_every: DEFAULT_FORCED_RETURN_EVERY,
        }
    }
}

impl ScanConfig {
    /// Starts a builder with default values.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Search terms in the order given.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// First search term, the one counters and latency key on.
    pub fn primary_term(&self) -> Option<&str> {
        self.terms.first().map(String::as_str)
    }

    /// AND/OR combination.
    pub fn mode(&self) -> TermMode {
        self.mode
    }

    /// Ignore substring.
    pub fn ignore(&self) -> Option<&str> {
        self.ignore.as_deref()
    }

    /// Whether matching is case sensitive.
    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Requested start.
    pub fn start(&self) -> &StartTime {
        &self.start
    }

    /// Requested duration of the process window.
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Width of a slice.
    pub fn slice_duration(&self) -> Duration {
        self.slice_duration
    }

    /// Noise floor for diff reporting.
    pub fn upper_limit(&self) -> Option<i64> {
        self.upper_limit
    }

    /// Number of latency buckets.
    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    /// Latency bucket sampling.
    pub fn every_nth_bucket(&self) -> usize {
        self.every_nth_bucket
    }

    /// Slice sampling throttle.
    pub fn every_nth_slice(&self) -> usize {
        self.every_nth_slice
    }

    /// Whether filtering is bypassed.
    pub fn read_all_lines(&self) -> bool {
        self.read_all_lines
    }

    /// Latency rounding flag.
    pub fn rounding(&self) -> bool {
        self.rounding
    }

    /// Whether the reader's grep fast path should be tried.
    pub fn system_grep(&self) -> bool {
        self.system_grep
    }

    /// Minimum block size in bytes.
    pub fn block_bytes(&self) -> usize {
        self.block_bytes
    }

    /// Forced-return period in blocks.
    pub fn forced_return_every(&self) -> usize {
        self.forced_return_every
    }

    /// Checks the invariants the scanner relies on.
    pub fn validate(&self) -> Result<()> {
        if self.slice_duration <= Duration::zero() {
            return Err(TimelineError::configuration(format!(
                "slice duration must be positive, got {}s",
                self.slice_duration.num_seconds()
            )));
        }
        if self.slice_duration.num_seconds() == 0 {
            return Err(TimelineError::configuration(
                "slice duration must be at least one second",
            ));
        }
        if let Some(duration) = self.duration {
            if duration <= Duration::zero() {
                return Err(TimelineError::configuration("duration must be positive"));
            }
        }
        for (name, value) in [
            ("every_nth_slice", self.every_nth_slice),
            ("bucket_count", self.bucket_count),
            ("every_nth_bucket", self.every_nth_bucket),
            ("block_bytes", self.block_bytes),
            ("forced_return_every", self.forced_return_every),
        ] {
            if value == 0 {
                return Err(TimelineError::configuration(format!(
                    "{name} must be at least 1"
                )));
            }
        }
        if self.terms.iter().any(|t| t.is_empty()) {
            return Err(TimelineError::configuration("search terms must not be empty"));
        }
        Ok(())
    }
}

/// Builder for [`ScanConfig`].
#[derive(Debug, Clone, Default)]
pub struct ScanConfigBuilder {
    config: ScanConfig,
}

impl ScanConfigBuilder {
    /// Adds a search term.
    pub fn term(mut self, term: impl Into<String>) -> Self {
        self.config.terms.push(term.into());
        self
    }

    /// Replaces all search terms.
    pub fn terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.terms = terms.into_iter().map(Into::into).collect();
        self
    }

    /// Sets AND/OR combination.
    pub fn mode(mut self, mode: TermMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Drops lines containing `ignore`.
    pub fn ignore(mut self, ignore: impl Into<String>) -> Self {
        let ignore = ignore.into();
        self.config.ignore = (!ignore.is_empty()).then_some(ignore);
        self
    }

    /// Literal matching when true, case-insensitive regex otherwise.
    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.config.case_sensitive = case_sensitive;
        self
    }

    /// Sets the start of the process window.
    pub fn start(mut self, start: StartTime) -> Self {
        self.config.start = start;
        self
    }

    /// Limits the process window length.
    pub fn duration(mut self, duration: Duration) -> Self {
        self.config.duration = Some(duration);
        self
    }

    /// Sets the slice width.
    pub fn slice_duration(mut self, slice_duration: Duration) -> Self {
        self.config.slice_duration = slice_duration;
        self
    }

    /// Sets the diff noise floor.
    pub fn upper_limit(mut self, upper_limit: i64) -> Self {
        self.config.upper_limit = Some(upper_limit);
        self
    }

    /// Sets the number of latency buckets.
    pub fn bucket_count(mut self, bucket_count: usize) -> Self {
        self.config.bucket_count = bucket_count;
        self
    }

    /// Sets the latency bucket sampling.
    pub fn every_nth_bucket(mut self, every_nth_bucket: usize) -> Self {
        self.config.every_nth_bucket = every_nth_bucket;
        self
    }

    /// Keeps only every Nth slice in the diff view.
    pub fn every_nth_slice(mut self, every_nth_slice: usize) -> Self {
        self.config.every_nth_slice = every_nth_slice;
        self
    }

    /// Returns every line, bypassing term and ignore filters.
    pub fn read_all_lines(mut self, read_all_lines: bool) -> Self {
        self.config.read_all_lines = read_all_lines;
        self
    }

    /// Latency rounding flag.
    pub fn rounding(mut self, rounding: bool) -> Self {
        self.config.rounding = rounding;
        self
    }

    /// Tries the reader's grep fast path first.
    pub fn system_grep(mut self, system_grep: bool) -> Self {
        self.config.system_grep = system_grep;
        self
    }

    /// Overrides the block size.
    pub fn block_bytes(mut self, block_bytes: usize) -> Self {
        self.config.block_bytes = block_bytes;
        self
    }

    /// Overrides the forced-return period.
    pub fn forced_return_every(mut self, forced_return_every: usize) -> Self {
        self.config.forced_return_every = forced_return_every;
        self
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> Result<ScanConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
