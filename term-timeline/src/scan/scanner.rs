//! The windowed, filtered line cursor every view pulls from.

use std::path::Path;

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use super::config::{ScanConfig, StartTime, END_PADDING_SECS};
use super::diagnostics::ScanDiagnostics;
use super::filter::LineFilter;
use crate::error::Result;
use crate::logging::LogConfig;
use crate::reader::{GrepRequest, LogReader, ServerLogReader};
use crate::timeline::{serialize_timestamp, truncate_to_hour, LogFile, TimeIndex};
use crate::{log_scan, log_slice};

/// A log line together with its parsed timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimedLine {
    /// Timestamp the line starts with.
    #[serde(serialize_with = "serialize_timestamp")]
    pub time: NaiveDateTime,
    /// Line text without its terminator.
    pub text: String,
}

/// Where raw lines come from after `configure`.
#[derive(Debug)]
enum LineSource {
    /// Block reads from the log file, buffered.
    Blocks { block: Vec<String>, cursor: usize },
    /// Pre-filtered lines from the reader's grep fast path.
    Grep { lines: Vec<String>, cursor: usize },
}

impl LineSource {
    fn blocks() -> Self {
        LineSource::Blocks {
            block: Vec::new(),
            cursor: 0,
        }
    }

    /// Steps back over the line just handed out.
    fn rewind(&mut self) -> bool {
        let cursor = match self {
            LineSource::Blocks { cursor, .. } | LineSource::Grep { cursor, .. } => cursor,
        };
        if *cursor == 0 {
            return false;
        }
        *cursor -= 1;
        true
    }
}

/// Pull-based cursor over one log file.
///
/// A scanner owns the file handle for its lifetime. `configure` fixes the
/// process window and positions the cursor; `next_line` then hands out the
/// lines inside a requested time range that pass the configured filter.
/// Views in [`crate::views`] borrow the scanner mutably, so at most one of
/// them consumes the cursor at a time.
///
/// # Examples
///
/// ```rust,no_run
/// use term_timeline::scan::{ScanConfig, WindowedScanner};
///
/// # fn main() -> term_timeline::Result<()> {
/// let mut scanner = WindowedScanner::open("/var/log/server.log")?;
/// scanner.configure(ScanConfig::builder().term("migrate").build()?)?;
/// while let Some(line) = scanner.next_line(None, None) {
///     println!("{}", line.text);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct WindowedScanner<R: LogReader = ServerLogReader> {
    file: LogFile,
    index: TimeIndex,
    reader: R,
    config: ScanConfig,
    filter: LineFilter,
    process_start: NaiveDateTime,
    process_end: NaiveDateTime,
    source: LineSource,
    diagnostics: ScanDiagnostics,
    log_config: LogConfig,
}

impl WindowedScanner<ServerLogReader> {
    /// Opens a server log with the default reader.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_reader(path, ServerLogReader::new())
    }
}

impl<R: LogReader> WindowedScanner<R> {
    /// Opens `path`, builds its hour index and configures a full-file scan
    /// without terms.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open_with_reader(path: impl AsRef<Path>, reader: R) -> Result<Self> {
        let path = path.as_ref();
        let file = LogFile::open(path, &reader)?;
        let index = reader.build_time_index(path)?;
        let config = ScanConfig::default();
        let filter = LineFilter::from_config(&config)?;
        let mut scanner = Self {
            process_start: file.start_time(),
            process_end: file.end_time(),
            file,
            index,
            reader,
            config,
            filter,
            source: LineSource::blocks(),
            diagnostics: ScanDiagnostics::default(),
            log_config: LogConfig::default(),
        };
        scanner.configure(ScanConfig::default())?;
        Ok(scanner)
    }

    /// Replaces the logging configuration.
    pub fn with_log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    /// Applies a new scan configuration and repositions the cursor.
    ///
    /// Invalid parameters, an uncompilable case-insensitive term or an
    /// unresolvable start expression fail here; nothing fails once lines
    /// are being read.
    #[instrument(skip_all, fields(path = %self.file.path().display()))]
    pub fn configure(&mut self, config: ScanConfig) -> Result<()> {
        config.validate()?;
        let filter = LineFilter::from_config(&config)?;

        let file_start = self.file.start_time();
        let file_end = self.file.end_time();
        let padded_end = file_end + Duration::seconds(END_PADDING_SECS);

        let mut process_start = match config.start() {
            StartTime::Head => file_start,
            StartTime::At(tm) => *tm,
            StartTime::Relative(expr) => self.reader.parse_relative_time(expr, file_end)?,
        };
        if process_start > file_end {
            process_start = padded_end;
        }
        let process_end = match config.duration() {
            Some(duration) if process_start + duration <= file_end => process_start + duration,
            _ => padded_end,
        };

        let offset = self.start_offset(process_start);
        self.file.seek_to(offset)?;

        self.source = LineSource::blocks();
        if config.system_grep() {
            let request = GrepRequest {
                terms: config.terms(),
                ignore: config.ignore(),
                path: self.file.path(),
                mode: config.mode(),
                case_sensitive: config.case_sensitive(),
            };
            match self.reader.system_grep(&request) {
                Some(Ok(output)) => {
                    let lines: Vec<String> = output.lines().map(str::to_string).collect();
                    debug!(lines = lines.len(), "using reader grep output");
                    self.source = LineSource::Grep { lines, cursor: 0 };
                }
                Some(Err(err)) => {
                    warn!(error = %err, "reader grep failed, falling back to block scan");
                }
                None => debug!("reader has no grep fast path, using block scan"),
            }
        }

        self.config = config;
        self.filter = filter;
        self.process_start = process_start;
        self.process_end = process_end;
        self.diagnostics = ScanDiagnostics::default();
        debug!(%process_start, %process_end, offset, "configured scan");
        Ok(())
    }

    /// Byte offset to start reading from for a window starting at `start`.
    fn start_offset(&self, start: NaiveDateTime) -> u64 {
        let start_hour = truncate_to_hour(start);
        if let Some(offset) = self.index.offset_of(start_hour) {
            log_scan!(self.log_config, %start_hour, offset, "exact hour match");
            return offset;
        }
        if start < self.file.start_time() {
            return 0;
        }
        if start > self.file.end_time() {
            return self.file.len();
        }
        // The last hour is probed too; an index missing it falls back to EOF.
        let past_last_hour = truncate_to_hour(self.file.end_time()) + Duration::hours(1);
        self.index
            .first_between(start_hour, past_last_hour)
            .map_or(self.file.len(), |(hour, offset)| {
                log_scan!(self.log_config, %hour, offset, "probed forward to indexed hour");
                offset
            })
    }

    /// Next line with a timestamp in `[range_start, range_end)` that passes
    /// the filter, or `None` at EOF or at the range end.
    ///
    /// Missing bounds default to the process window. Reaching a line at or
    /// past the end puts that line back so the next call, with a later
    /// range, sees it again.
    pub fn next_line(
        &mut self,
        range_start: Option<NaiveDateTime>,
        range_end: Option<NaiveDateTime>,
    ) -> Option<TimedLine> {
        let range_start = range_start.unwrap_or(self.process_start);
        let range_end = range_end.unwrap_or(self.process_end);
        let prefiltered = matches!(self.source, LineSource::Grep { .. });

        loop {
            let text = self.next_raw_line()?;
            self.diagnostics.lines_read += 1;

            let Some(time) = self.reader.parse_timestamp(&text) else {
                self.diagnostics.lines_without_timestamp += 1;
                continue;
            };
            if time >= range_end {
                if self.source.rewind() {
                    self.diagnostics.rewinds += 1;
                }
                log_scan!(self.log_config, %time, %range_end, "reached range end");
                return None;
            }
            if time < range_start {
                self.diagnostics.lines_before_range += 1;
                continue;
            }
            if self.config.read_all_lines() || prefiltered {
                return Some(TimedLine { time, text });
            }
            if !self.filter.matches_terms(&text) {
                self.diagnostics.lines_filtered += 1;
                continue;
            }
            if self.filter.is_ignored(&text) {
                self.diagnostics.lines_ignored += 1;
                continue;
            }
            log_slice!(
                self.log_config,
                %time,
                line = %self.log_config.excerpt(&text),
                "matched line"
            );
            return Some(TimedLine { time, text });
        }
    }

    fn next_raw_line(&mut self) -> Option<String> {
        match &mut self.source {
            LineSource::Grep { lines, cursor } => {
                let line = lines.get(*cursor)?.clone();
                *cursor += 1;
                Some(line)
            }
            LineSource::Blocks { block, cursor } => {
                if let Some(line) = block.get(*cursor) {
                    let line = line.clone();
                    *cursor += 1;
                    return Some(line);
                }
                let next = self.read_next_block()?;
                let line = next.first().cloned();
                self.source = LineSource::Blocks {
                    block: next,
                    cursor: 1,
                };
                line
            }
        }
    }

    /// Reads blocks until one passes the filter or the forced-return period
    /// elapses. `None` at EOF or on an I/O failure.
    fn read_next_block(&mut self) -> Option<Vec<String>> {
        let mut searched = 0usize;
        loop {
            let block = match self.file.read_block(self.config.block_bytes()) {
                Ok(block) => block,
                Err(err) => {
                    warn!(path = %self.file.path().display(), error = %err, "read failed, ending scan");
                    return None;
                }
            };
            if block.is_empty() {
                return None;
            }
            searched += 1;
            self.diagnostics.blocks_read += 1;

            if self.config.read_all_lines() || self.filter.matches_terms(&block.join("\n")) {
                return Some(block);
            }
            if searched % self.config.forced_return_every() == 0 {
                self.diagnostics.forced_block_returns += 1;
                log_scan!(self.log_config, searched, "forced return of trailing line");
                return block.into_iter().last().map(|line| vec![line]);
            }
            self.diagnostics.blocks_skipped += 1;
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Start of the process window.
    pub fn process_start(&self) -> NaiveDateTime {
        self.process_start
    }

    /// End of the process window (exclusive).
    pub fn process_end(&self) -> NaiveDateTime {
        self.process_end
    }

    /// First timestamp in the file.
    pub fn file_start(&self) -> NaiveDateTime {
        self.file.start_time()
    }

    /// Last timestamp in the file.
    pub fn file_end(&self) -> NaiveDateTime {
        self.file.end_time()
    }

    /// Hour index of the file.
    pub fn index(&self) -> &TimeIndex {
        &self.index
    }

    /// Reader collaborator.
    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Counters since the last `configure`.
    pub fn diagnostics(&self) -> ScanDiagnostics {
        self.diagnostics
    }

    pub(crate) fn diagnostics_mut(&mut self) -> &mut ScanDiagnostics {
        &mut self.diagnostics
    }

    pub(crate) fn log_config(&self) -> &LogConfig {
        &self.log_config
    }
}
