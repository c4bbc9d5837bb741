//! # Term Timeline - Windowed Analytics over Server Logs
//!
//! Term Timeline scans large, timestamped server log files inside a time
//! window and turns the matching lines into lazy result streams: the
//! matching lines themselves, match counts per time slice, and the change of
//! embedded numeric counters between sampled slices. It also reads node
//! identity from cluster snapshot summaries.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chrono::Duration;
//! use term_timeline::prelude::*;
//!
//! # fn main() -> term_timeline::Result<()> {
//! let mut scanner = WindowedScanner::open("/var/log/server.log")?;
//! scanner.configure(
//!     ScanConfig::builder()
//!         .term("migrate")
//!         .ignore("DEBUG")
//!         .start(StartTime::Relative("-1h".into()))
//!         .slice_duration(Duration::seconds(30))
//!         .build()?,
//! )?;
//!
//! for row in scanner.counts() {
//!     println!("{}", row.to_record());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Views
//!
//! All views pull from one cursor owned by [`scan::WindowedScanner`]:
//!
//! - **Lines** ([`scan::WindowedScanner::lines`]): every matching line in
//!   the process window.
//! - **Counts** ([`scan::WindowedScanner::counts`]): matches per slice, one
//!   row per slice including empty ones, then a `Total` row.
//! - **Diffs** ([`scan::WindowedScanner::diffs`]): counters next to the
//!   first search term, summed per slice, reported with their change against
//!   the previous sampled slice. `every_nth_slice` samples slices and
//!   `upper_limit` suppresses rows whose change stays below a noise floor.
//! - **Latency** ([`scan::WindowedScanner::latency`]): the line stream handed
//!   to a [`latency::LatencyAggregator`].
//!
//! ## Reading Files
//!
//! The scanner never reads a log line by line from the start. It seeks using
//! an hour index built by the [`reader::LogReader`], then reads blocks of
//! whole lines and drops a block at once when its joined text cannot match.
//! Every few blocks the trailing line is handed back anyway, so a scan bound
//! to a narrow range notices the range end in long quiet stretches.
//!
//! ## Logging
//!
//! Instrumentation uses `tracing`. Per-line and per-slice events are gated
//! by [`logging::LogConfig`]; [`logging::setup::init_logging`] installs a
//! subscriber for binaries and tests.
//!
//! ```rust,no_run
//! use term_timeline::logging::setup::{init_logging, LoggingConfig};
//!
//! init_logging(LoggingConfig::development()).unwrap();
//! ```
//!
//! ## Snapshots
//!
//! [`snapshot::NodeAttributeTable::bootstrap`] reads node ids, addresses,
//! builds and editions from the summary tables of a cluster snapshot, using
//! [`snapshot::ColumnProbe`] to find columns in wrapped table headers.

pub mod counter;
pub mod diff;
pub mod error;
pub mod latency;
pub mod logging;
pub mod prelude;
pub mod reader;
pub mod scan;
pub mod slice;
pub mod snapshot;
pub mod timeline;
pub mod views;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_fixtures;

pub use error::{Result, TimelineError};
