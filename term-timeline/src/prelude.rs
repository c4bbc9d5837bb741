//! Prelude for commonly used types and traits in term-timeline.

pub use crate::counter::{CounterExtractor, CounterShape};
pub use crate::diff::DiffRecord;
pub use crate::error::{ErrorContext, Result, TimelineError};
pub use crate::latency::{LatencyAggregator, LatencyRequest};
pub use crate::logging::LogConfig;
pub use crate::reader::{LogReader, ServerLogReader};
pub use crate::scan::{ScanConfig, StartTime, TermMode, TimedLine, WindowedScanner};
pub use crate::snapshot::{NodeAttributeTable, SnapshotSource};
pub use crate::views::CountRecord;
