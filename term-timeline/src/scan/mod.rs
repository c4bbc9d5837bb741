//! The filtered, time-windowed line cursor and its configuration.

pub mod config;
pub mod diagnostics;
pub mod filter;
pub mod scanner;

pub use config::{
    ScanConfig, ScanConfigBuilder, StartTime, TermMode, DEFAULT_BLOCK_BYTES, DEFAULT_BUCKET_COUNT,
    DEFAULT_FORCED_RETURN_EVERY, DEFAULT_SLICE_SECS, END_PADDING_SECS,
};
pub use diagnostics::ScanDiagnostics;
pub use filter::LineFilter;
pub use scanner::{TimedLine, WindowedScanner};
