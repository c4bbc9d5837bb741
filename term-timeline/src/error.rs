//! Error types for the timeline scanner.
//!
//! Only caller-visible conditions are errors here: bad configuration, files
//! that cannot be opened or carry no timestamps at all, and reader failures.
//! Everything that happens mid-scan (unparseable lines, missing counters,
//! empty slices, end of file) is reported through `None` or skipped, never
//! through `TimelineError`.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for the timeline crate.
#[derive(Error, Debug)]
pub enum TimelineError {
    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid scan or probe configuration, detected at configure time.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A timestamp, duration or time expression could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The log file holds no line with a recognizable timestamp.
    #[error("No timestamped lines found in '{}'", path.display())]
    EmptyLog {
        /// Path of the offending file
        path: PathBuf,
    },

    /// A search term could not be compiled into a regular expression.
    #[error("Invalid search pattern: {0}")]
    Regex(#[from] regex::Error),

    /// Generic internal error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, TimelineError>`.
pub type Result<T> = std::result::Result<T, TimelineError>;

impl TimelineError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Creates an empty-log error for the given path.
    pub fn empty_log(path: impl Into<PathBuf>) -> Self {
        Self::EmptyLog { path: path.into() }
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, msg: &str) -> Result<T>;

    /// Adds context with a lazy message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<TimelineError>,
{
    fn context(self, msg: &str) -> Result<T> {
        self.with_context(|| msg.to_string())
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| match e.into() {
            // Keep the kind for I/O so callers can still match on it.
            TimelineError::Io(inner) => {
                TimelineError::Io(std::io::Error::new(inner.kind(), format!("{}: {inner}", f())))
            }
            TimelineError::Internal(inner) => TimelineError::Internal(format!("{}: {inner}", f())),
            other => TimelineError::Internal(format!("{}: {other}", f())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error() {
        let err = TimelineError::configuration("slice duration must be positive");
        assert_eq!(
            err.to_string(),
            "Configuration error: slice duration must be positive"
        );
    }

    #[test]
    fn test_empty_log_error() {
        let err = TimelineError::empty_log("/var/log/server.log");
        assert_eq!(
            err.to_string(),
            "No timestamped lines found in '/var/log/server.log'"
        );
    }

    #[test]
    fn test_io_context_keeps_kind() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        let err = result.context("opening server log").unwrap_err();
        match err {
            TimelineError::Io(inner) => {
                assert_eq!(inner.kind(), std::io::ErrorKind::NotFound);
                assert!(inner.to_string().contains("opening server log"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_error_context() {
        fn failing_operation() -> Result<()> {
            Err(TimelineError::Internal("Something went wrong".to_string()))
        }

        let err = failing_operation()
            .with_context(|| "During slice rollover".to_string())
            .unwrap_err();
        assert!(err.to_string().contains("During slice rollover"));
    }
}
