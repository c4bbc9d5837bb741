//! Logging utilities and configuration for the timeline scanner.
//!
//! Scans touch every line of potentially very large files, so per-line and
//! per-slice logging is gated by [`LogConfig`] instead of relying on the
//! subscriber filter alone.

/// Which high-volume scanner events are emitted at `debug`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Cursor positioning, forced block returns and range-end rewinds
    pub scan_events: bool,
    /// Matched lines, closed slices and emitted diff records
    pub slice_events: bool,
    /// Longest line excerpt attached to an event, in bytes
    pub excerpt_bytes: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            scan_events: false,
            slice_events: false,
            excerpt_bytes: 160,
        }
    }
}

impl LogConfig {
    /// Every scanner event, with long excerpts.
    pub fn verbose() -> Self {
        Self {
            scan_events: true,
            slice_events: true,
            excerpt_bytes: 1024,
        }
    }

    /// Positioning events only; per-line and per-slice events stay off.
    pub fn positioning() -> Self {
        Self {
            scan_events: true,
            ..Self::default()
        }
    }

    /// Cuts `line` to at most [`excerpt_bytes`](Self::excerpt_bytes) on a
    /// char boundary, marking the cut with `...`.
    pub fn excerpt<'a>(&self, line: &'a str) -> std::borrow::Cow<'a, str> {
        if line.len() <= self.excerpt_bytes {
            return line.into();
        }
        let mut end = self.excerpt_bytes;
        while !line.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &line[..end]).into()
    }
}

/// `debug!` gated on [`LogConfig::scan_events`].
#[macro_export]
macro_rules! log_scan {
    ($config:expr, $($arg:tt)*) => {
        if $config.scan_events {
            tracing::debug!($($arg)*);
        }
    };
}

/// `debug!` gated on [`LogConfig::slice_events`].
#[macro_export]
macro_rules! log_slice {
    ($config:expr, $($arg:tt)*) => {
        if $config.slice_events {
            tracing::debug!($($arg)*);
        }
    };
}

/// Subscriber installation for binaries and tests.
pub mod setup {
    use tracing::Level;

    /// Output layout of the installed subscriber.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum LogFormat {
        #[default]
        Pretty,
        Compact,
        Json,
    }

    /// Configuration for the process-wide subscriber.
    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        /// Level for everything outside this crate
        pub default_level: Level,
        /// Level for `term_timeline` targets
        pub timeline_level: Level,
        pub format: LogFormat,
        /// Extra `target=level` directives appended to the filter
        pub directives: Vec<String>,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                default_level: Level::WARN,
                timeline_level: Level::INFO,
                format: LogFormat::Pretty,
                directives: Vec::new(),
            }
        }
    }

    impl LoggingConfig {
        /// JSON lines, scanner at `info`.
        pub fn production() -> Self {
            Self {
                format: LogFormat::Json,
                ..Self::default()
            }
        }

        /// Human-readable output with scanner `debug` events.
        pub fn development() -> Self {
            Self {
                default_level: Level::INFO,
                timeline_level: Level::DEBUG,
                ..Self::default()
            }
        }

        pub fn with_timeline_level(mut self, level: Level) -> Self {
            self.timeline_level = level;
            self
        }

        pub fn with_format(mut self, format: LogFormat) -> Self {
            self.format = format;
            self
        }

        /// Adds a filter directive such as `term_timeline::scan=trace`.
        pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
            self.directives.push(directive.into());
            self
        }

        /// The `EnvFilter` string used when `RUST_LOG` is unset.
        pub fn env_filter(&self) -> String {
            let mut filter = format!(
                "{},term_timeline={}",
                self.default_level.as_str().to_lowercase(),
                self.timeline_level.as_str().to_lowercase()
            );
            for directive in &self.directives {
                filter.push(',');
                filter.push_str(directive);
            }
            filter
        }
    }

    /// Installs a global `tracing` subscriber.
    ///
    /// `RUST_LOG` wins over the configured filter when set. Fails if a
    /// global subscriber is already installed.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use term_timeline::logging::setup::{init_logging, LogFormat, LoggingConfig};
    ///
    /// init_logging(LoggingConfig::development().with_format(LogFormat::Json)).unwrap();
    /// ```
    pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(config.env_filter()))?;

        let fmt_layer = match config.format {
            LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
            LogFormat::Compact => tracing_subscriber::fmt::layer().compact().boxed(),
            LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;

        Ok(())
    }
}
