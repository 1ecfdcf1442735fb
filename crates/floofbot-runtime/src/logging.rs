//! Logging setup for the Floofbot runtime.
//!
//! Logs always go to stdout. When `log.file` is configured they are also
//! written, without ANSI colors, to a rolling file that keeps at most
//! `log.max_files` rolled files.
//!
//! ```rust,ignore
//! use floofbot_runtime::logging::{LoggingBuilder, SpanEvents};
//!
//! LoggingBuilder::new()
//!     .with_level(tracing::Level::DEBUG)
//!     .directive("floofbot_framework=trace")
//!     .span_events(SpanEvents::LIFECYCLE)
//!     .init();
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::rolling::{InitError, RollingFileAppender};
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::{FloofbotConfig, LogFormat, LogRotation};

/// Errors raised while installing the subscriber.
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Failed to open log file: {0}")]
    File(#[from] InitError),

    #[error("Failed to install log subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanEvents {
    pub new: bool,
    pub close: bool,
}

impl SpanEvents {
    pub const NONE: Self = Self {
        new: false,
        close: false,
    };

    /// Log span creation and close, e.g. one line per dispatched event.
    pub const LIFECYCLE: Self = Self {
        new: true,
        close: true,
    };

    fn to_fmt_span(self) -> fmt::format::FmtSpan {
        let mut span = fmt::format::FmtSpan::NONE;
        if self.new {
            span |= fmt::format::FmtSpan::NEW;
        }
        if self.close {
            span |= fmt::format::FmtSpan::CLOSE;
        }
        span
    }
}

/// A rolling log file target.
#[derive(Debug, Clone)]
struct FileTarget {
    path: PathBuf,
    rotation: LogRotation,
    max_files: usize,
}

/// A builder for configuring logging.
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    directives: Vec<String>,
    level: tracing::Level,
    span_events: SpanEvents,
    format: LogFormat,
    with_target: bool,
    file: Option<FileTarget>,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingBuilder {
    /// Create a new logging builder: INFO to stdout, compact layout.
    pub fn new() -> Self {
        Self {
            directives: Vec::new(),
            level: tracing::Level::INFO,
            span_events: SpanEvents::NONE,
            format: LogFormat::Compact,
            with_target: true,
            file: None,
        }
    }

    /// Create a LoggingBuilder from the runtime configuration.
    ///
    /// `debug: true` lowers the level to DEBUG. An unparseable rotation falls
    /// back to daily; [`validate_config`](crate::config::validate_config)
    /// rejects it before this point.
    pub fn from_config(config: &FloofbotConfig) -> Self {
        let mut builder = Self::new().format(config.log.format);
        if config.debug {
            builder = builder.with_level(tracing::Level::DEBUG);
        }

        for (module, level) in &config.log.filters {
            builder = builder.directive(&format!("{module}={}", level.to_lowercase()));
        }

        if let Some(path) = &config.log.file {
            let rotation = config.log.rotation().unwrap_or(LogRotation::Daily);
            builder = builder.file(path.clone(), rotation, config.log.max_files);
        }

        builder
    }

    /// Set the base log level.
    pub fn with_level(mut self, level: tracing::Level) -> Self {
        self.level = level;
        self
    }

    /// Add a filter directive such as `floofbot_framework=trace`.
    pub fn directive(mut self, directive: &str) -> Self {
        self.directives.push(directive.to_string());
        self
    }

    pub fn span_events(mut self, events: SpanEvents) -> Self {
        self.span_events = events;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Include the target (module path) in log output.
    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    /// Also write to a rolling file at `path`.
    pub fn file(mut self, path: PathBuf, rotation: LogRotation, max_files: usize) -> Self {
        self.file = Some(FileTarget {
            path,
            rotation,
            max_files,
        });
        self
    }

    /// `RUST_LOG` wins over the configured level; directives are added on top.
    fn build_filter(&self) -> EnvFilter {
        let base_filter = self.level.to_string().to_lowercase();
        let mut filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&base_filter));

        for directive in &self.directives {
            if let Ok(d) = directive.parse() {
                filter = filter.add_directive(d);
            }
        }

        filter
    }

    fn stdout_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let span_events = self.span_events.to_fmt_span();
        let layer = fmt::layer()
            .with_span_events(span_events)
            .with_target(self.with_target);

        match self.format {
            LogFormat::Compact => layer.compact().boxed(),
            LogFormat::Full => layer.boxed(),
            LogFormat::Pretty => layer.pretty().boxed(),
            #[cfg(feature = "json-log")]
            LogFormat::Json => fmt::layer()
                .json()
                .with_span_events(self.span_events.to_fmt_span())
                .boxed(),
        }
    }

    fn file_layer(&self) -> Result<Option<Box<dyn Layer<Registry> + Send + Sync>>, LoggingError> {
        let Some(target) = &self.file else {
            return Ok(None);
        };

        let appender = rolling_appender(&target.path, target.rotation, target.max_files)?;
        let layer = fmt::layer()
            .with_ansi(false)
            .with_target(self.with_target)
            .with_writer(appender)
            .boxed();
        Ok(Some(layer))
    }

    /// Initialize the logging system, ignoring a subscriber that is already set.
    pub fn init(self) {
        let _ = self.try_init();
    }

    /// Try to initialize the logging system, returning an error on failure.
    pub fn try_init(self) -> Result<(), LoggingError> {
        let mut layers = vec![self.stdout_layer()];
        if let Some(file) = self.file_layer()? {
            layers.push(file);
        }

        tracing_subscriber::registry()
            .with(layers)
            .with(self.build_filter())
            .try_init()?;
        Ok(())
    }
}

/// Opens `dir/name` as a rolling appender; rolled files get a date suffix.
fn rolling_appender(
    path: &Path,
    rotation: LogRotation,
    max_files: usize,
) -> Result<RollingFileAppender, InitError> {
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let prefix = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("floofbot.log");

    RollingFileAppender::builder()
        .rotation(rotation.into())
        .filename_prefix(prefix)
        .max_log_files(max_files)
        .build(directory)
}
