//! Logging setup for Flockwork simulations
//!
//! Simulation crates only ever call `tracing` macros. Binaries, benchmarks
//! and test harnesses pick how those events are rendered by installing a
//! subscriber through this crate.
//!
//! # Quick Start
//!
//! ```ignore
//! use flockwork_logging::{FlockworkSubscriberBuilder, LogConfig};
//!
//! // Watching one run
//! let _guard = FlockworkSubscriberBuilder::new()
//!     .with_config(LogConfig::interactive())
//!     .init();
//!
//! // One run of a sweep, logged to sweep/run-17.jsonl
//! let _guard = flockwork_logging::init_batch("sweep", 17)?;
//! ```
//!
//! `RUST_LOG` always takes precedence over the configured filter.

pub mod config;

pub use config::{ConsoleConfig, ConsoleFormat, LogConfig, RotationStrategy, RunFileConfig};

use std::fs::{self, File};
use std::path::PathBuf;

use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::TestWriter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

type Base = Layered<EnvFilter, Registry>;
type BoxedLayer = Box<dyn Layer<Base> + Send + Sync>;

/// Errors raised while installing the subscriber
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to prepare log file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Global subscriber already set: {0}")]
    AlreadyInitialized(String),
}

/// Builder for configuring and initializing the global subscriber
pub struct FlockworkSubscriberBuilder {
    config: LogConfig,
}

impl FlockworkSubscriberBuilder {
    /// Compact console output at `info`
    pub fn new() -> Self {
        Self {
            config: LogConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the filter directives
    pub fn with_filter(mut self, directives: impl Into<String>) -> Self {
        self.config.filter = directives.into();
        self
    }

    pub fn with_console(mut self, format: ConsoleFormat) -> Self {
        self.config.console.format = format;
        self
    }

    /// Also write JSON lines to a per-run file
    pub fn with_run_file(mut self, run_file: RunFileConfig) -> Self {
        self.config.run_file = Some(run_file);
        self
    }

    /// Try to initialize the subscriber globally
    ///
    /// The returned guard flushes the file writer on drop and must be held
    /// until the run has finished.
    pub fn try_init(self) -> Result<Option<WorkerGuard>, LoggingError> {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.config.filter));

        let mut layers: Vec<BoxedLayer> = Vec::new();
        let mut guard = None;

        if let Some(layer) = console_layer(&self.config.console) {
            layers.push(layer);
        }

        if let Some(run_file) = &self.config.run_file {
            let (writer, file_guard) = file_writer(run_file)?;
            guard = Some(file_guard);
            layers.push(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(writer)
                    .boxed(),
            );
        }

        Registry::default()
            .with(env_filter)
            .with(layers)
            .try_init()
            .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

        Ok(guard)
    }

    /// Initialize the subscriber globally, keeping any subscriber that is already installed
    pub fn init(self) -> Option<WorkerGuard> {
        self.try_init().ok().flatten()
    }
}

impl Default for FlockworkSubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn console_layer(config: &ConsoleConfig) -> Option<BoxedLayer> {
    let writer = if config.capture {
        BoxMakeWriter::new(TestWriter::new())
    } else {
        BoxMakeWriter::new(std::io::stdout)
    };
    let layer = tracing_subscriber::fmt::layer()
        .with_ansi(config.ansi)
        .with_target(true)
        .with_writer(writer);

    let layer: BoxedLayer = match config.format {
        ConsoleFormat::Off => return None,
        ConsoleFormat::Pretty => layer.pretty().boxed(),
        ConsoleFormat::Compact => layer.compact().boxed(),
        ConsoleFormat::Json => layer.json().with_current_span(true).boxed(),
    };
    Some(layer)
}

fn file_writer(config: &RunFileConfig) -> Result<(NonBlocking, WorkerGuard), LoggingError> {
    fs::create_dir_all(config.directory())?;
    let rotation = match config.rotation {
        RotationStrategy::Never => {
            let file = File::create(config.path())?;
            return Ok(tracing_appender::non_blocking(file));
        }
        RotationStrategy::Daily => Rotation::DAILY,
        RotationStrategy::Hourly => Rotation::HOURLY,
    };
    let appender = RollingFileAppender::new(rotation, config.directory(), &config.stem);
    Ok(tracing_appender::non_blocking(appender))
}

/// Initialize logging with default settings (compact console at `info`)
pub fn init_default() -> Option<WorkerGuard> {
    FlockworkSubscriberBuilder::new().init()
}

/// Initialize logging for one run of a sweep, writing `<directory>/run-<seed>.jsonl`
pub fn init_batch(
    directory: impl Into<PathBuf>,
    seed: u64,
) -> Result<Option<WorkerGuard>, LoggingError> {
    FlockworkSubscriberBuilder::new()
        .with_config(LogConfig::batch(directory, seed))
        .try_init()
}

/// Initialize logging inside tests
///
/// Output goes through the libtest capture so it only shows for failing
/// tests. Safe to call from every test; only the first call installs.
pub fn init_test_logging() {
    let _ = FlockworkSubscriberBuilder::new()
        .with_config(LogConfig::testing())
        .try_init();
}
