//! Log destinations for simulation runs
//!
//! A single run watched from a terminal wants readable console output. A
//! parameter sweep runs one process per seed and wants each run's events in
//! its own JSON-lines file named after that seed. Test binaries write
//! through the libtest capture so output only surfaces for failing tests.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Subscriber settings read by [`FlockworkSubscriberBuilder`](crate::FlockworkSubscriberBuilder)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// `EnvFilter` directives, e.g. `info,flockwork_simulation=debug`; `RUST_LOG` replaces them
    pub filter: String,
    pub console: ConsoleConfig,
    /// JSON-lines file for this run
    pub run_file: Option<RunFileConfig>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            console: ConsoleConfig::default(),
            run_file: None,
        }
    }
}

impl LogConfig {
    /// One run at a terminal: pretty console, scheduler phases at `debug`
    pub fn interactive() -> Self {
        Self {
            filter: "info,flockwork_simulation=debug".to_string(),
            console: ConsoleConfig {
                format: ConsoleFormat::Pretty,
                ansi: true,
                capture: false,
            },
            run_file: None,
        }
    }

    /// One run of a sweep: no console, events go to `<directory>/run-<seed>.jsonl`
    pub fn batch(directory: impl Into<PathBuf>, seed: u64) -> Self {
        Self {
            filter: "info".to_string(),
            console: ConsoleConfig {
                format: ConsoleFormat::Off,
                ..Default::default()
            },
            run_file: Some(RunFileConfig::for_seed(directory, seed)),
        }
    }

    /// Test binaries: warnings only, routed through the test capture
    pub fn testing() -> Self {
        Self {
            filter: "warn".to_string(),
            console: ConsoleConfig {
                format: ConsoleFormat::Compact,
                ansi: false,
                capture: true,
            },
            run_file: None,
        }
    }
}

/// How events are rendered on the console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConsoleFormat {
    Off,
    Pretty,
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConsoleConfig {
    pub format: ConsoleFormat,
    pub ansi: bool,
    /// Write through libtest's capture instead of stdout
    pub capture: bool,
}

/// Per-run log file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFileConfig {
    pub directory: PathBuf,
    /// File name without extension
    pub stem: String,
    pub rotation: RotationStrategy,
}

impl RunFileConfig {
    /// `run-<seed>` in `directory`, never rotated
    pub fn for_seed(directory: impl Into<PathBuf>, seed: u64) -> Self {
        Self {
            directory: directory.into(),
            stem: format!("run-{seed}"),
            rotation: RotationStrategy::Never,
        }
    }

    /// Full path of the unrotated file
    pub fn path(&self) -> PathBuf {
        self.directory.join(format!("{}.jsonl", self.stem))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

/// When a long-running sweep starts a new file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RotationStrategy {
    /// One file per run, truncated on start
    #[default]
    Never,
    Daily,
    Hourly,
}
