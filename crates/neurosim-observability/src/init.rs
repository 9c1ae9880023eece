// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Unified logging initialization for neurosim
//!
//! Console output always; with the `file-logging` feature and a log directory,
//! a JSON log file is also written into a timestamped run folder:
//! ```text
//! ./logs/
//!   └── run_20250101_120000/
//!       └── neurosim.log
//! ```

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;

/// Console log format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleFormat {
    #[default]
    Text,
    Json,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSettings {
    /// Base level for crates without a debug flag
    pub level: String,
    pub format: ConsoleFormat,
    /// Base directory for run folders (ignored without `file-logging`)
    pub log_dir: Option<PathBuf>,
    /// Keep this many most recent run folders
    pub retention_runs: usize,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: ConsoleFormat::Text,
            log_dir: None,
            retention_runs: 10,
        }
    }
}

/// Logging initialization result
///
/// Holds the file writer guards; dropping it flushes pending file output.
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
    run_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Run folder receiving log files, if file logging is active
    pub fn log_dir(&self) -> Option<&Path> {
        self.run_dir.as_deref()
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Build the filter for a base level plus per-crate debug flags
///
/// # Errors
///
/// Fails if `level` is not a tracing level name.
pub fn build_env_filter(debug_flags: &CrateDebugFlags, level: &str) -> Result<EnvFilter> {
    level
        .parse::<tracing::Level>()
        .map_err(|_| anyhow!("Unknown log level '{}'", level))?;
    let directives = debug_flags.to_filter_string(level);
    EnvFilter::try_new(&directives)
        .with_context(|| format!("Invalid log filter directives: {}", directives))
}

/// Install the global tracing subscriber
///
/// # Errors
///
/// Fails on an unknown level, when the run folder cannot be created, or when
/// a global subscriber is already installed.
pub fn init_logging(debug_flags: &CrateDebugFlags, settings: &LogSettings) -> Result<LoggingGuard> {
    let mut layers: Vec<BoxedLayer> = Vec::new();

    let console_filter = build_env_filter(debug_flags, &settings.level)?;
    let console_layer = match settings.format {
        ConsoleFormat::Text => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(true)
            .with_filter(console_filter)
            .boxed(),
        ConsoleFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_thread_names(true)
            .with_filter(console_filter)
            .boxed(),
    };
    layers.push(console_layer);

    #[cfg(feature = "file-logging")]
    let (file_guards, run_dir) = match &settings.log_dir {
        Some(base) => {
            let run_folder = create_run_folder(base)?;
            cleanup_old_runs(base, settings.retention_runs)?;

            let appender = tracing_appender::rolling::never(&run_folder, "neurosim.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_file(true)
                    .with_line_number(true)
                    .with_thread_names(true)
                    .with_filter(build_env_filter(debug_flags, &settings.level)?)
                    .boxed(),
            );
            (vec![guard], Some(run_folder))
        }
        None => (Vec::new(), None),
    };
    #[cfg(not(feature = "file-logging"))]
    let run_dir: Option<PathBuf> = None;

    Registry::default()
        .with(layers)
        .try_init()
        .context("Failed to install global tracing subscriber")?;

    #[cfg(not(feature = "file-logging"))]
    if let Some(dir) = &settings.log_dir {
        tracing::warn!(
            log_dir = %dir.display(),
            "log_dir is set but file logging is not compiled in; console only"
        );
    }

    Ok(LoggingGuard {
        #[cfg(feature = "file-logging")]
        _file_guards: file_guards,
        run_dir,
    })
}

/// Initialize console logging at `info` with the given debug flags
pub fn init_logging_default(debug_flags: &CrateDebugFlags) -> Result<LoggingGuard> {
    init_logging(debug_flags, &LogSettings::default())
}

#[cfg(feature = "file-logging")]
const RUN_PREFIX: &str = "run_";
#[cfg(feature = "file-logging")]
const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[cfg(feature = "file-logging")]
fn create_run_folder(base_log_dir: &Path) -> Result<PathBuf> {
    let timestamp = chrono::Utc::now().format(RUN_TIMESTAMP_FORMAT);
    let run_folder = base_log_dir.join(format!("{}{}", RUN_PREFIX, timestamp));
    std::fs::create_dir_all(&run_folder)
        .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;
    Ok(run_folder)
}

/// Remove all but the `retention_runs` most recent run folders
#[cfg(feature = "file-logging")]
fn cleanup_old_runs(base_log_dir: &Path, retention_runs: usize) -> Result<()> {
    let mut runs: Vec<(PathBuf, chrono::NaiveDateTime)> = Vec::new();
    let entries = std::fs::read_dir(base_log_dir)
        .with_context(|| format!("Failed to read log directory: {}", base_log_dir.display()))?;

    for entry in entries {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let stamp = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix(RUN_PREFIX))
            .and_then(|s| chrono::NaiveDateTime::parse_from_str(s, RUN_TIMESTAMP_FORMAT).ok());
        if let Some(stamp) = stamp {
            runs.push((path, stamp));
        }
    }

    if runs.len() <= retention_runs {
        return Ok(());
    }

    // oldest first
    runs.sort_by_key(|(_, stamp)| *stamp);
    let excess = runs.len() - retention_runs;
    for (path, _) in runs.into_iter().take(excess) {
        if let Err(e) = std::fs::remove_dir_all(&path) {
            eprintln!(
                "Warning: Failed to remove old log directory {}: {}",
                path.display(),
                e
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_rejects_unknown_level() {
        let flags = CrateDebugFlags::default();
        assert!(build_env_filter(&flags, "verbose").is_err());
        assert!(build_env_filter(&flags, "WARN").is_ok());
    }

    #[test]
    fn test_filter_accepts_debug_flags() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-all".to_string()]);
        assert!(build_env_filter(&flags, "error").is_ok());
    }

    #[cfg(feature = "file-logging")]
    #[test]
    fn test_cleanup_keeps_most_recent_runs() {
        let dir = tempfile::tempdir().unwrap();
        for stamp in ["20250101_000000", "20250102_000000", "20250103_000000"] {
            std::fs::create_dir(dir.path().join(format!("run_{}", stamp))).unwrap();
        }
        std::fs::create_dir(dir.path().join("unrelated")).unwrap();

        cleanup_old_runs(dir.path(), 2).unwrap();

        assert!(!dir.path().join("run_20250101_000000").exists());
        assert!(dir.path().join("run_20250102_000000").exists());
        assert!(dir.path().join("run_20250103_000000").exists());
        assert!(dir.path().join("unrelated").exists());
    }
}
