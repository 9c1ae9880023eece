// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Each struct maps to a section of `neurosim.toml`. Missing sections and keys
//! fall back to their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::validation::MAX_NUM_THREADS;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NeurosimConfig {
    pub system: SystemConfig,
    pub routing: RoutingConfig,
    pub logging: LoggingConfig,
}

/// Process layout of the simulation
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Worker threads per rank (0 = auto-detect)
    pub num_threads: usize,
    /// Total number of ranks
    pub num_ranks: usize,
    /// Rank of this process
    pub rank: usize,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            num_threads: 0,
            num_ranks: 1,
            rank: 0,
        }
    }
}

impl SystemConfig {
    /// Thread count with auto-detection applied
    ///
    /// Auto-detection is capped at `MAX_NUM_THREADS`.
    pub fn resolved_num_threads(&self) -> usize {
        if self.num_threads > 0 {
            return self.num_threads;
        }
        let detected = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        auto_thread_count(detected)
    }
}

fn auto_thread_count(detected: usize) -> usize {
    detected.clamp(1, MAX_NUM_THREADS)
}

/// Target table settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Let `prepare` discard entries when the LID bound shrinks
    pub allow_lid_bound_shrink: bool,
    pub thread_name_prefix: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            allow_lid_bound_shrink: false,
            thread_name_prefix: "neurosim-worker".to_string(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error
    pub level: String,
    pub format: LogFormat,
    /// Base directory for log files; console only when unset
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            log_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: NeurosimConfig = toml::from_str(
            r#"
            [system]
            num_threads = 8

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.system.num_threads, 8);
        assert_eq!(config.system.num_ranks, 1);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.routing, RoutingConfig::default());
    }

    #[test]
    fn test_auto_detected_threads_nonzero() {
        assert!(SystemConfig::default().resolved_num_threads() >= 1);
        let fixed = SystemConfig {
            num_threads: 3,
            ..SystemConfig::default()
        };
        assert_eq!(fixed.resolved_num_threads(), 3);
    }

    #[test]
    fn test_auto_detected_threads_capped() {
        assert_eq!(auto_thread_count(4096), MAX_NUM_THREADS);
        assert_eq!(auto_thread_count(MAX_NUM_THREADS), MAX_NUM_THREADS);
        assert_eq!(auto_thread_count(12), 12);
        assert!(SystemConfig::default().resolved_num_threads() <= MAX_NUM_THREADS);
    }
}
