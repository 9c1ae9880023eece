// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Checks that the process layout fits the routing record encoding and that
//! the logging section names a known level. All problems are collected and
//! reported together.

use crate::{ConfigError, ConfigResult, NeurosimConfig};

/// Upper bound on worker threads per rank (10-bit thread field)
pub const MAX_NUM_THREADS: usize = 1 << 10;

/// Upper bound on ranks (20-bit rank field)
pub const MAX_NUM_RANKS: usize = 1 << 20;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    OutOfRange {
        field: String,
        value: usize,
        min: usize,
        max: usize,
    },
    RankNotInCluster { rank: usize, num_ranks: usize },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(
                f,
                "{} = {} is outside valid range ({}-{})",
                field, value, min, max
            ),
            Self::RankNotInCluster { rank, num_ranks } => write!(
                f,
                "system.rank = {} must be less than system.num_ranks = {}",
                rank, num_ranks
            ),
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// Checks for:
/// - Thread count (0 = auto-detect, otherwise 1-1024)
/// - Rank count (1-2^20) and own rank below it
/// - Known log level
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` with details if validation fails
pub fn validate_config(config: &NeurosimConfig) -> ConfigResult<()> {
    let errors = collect_errors(config);
    if errors.is_empty() {
        return Ok(());
    }

    let error_messages = errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::ValidationError(format!(
        "Configuration validation failed:\n{}",
        error_messages
    )))
}

fn collect_errors(config: &NeurosimConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();
    validate_system(config, &mut errors);
    validate_logging(config, &mut errors);
    errors
}

fn validate_system(config: &NeurosimConfig, errors: &mut Vec<ConfigValidationError>) {
    let system = &config.system;

    if system.num_threads > MAX_NUM_THREADS {
        errors.push(ConfigValidationError::OutOfRange {
            field: "system.num_threads".to_string(),
            value: system.num_threads,
            min: 0,
            max: MAX_NUM_THREADS,
        });
    }

    if system.num_ranks == 0 || system.num_ranks > MAX_NUM_RANKS {
        errors.push(ConfigValidationError::OutOfRange {
            field: "system.num_ranks".to_string(),
            value: system.num_ranks,
            min: 1,
            max: MAX_NUM_RANKS,
        });
    } else if system.rank >= system.num_ranks {
        errors.push(ConfigValidationError::RankNotInCluster {
            rank: system.rank,
            num_ranks: system.num_ranks,
        });
    }
}

fn validate_logging(config: &NeurosimConfig, errors: &mut Vec<ConfigValidationError>) {
    let level = config.logging.level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!(
                "'{}' is not one of {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }
}
