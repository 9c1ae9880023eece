// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, later ones win:
//! 1. TOML file (base values)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, NeurosimConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "neurosim.toml";

/// Find the neurosim configuration file
///
/// Search order:
/// 1. `NEUROSIM_CONFIG_PATH` environment variable
/// 2. Current working directory
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("NEUROSIM_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by NEUROSIM_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(path) = search_paths.iter().find(|p| p.exists()) {
        return Ok(path.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet NEUROSIM_CONFIG_PATH to specify a custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if config file is not found or contains invalid TOML
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<NeurosimConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: NeurosimConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

fn parse_bool(value: &str) -> bool {
    let value = value.to_lowercase();
    value == "true" || value == "1" || value == "yes"
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `NEUROSIM_NUM_THREADS` -> `system.num_threads`
/// - `NEUROSIM_NUM_RANKS` -> `system.num_ranks`
/// - `NEUROSIM_RANK` -> `system.rank`
/// - `NEUROSIM_ALLOW_LID_BOUND_SHRINK` -> `routing.allow_lid_bound_shrink`
/// - `NEUROSIM_LOG_LEVEL` -> `logging.level`
/// - `NEUROSIM_LOG_DIR` -> `logging.log_dir`
pub fn apply_environment_overrides(config: &mut NeurosimConfig) {
    if let Ok(value) = env::var("NEUROSIM_NUM_THREADS") {
        if let Ok(num_threads) = value.parse::<usize>() {
            config.system.num_threads = num_threads;
        }
    }
    if let Ok(value) = env::var("NEUROSIM_NUM_RANKS") {
        if let Ok(num_ranks) = value.parse::<usize>() {
            config.system.num_ranks = num_ranks;
        }
    }
    if let Ok(value) = env::var("NEUROSIM_RANK") {
        if let Ok(rank) = value.parse::<usize>() {
            config.system.rank = rank;
        }
    }
    if let Ok(value) = env::var("NEUROSIM_ALLOW_LID_BOUND_SHRINK") {
        config.routing.allow_lid_bound_shrink = parse_bool(&value);
    }
    if let Ok(value) = env::var("NEUROSIM_LOG_LEVEL") {
        config.logging.level = value;
    }
    if let Ok(value) = env::var("NEUROSIM_LOG_DIR") {
        config.logging.log_dir = Some(PathBuf::from(value));
    }
}

/// Apply CLI argument overrides to configuration
///
/// Keys: `num_threads`, `num_ranks`, `rank`, `allow_lid_bound_shrink`, `log_level`.
pub fn apply_cli_overrides(config: &mut NeurosimConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("num_threads") {
        if let Ok(num_threads) = value.parse::<usize>() {
            config.system.num_threads = num_threads;
        }
    }
    if let Some(value) = cli_args.get("num_ranks") {
        if let Ok(num_ranks) = value.parse::<usize>() {
            config.system.num_ranks = num_ranks;
        }
    }
    if let Some(value) = cli_args.get("rank") {
        if let Ok(rank) = value.parse::<usize>() {
            config.system.rank = rank;
        }
    }
    if let Some(value) = cli_args.get("allow_lid_bound_shrink") {
        config.routing.allow_lid_bound_shrink = parse_bool(value);
    }
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom.toml");
        File::create(&config_path).unwrap();

        env::set_var("NEUROSIM_CONFIG_PATH", config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var("NEUROSIM_CONFIG_PATH");

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_missing_env_path_reported() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        env::set_var("NEUROSIM_CONFIG_PATH", "/nonexistent/neurosim.toml");
        let result = find_config_file();
        env::remove_var("NEUROSIM_CONFIG_PATH");

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[system]").unwrap();
        writeln!(file, "num_threads = 4").unwrap();
        writeln!(file, "num_ranks = 2").unwrap();
        writeln!(file, "[routing]").unwrap();
        writeln!(file, "allow_lid_bound_shrink = true").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.system.num_threads, 4);
        assert_eq!(config.system.num_ranks, 2);
        assert!(config.routing.allow_lid_bound_shrink);
    }

    #[test]
    fn test_invalid_toml_reported() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "[system\nnum_threads = ").unwrap();

        assert!(matches!(
            load_config(Some(&config_path), None),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = NeurosimConfig::default();

        env::set_var("NEUROSIM_NUM_THREADS", "6");
        env::set_var("NEUROSIM_LOG_LEVEL", "debug");
        env::set_var("NEUROSIM_ALLOW_LID_BOUND_SHRINK", "yes");

        apply_environment_overrides(&mut config);

        env::remove_var("NEUROSIM_NUM_THREADS");
        env::remove_var("NEUROSIM_LOG_LEVEL");
        env::remove_var("NEUROSIM_ALLOW_LID_BOUND_SHRINK");

        assert_eq!(config.system.num_threads, 6);
        assert_eq!(config.logging.level, "debug");
        assert!(config.routing.allow_lid_bound_shrink);
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[system]").unwrap();
        writeln!(file, "num_threads = 2").unwrap();
        writeln!(file, "num_ranks = 2").unwrap();

        env::set_var("NEUROSIM_NUM_THREADS", "4");
        env::set_var("NEUROSIM_NUM_RANKS", "8");

        let mut cli_args = HashMap::new();
        cli_args.insert("num_threads".to_string(), "16".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args)).unwrap();

        env::remove_var("NEUROSIM_NUM_THREADS");
        env::remove_var("NEUROSIM_NUM_RANKS");

        // CLI wins for threads, env wins for ranks (no CLI override)
        assert_eq!(config.system.num_threads, 16);
        assert_eq!(config.system.num_ranks, 8);
    }
}
