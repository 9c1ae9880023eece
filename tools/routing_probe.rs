// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Target table probe.
//!
//! Loads `neurosim.toml` (or defaults), builds the target table for the
//! configured topology, runs one construction phase over synthetic
//! connectivity and prints the resulting statistics as JSON.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use anyhow::{Context, Result};
use neurosim::bootstrap::{log_settings_from_config, target_table_from_config};
use neurosim::config::{
    apply_cli_overrides, apply_environment_overrides, find_config_file, load_config,
    validate_config, NeurosimConfig,
};
use neurosim::observability::{debug_flags_help, init_logging, parse_debug_flags};
use neurosim::synthetic::SyntheticFeed;
use tracing::info;

struct ProbeArgs {
    config_path: Option<PathBuf>,
    overrides: HashMap<String, String>,
    records_per_thread: u32,
    max_lid_bound: usize,
    dump: bool,
}

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: routing_probe [--config <path>] [--threads <n>] [--ranks <n>] [--rank <r>]\n\
         \x20                    [--records <n>] [--lid-bound <n>] [--allow-shrink] [--dump]\n\n\
         Defaults:\n\
         - records: 100000 per thread\n\
         - lid-bound: 4096\n\n\
         {}",
        debug_flags_help()
    );
    process::exit(2);
}

fn parse_args() -> ProbeArgs {
    let mut parsed = ProbeArgs {
        config_path: None,
        overrides: HashMap::new(),
        records_per_thread: 100_000,
        max_lid_bound: 4096,
        dump: false,
    };

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        let mut value = || args.next().unwrap_or_else(|| usage_and_exit());
        match arg.as_str() {
            "--config" => parsed.config_path = Some(PathBuf::from(value())),
            "--threads" => {
                parsed.overrides.insert("num_threads".to_string(), value());
            }
            "--ranks" => {
                parsed.overrides.insert("num_ranks".to_string(), value());
            }
            "--rank" => {
                parsed.overrides.insert("rank".to_string(), value());
            }
            "--log-level" => {
                parsed.overrides.insert("log_level".to_string(), value());
            }
            "--allow-shrink" => {
                parsed
                    .overrides
                    .insert("allow_lid_bound_shrink".to_string(), "true".to_string());
            }
            "--records" => {
                parsed.records_per_thread = value().parse().unwrap_or_else(|_| usage_and_exit())
            }
            "--lid-bound" => {
                parsed.max_lid_bound = value().parse().unwrap_or_else(|_| usage_and_exit())
            }
            "--dump" => parsed.dump = true,
            "-h" | "--help" => usage_and_exit(),
            // consumed by parse_debug_flags
            other if other.starts_with("--debug-") => {}
            other => {
                eprintln!("Unknown argument: {other}");
                usage_and_exit();
            }
        }
    }

    parsed
}

/// Explicit path, then discovery, then built-in defaults
fn resolve_config(args: &ProbeArgs) -> Result<NeurosimConfig> {
    let path = match &args.config_path {
        Some(path) => Some(path.clone()),
        None => find_config_file().ok(),
    };

    let config = match path {
        Some(path) => load_config(Some(&path), Some(&args.overrides))
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => {
            let mut config = NeurosimConfig::default();
            apply_environment_overrides(&mut config);
            apply_cli_overrides(&mut config, &args.overrides);
            config
        }
    };

    validate_config(&config).context("Invalid configuration")?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = parse_args();
    let config = resolve_config(&args)?;

    let debug_flags = parse_debug_flags();
    let _log_guard = init_logging(&debug_flags, &log_settings_from_config(&config))?;

    let (mut table, topology) =
        target_table_from_config(&config).context("Failed to build target table")?;
    let feed = SyntheticFeed::new(topology, args.records_per_thread, args.max_lid_bound);

    let started = Instant::now();
    let stats = table
        .run_construction_phase(args.max_lid_bound, &feed)
        .context("Construction phase failed")?;
    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        threads = table.num_threads(),
        "construction phase finished"
    );

    if args.dump {
        for thread_id in 0..table.num_threads() {
            eprint!("{}", table.targets_dump(thread_id)?);
            eprint!("{}", table.secondary_send_buffer_pos_dump(thread_id)?);
        }
    }

    let report = serde_json::to_string_pretty(&stats).context("Failed to serialize stats")?;
    println!("{report}");
    Ok(())
}
