// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Turning a loaded configuration into a ready target table.

use neurosim_config::{LogFormat, NeurosimConfig};
use neurosim_observability::{ConsoleFormat, LogSettings};
use neurosim_routing::{RoutingError, StaticTopology, TableSettings, TargetTable};
use tracing::debug;

/// Topology of this process, with auto-detected thread count resolved
pub fn topology_from_config(config: &NeurosimConfig) -> Result<StaticTopology, RoutingError> {
    let system = &config.system;
    StaticTopology::new(system.resolved_num_threads(), system.num_ranks, system.rank)
}

pub fn table_settings_from_config(config: &NeurosimConfig) -> TableSettings {
    TableSettings {
        allow_lid_bound_shrink: config.routing.allow_lid_bound_shrink,
        thread_name_prefix: config.routing.thread_name_prefix.clone(),
    }
}

pub fn log_settings_from_config(config: &NeurosimConfig) -> LogSettings {
    LogSettings {
        level: config.logging.level.clone(),
        format: match config.logging.format {
            LogFormat::Text => ConsoleFormat::Text,
            LogFormat::Json => ConsoleFormat::Json,
        },
        log_dir: config.logging.log_dir.clone(),
        ..LogSettings::default()
    }
}

/// Build and initialize a table for the configured topology
///
/// The returned table is `Allocated`: one empty store per worker thread.
pub fn target_table_from_config(
    config: &NeurosimConfig,
) -> Result<(TargetTable, StaticTopology), RoutingError> {
    let topology = topology_from_config(config)?;
    let mut table = TargetTable::new(table_settings_from_config(config))?;
    table.initialize(&topology)?;
    debug!(?topology, "target table bootstrapped from configuration");
    Ok((table, topology))
}

#[cfg(test)]
mod tests {
    use super::*;
    use neurosim_routing::TablePhase;

    #[test]
    fn test_explicit_topology() {
        let mut config = NeurosimConfig::default();
        config.system.num_threads = 3;
        config.system.num_ranks = 4;
        config.system.rank = 2;

        let (table, topology) = target_table_from_config(&config).unwrap();
        assert_eq!(topology, StaticTopology::new(3, 4, 2).unwrap());
        assert_eq!(table.num_threads(), 3);
        assert_eq!(table.num_ranks(), 4);
        assert_eq!(table.phase(), TablePhase::Allocated);
    }

    #[test]
    fn test_rank_outside_cluster_rejected() {
        let mut config = NeurosimConfig::default();
        config.system.num_threads = 1;
        config.system.num_ranks = 2;
        config.system.rank = 5;
        assert!(matches!(
            target_table_from_config(&config),
            Err(RoutingError::RankOutOfRange { rank: 5, num_ranks: 2 })
        ));
    }

    #[test]
    fn test_settings_follow_config() {
        let mut config = NeurosimConfig::default();
        config.routing.allow_lid_bound_shrink = true;
        config.routing.thread_name_prefix = "routing".to_string();
        config.logging.format = LogFormat::Json;

        let settings = table_settings_from_config(&config);
        assert!(settings.allow_lid_bound_shrink);
        assert_eq!(settings.thread_name_prefix, "routing");
        assert_eq!(log_settings_from_config(&config).format, ConsoleFormat::Json);
    }
}
