// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! End-to-end: configuration file to a ready, populated target table.

use std::fs;

use neurosim::bootstrap::target_table_from_config;
use neurosim::prelude::*;
use neurosim::routing::TablePhase;
use tempfile::tempdir;

const MAX_LID_BOUND: usize = 128;

fn config_from_toml(toml: &str) -> NeurosimConfig {
    let dir = tempdir().unwrap();
    let path = dir.path().join("neurosim.toml");
    fs::write(&path, toml).unwrap();
    let config = load_config(Some(&path), None).unwrap();
    validate_config(&config).unwrap();
    config
}

#[test]
fn test_config_file_drives_topology() {
    let config = config_from_toml(
        r#"
        [system]
        num_threads = 3
        num_ranks = 2
        rank = 1

        [routing]
        thread_name_prefix = "probe-worker"
        "#,
    );

    let (table, topology) = target_table_from_config(&config).unwrap();
    assert_eq!(topology.num_threads(), 3);
    assert_eq!(topology.rank(), 1);
    assert_eq!(table.num_ranks(), 2);
    assert_eq!(table.settings().thread_name_prefix, "probe-worker");
}

#[test]
fn test_synthetic_construction_phase_reaches_ready() {
    let config = config_from_toml("[system]\nnum_threads = 4\nnum_ranks = 3\n");
    let (mut table, topology) = target_table_from_config(&config).unwrap();
    let feed = SyntheticFeed::new(topology, 5_000, MAX_LID_BOUND);

    let stats = table.run_construction_phase(MAX_LID_BOUND, &feed).unwrap();

    assert_eq!(table.phase(), TablePhase::Ready);
    assert_eq!(stats.stores.len(), 4);
    // a quarter of the records are secondary, so 3/4 are primary targets
    assert_eq!(stats.num_targets, 4 * 3_750);
    assert!(stats.num_secondary_send_buffer_pos <= 4 * 1_250);

    for thread_id in 0..4 {
        for lid in 0..MAX_LID_BOUND {
            let positions = table.secondary_send_buffer_pos(thread_id, lid).unwrap();
            assert!(positions.windows(2).all(|w| w[0] < w[1]));
            for target in table.primary_targets(thread_id, lid).unwrap() {
                assert!(target.rank() < 3);
                assert!((target.tid() as usize) < 4);
            }
        }
    }
}

#[test]
fn test_stats_serialize_to_json() {
    let config = config_from_toml("[system]\nnum_threads = 2\n");
    let (mut table, topology) = target_table_from_config(&config).unwrap();
    let stats = table
        .run_construction_phase(16, &SyntheticFeed::new(topology, 100, 16))
        .unwrap();

    let json: serde_json::Value = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["num_targets"], stats.num_targets);
    assert_eq!(json["stores"].as_array().unwrap().len(), 2);
    assert_eq!(json["stores"][0]["phase"], "Ready");
}

#[test]
fn test_invalid_config_rejected_before_bootstrap() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("neurosim.toml");
    fs::write(&path, "[system]\nnum_ranks = 2\nrank = 2\n").unwrap();

    let config = load_config(Some(&path), None).unwrap();
    assert!(validate_config(&config).is_err());
    assert!(matches!(
        target_table_from_config(&config),
        Err(RoutingError::RankOutOfRange { .. })
    ));
}
