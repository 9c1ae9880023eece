// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neurosim
//!
//! Spike routing core for distributed spiking network simulation. Each worker
//! thread owns a target table mapping its local neurons to the targets their
//! spikes must reach: compact `Target` descriptors for direct delivery to a
//! thread on some rank (primary path), and positions in the outgoing send
//! buffer of this rank for secondary events.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use neurosim::prelude::*;
//!
//! let config = NeurosimConfig::default();
//! let (mut table, topology) = neurosim::bootstrap::target_table_from_config(&config)?;
//!
//! let feed = SyntheticFeed::new(topology, 1_000, 256);
//! let stats = table.run_construction_phase(256, &feed)?;
//! println!("{} targets", stats.num_targets);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: neurosim-config, neurosim-observability    │
//! │  (TOML + overrides, tracing subscribers)                │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Routing: neurosim-routing                              │
//! │  (per-thread stores, wire records, worker handles)      │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Umbrella: bootstrap + routing_probe tool               │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

pub use neurosim_config as config;
pub use neurosim_observability as observability;
pub use neurosim_routing as routing;

pub mod bootstrap;
pub mod synthetic;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::config::{load_config, validate_config, NeurosimConfig};
    pub use crate::routing::{
        ConstructionFeed, RoutingError, StaticTopology, TableSettings, TableStats, Target,
        TargetData, TargetTable, ThreadTopology,
    };
    pub use crate::synthetic::SyntheticFeed;
}
