// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neurosim Spike Routing
//!
//! Target tables resolving where the spikes of every local node go:
//! - **Primary path**: compact 8-byte [`Target`] descriptors for direct
//!   delivery to a thread on some rank
//! - **Secondary path**: positions in the outgoing send buffer of this rank
//!
//! ## Usage
//!
//! ```rust
//! use neurosim_routing::{StaticTopology, TableSettings, TargetData, TargetTable};
//!
//! let mut table = TargetTable::new(TableSettings::default())?;
//! table.initialize(&StaticTopology::new(2, 1, 0)?)?;
//!
//! table.prepare(0, 3)?;
//! table.add_target(0, 0, &TargetData::primary(1, 1, 0, 42))?;
//! table.add_target(0, 0, &TargetData::secondary(2, 7))?;
//! table.compress_secondary_send_buffer_pos(0)?;
//!
//! assert_eq!(table.primary_targets(0, 1)?[0].lcid(), 42);
//! assert_eq!(table.secondary_send_buffer_pos(0, 2)?, &[7]);
//! table.finalize();
//! # Ok::<(), neurosim_routing::RoutingError>(())
//! ```
//!
//! ## Threading
//! Every worker thread owns one [`RoutingStore`]. Concurrent population goes
//! through [`TargetTable::parallel`], which hands each worker a
//! [`WorkerHandle`] borrowing only its own store.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod dump;
pub mod error;
pub mod growth;
pub mod layout;
pub mod store;
pub mod table;
pub mod target;
pub mod target_data;
pub mod topology;
pub mod worker;

pub use dump::{SecondarySendBufferPosDump, TargetsDump};
pub use error::{Result, RoutingError, TargetSide};
pub use layout::{validate_layout, LayoutError};
pub use store::{RoutingStore, StorePhase, StoreStats, MAX_LID_BOUND};
pub use table::{TablePhase, TableSettings, TableStats, TargetTable};
pub use target::{Target, MAX_LCID, MAX_RANK, MAX_RANKS, MAX_SYN_ID, MAX_THREADS, MAX_TID};
pub use target_data::{
    PrimaryTargetData, SecondaryTargetData, SecondaryTargetDataWire, TargetData, TargetDataWire,
};
pub use topology::{ConstructionFeed, StaticTopology, ThreadTopology};
pub use worker::WorkerHandle;
