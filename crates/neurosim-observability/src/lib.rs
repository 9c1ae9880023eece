// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neurosim-observability
//!
//! Logging setup shared by every neurosim binary, with per-crate debug flag
//! support.
//!
//! ## Features
//! - `file-logging`: JSON log files in a timestamped run folder

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Known neurosim crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "neurosim",
    "neurosim-routing",
    "neurosim-config",
    "neurosim-observability",
];
