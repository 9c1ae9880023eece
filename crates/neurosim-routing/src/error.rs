// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for target table operations

use crate::layout::LayoutError;

/// Errors reported by the target table and its records
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoutingError {
    /// Binary layout of a routing record does not match its wire size.
    /// Fatal: the simulation must not start.
    #[error("Routing layout invalid: {0}")]
    Layout(#[from] LayoutError),

    #[error("Thread {caller} attempted to write into the store owned by thread {owner}")]
    ForeignThread { caller: usize, owner: usize },

    #[error("Unknown thread {thread} (table has {num_threads} threads)")]
    UnknownThread { thread: usize, num_threads: usize },

    #[error("Invalid thread count {requested} (must be within 1..={max})")]
    InvalidThreadCount { requested: usize, max: usize },

    #[error("Invalid rank count {requested} (must be within 1..={max})")]
    InvalidRankCount { requested: usize, max: usize },

    #[error("LID {lid} out of range for {side} targets on thread {thread} (slots: {slots})")]
    LidOutOfRange {
        thread: usize,
        lid: usize,
        slots: usize,
        side: TargetSide,
    },

    #[error("Destination rank {rank} out of range (num_ranks: {num_ranks})")]
    RankOutOfRange { rank: u32, num_ranks: u32 },

    #[error("Field {field} = {value} exceeds its {bits}-bit encoding")]
    FieldOverflow {
        field: &'static str,
        value: u64,
        bits: u32,
    },

    #[error("LID bound {requested} exceeds the addressable maximum {max}")]
    LidBoundTooLarge { requested: usize, max: usize },

    #[error("Wire slot has reserved bits set: {bits:#x}")]
    ReservedBits { bits: u64 },

    #[error("Invalid target data marker {0}")]
    InvalidDiscriminator(u8),

    #[error("Encoded target buffer length {len} is not a multiple of {record_size}")]
    TruncatedRecord { len: usize, record_size: usize },

    #[error(
        "Shrinking LID bound on thread {thread} from {previous} to {requested} would discard \
         {discarded} routing entries"
    )]
    LidBoundShrink {
        thread: usize,
        previous: usize,
        requested: usize,
        discarded: usize,
    },

    #[error("Target table is not initialized")]
    NotInitialized,

    #[error("Target table is already initialized; finalize it first")]
    AlreadyInitialized,

    #[error("Routing store of thread {thread} has not been prepared")]
    NotPrepared { thread: usize },

    #[error("Secondary send buffer positions of thread {thread} are not compressed")]
    NotCompressed { thread: usize },

    #[error("Failed to grow routing list on thread {thread} to {requested} entries")]
    Allocation { thread: usize, requested: usize },

    #[error("Failed to build worker thread pool: {0}")]
    ThreadPool(String),
}

/// Which of the two per-LID arrays an operation addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSide {
    Primary,
    Secondary,
}

impl core::fmt::Display for TargetSide {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TargetSide::Primary => write!(f, "primary"),
            TargetSide::Secondary => write!(f, "secondary"),
        }
    }
}

/// Result type for routing operations
pub type Result<T> = core::result::Result<T, RoutingError>;
