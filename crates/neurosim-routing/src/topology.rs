// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Thread/rank topology and construction feeds consumed by the target table

use crate::error::{Result, RoutingError};
use crate::target::{MAX_RANKS, MAX_THREADS};
use crate::target_data::TargetData;

/// Provider of the worker layout of this process
pub trait ThreadTopology {
    /// Worker threads per rank
    fn num_threads(&self) -> usize;

    /// Total number of ranks (processes)
    fn num_ranks(&self) -> usize;

    /// Rank of this process
    fn rank(&self) -> usize;
}

/// Fixed topology, typically built from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticTopology {
    num_threads: usize,
    num_ranks: usize,
    rank: usize,
}

impl StaticTopology {
    pub fn new(num_threads: usize, num_ranks: usize, rank: usize) -> Result<Self> {
        if num_threads == 0 || num_threads > MAX_THREADS {
            return Err(RoutingError::InvalidThreadCount {
                requested: num_threads,
                max: MAX_THREADS,
            });
        }
        if num_ranks == 0 || num_ranks > MAX_RANKS {
            return Err(RoutingError::InvalidRankCount {
                requested: num_ranks,
                max: MAX_RANKS,
            });
        }
        if rank >= num_ranks {
            return Err(RoutingError::RankOutOfRange {
                rank: rank as u32,
                num_ranks: num_ranks as u32,
            });
        }
        Ok(Self {
            num_threads,
            num_ranks,
            rank,
        })
    }

    /// Single rank with `num_threads` workers
    pub fn single_rank(num_threads: usize) -> Result<Self> {
        Self::new(num_threads, 1, 0)
    }
}

impl ThreadTopology for StaticTopology {
    fn num_threads(&self) -> usize {
        self.num_threads
    }

    fn num_ranks(&self) -> usize {
        self.num_ranks
    }

    fn rank(&self) -> usize {
        self.rank
    }
}

/// Source of construction records for one construction phase.
///
/// Yields `(destination_rank, record)` pairs for the given worker thread. All
/// records of a phase are drained before secondary positions are compressed.
pub trait ConstructionFeed {
    fn records(&self, thread_id: usize) -> Box<dyn Iterator<Item = (u32, TargetData)> + '_>;
}

/// Records grouped per thread: `feed[thread_id]`
impl ConstructionFeed for Vec<Vec<(u32, TargetData)>> {
    fn records(&self, thread_id: usize) -> Box<dyn Iterator<Item = (u32, TargetData)> + '_> {
        match self.get(thread_id) {
            Some(records) => Box::new(records.iter().copied()),
            None => Box::new(core::iter::empty()),
        }
    }
}
