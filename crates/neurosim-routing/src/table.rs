// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Target Table
//!
//! Resolves, for every local node of every worker thread, where its spikes go:
//! - **Primary targets**: compact descriptors of connections reached by direct
//!   spike delivery, kept in construction order.
//! - **Secondary send buffer positions**: offsets into the outgoing buffer of
//!   this rank for connections that carry continuous data.
//!
//! ## Lifecycle
//! ```text
//! Unallocated -> initialize -> Allocated -> prepare -> Prepared
//!   -> add_target -> Populated -> compress -> Ready -> finalize -> Unallocated
//! ```
//!
//! Each worker thread owns exactly one [`RoutingStore`]. Stores are allocated
//! by their own worker inside a broadcast region so their memory is first
//! touched by the thread that fills it. Mutation goes through `&mut self` or a
//! [`WorkerHandle`](crate::WorkerHandle), so no store is ever shared while it
//! is written.

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info};

use crate::error::{Result, RoutingError};
use crate::layout::validate_layout;
use crate::store::{RoutingStore, StorePhase, StoreStats};
use crate::target::{Target, MAX_RANKS, MAX_THREADS};
use crate::target_data::TargetData;
use crate::topology::ThreadTopology;
use crate::worker::WorkerHandle;

/// Table-wide settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSettings {
    /// Permit `prepare` to discard entries beyond a smaller LID bound
    pub allow_lid_bound_shrink: bool,
    /// Name prefix of the worker threads
    pub thread_name_prefix: String,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            allow_lid_bound_shrink: false,
            thread_name_prefix: "neurosim-worker".to_string(),
        }
    }
}

/// Lifecycle phase of the whole table (least advanced store)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TablePhase {
    Unallocated,
    Allocated,
    Prepared,
    Populated,
    Ready,
}

impl From<StorePhase> for TablePhase {
    fn from(phase: StorePhase) -> Self {
        match phase {
            StorePhase::Allocated => TablePhase::Allocated,
            StorePhase::Prepared => TablePhase::Prepared,
            StorePhase::Populated => TablePhase::Populated,
            StorePhase::Ready => TablePhase::Ready,
        }
    }
}

/// Routing table of all worker threads of this rank
pub struct TargetTable {
    settings: TableSettings,
    pool: Option<ThreadPool>,
    stores: Vec<RoutingStore>,
    num_ranks: u32,
}

impl TargetTable {
    /// Creates an unallocated table.
    ///
    /// # Errors
    /// Returns [`RoutingError::Layout`] if a routing record does not have its
    /// wire size. This is a build defect and startup must be aborted.
    pub fn new(settings: TableSettings) -> Result<Self> {
        validate_layout()?;
        Ok(Self {
            settings,
            pool: None,
            stores: Vec::new(),
            num_ranks: 0,
        })
    }

    pub fn settings(&self) -> &TableSettings {
        &self.settings
    }

    pub fn is_initialized(&self) -> bool {
        self.pool.is_some()
    }

    /// Number of worker threads (0 while unallocated)
    pub fn num_threads(&self) -> usize {
        self.stores.len()
    }

    pub fn num_ranks(&self) -> u32 {
        self.num_ranks
    }

    pub fn phase(&self) -> TablePhase {
        self.stores
            .iter()
            .map(|store| TablePhase::from(store.phase()))
            .min()
            .unwrap_or(TablePhase::Unallocated)
    }

    /// Spawns the worker pool and lets every worker allocate its own store.
    pub fn initialize<T: ThreadTopology + ?Sized>(&mut self, topology: &T) -> Result<()> {
        if self.is_initialized() {
            return Err(RoutingError::AlreadyInitialized);
        }

        let num_threads = topology.num_threads();
        if num_threads == 0 || num_threads > MAX_THREADS {
            return Err(RoutingError::InvalidThreadCount {
                requested: num_threads,
                max: MAX_THREADS,
            });
        }
        let num_ranks = topology.num_ranks();
        if num_ranks == 0 || num_ranks > MAX_RANKS {
            return Err(RoutingError::InvalidRankCount {
                requested: num_ranks,
                max: MAX_RANKS,
            });
        }

        let prefix = self.settings.thread_name_prefix.clone();
        let pool = ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(move |index| format!("{}-{}", prefix, index))
            .build()
            .map_err(|e| RoutingError::ThreadPool(e.to_string()))?;

        let stores = pool.broadcast(|ctx| {
            debug!(thread = ctx.index(), "Allocating routing store");
            RoutingStore::new(ctx.index())
        });

        self.stores = stores;
        self.pool = Some(pool);
        self.num_ranks = num_ranks as u32;
        debug!(
            num_threads,
            num_ranks,
            rank = topology.rank(),
            "Target table initialized"
        );
        Ok(())
    }

    /// Releases all stores and the worker pool. No-op when unallocated.
    pub fn finalize(&mut self) {
        if self.pool.is_none() && self.stores.is_empty() {
            return;
        }
        self.stores = Vec::new();
        self.pool = None;
        self.num_ranks = 0;
        debug!("Target table finalized");
    }

    /// Sizes the store of `thread_id` for `max_lid_bound` local nodes:
    /// `max_lid_bound + 1` primary slots, `max_lid_bound` secondary slots.
    pub fn prepare(&mut self, thread_id: usize, max_lid_bound: usize) -> Result<()> {
        self.worker(thread_id)?.prepare(thread_id, max_lid_bound)
    }

    /// Inserts one construction record into the store of `thread_id`.
    pub fn add_target(&mut self, thread_id: usize, rank: u32, data: &TargetData) -> Result<()> {
        self.worker(thread_id)?.add_target(thread_id, rank, data)
    }

    /// Decodes a buffer of wire slots and inserts every record.
    ///
    /// Returns the number of records inserted.
    pub fn add_encoded_targets(&mut self, thread_id: usize, rank: u32, bytes: &[u8]) -> Result<usize> {
        self.worker(thread_id)?
            .add_encoded_targets(thread_id, rank, bytes)
    }

    /// Sorts and deduplicates every secondary list of `thread_id`.
    pub fn compress_secondary_send_buffer_pos(&mut self, thread_id: usize) -> Result<()> {
        self.worker(thread_id)?
            .compress_secondary_send_buffer_pos(thread_id)
    }

    /// Primary targets of `lid` on `thread_id`, in construction order
    #[inline]
    pub fn primary_targets(&self, thread_id: usize, lid: usize) -> Result<&[Target]> {
        self.store(thread_id)?.targets(lid)
    }

    /// Sorted, unique send buffer positions of `lid` on `thread_id`
    #[inline]
    pub fn secondary_send_buffer_pos(&self, thread_id: usize, lid: usize) -> Result<&[u32]> {
        self.store(thread_id)?.secondary_send_buffer_pos(lid)
    }

    pub fn store(&self, thread_id: usize) -> Result<&RoutingStore> {
        if !self.is_initialized() {
            return Err(RoutingError::NotInitialized);
        }
        self.stores
            .get(thread_id)
            .ok_or(RoutingError::UnknownThread {
                thread: thread_id,
                num_threads: self.stores.len(),
            })
    }

    pub fn stats(&self) -> TableStats {
        TableStats::from_stores(self.stores.iter().map(RoutingStore::stats).collect())
    }

    /// Worker handle for sequential access from the owning context
    fn worker(&mut self, thread_id: usize) -> Result<WorkerHandle<'_>> {
        if !self.is_initialized() {
            return Err(RoutingError::NotInitialized);
        }
        let num_threads = self.stores.len();
        let store = self
            .stores
            .get_mut(thread_id)
            .ok_or(RoutingError::UnknownThread {
                thread: thread_id,
                num_threads,
            })?;
        Ok(WorkerHandle::new(
            store,
            self.num_ranks,
            self.settings.allow_lid_bound_shrink,
        ))
    }

    pub(crate) fn parts_mut(&mut self) -> Result<(&ThreadPool, &mut [RoutingStore], u32, bool)> {
        let pool = self.pool.as_ref().ok_or(RoutingError::NotInitialized)?;
        Ok((
            pool,
            &mut self.stores,
            self.num_ranks,
            self.settings.allow_lid_bound_shrink,
        ))
    }

    pub(crate) fn log_phase_summary(&self, stats: &TableStats) {
        info!(
            num_threads = stats.stores.len(),
            num_targets = stats.num_targets,
            num_secondary_send_buffer_pos = stats.num_secondary_send_buffer_pos,
            phase = ?self.phase(),
            "Construction phase complete"
        );
    }
}

impl Drop for TargetTable {
    fn drop(&mut self) {
        self.finalize();
    }
}

/// Aggregated entry counts of all stores
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TableStats {
    pub stores: Vec<StoreStats>,
    pub num_targets: usize,
    pub num_secondary_send_buffer_pos: usize,
    pub target_capacity: usize,
}

impl TableStats {
    pub fn from_stores(stores: Vec<StoreStats>) -> Self {
        Self {
            num_targets: stores.iter().map(|s| s.num_targets).sum(),
            num_secondary_send_buffer_pos: stores
                .iter()
                .map(|s| s.num_secondary_send_buffer_pos)
                .sum(),
            target_capacity: stores.iter().map(|s| s.target_capacity).sum(),
            stores,
        }
    }
}
