// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-thread routing store
//!
//! One `RoutingStore` exists per worker thread. It holds, for every LID of a
//! local node, the list of primary targets (in insertion order) and the list
//! of secondary send buffer positions (sorted and unique once compressed).

use tracing::{trace, warn};

use crate::error::{Result, RoutingError, TargetSide};
use crate::growth::push_with_growth;
use crate::target::Target;
use crate::target_data::{TargetData, MAX_LID};

/// Largest LID bound `prepare` accepts: every LID below it is addressable
/// by a wire record
pub const MAX_LID_BOUND: usize = MAX_LID as usize + 1;

/// Lifecycle phase of a single store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum StorePhase {
    /// Allocated, not yet sized
    Allocated,
    /// Sized for the current LID bound
    Prepared,
    /// Received at least one record since the last compression
    Populated,
    /// Secondary positions compressed; safe for concurrent reads
    Ready,
}

/// Routing lists of one worker thread
#[derive(Debug)]
pub struct RoutingStore {
    thread: usize,
    phase: StorePhase,
    /// Last bound passed to `prepare`
    max_lid_bound: usize,
    /// lid -> targets, `max_lid_bound + 1` slots
    targets: Vec<Vec<Target>>,
    /// lid -> send buffer positions, `max_lid_bound` slots
    secondary_send_buffer_pos: Vec<Vec<u32>>,
}

impl RoutingStore {
    pub(crate) fn new(thread: usize) -> Self {
        Self {
            thread,
            phase: StorePhase::Allocated,
            max_lid_bound: 0,
            targets: Vec::new(),
            secondary_send_buffer_pos: Vec::new(),
        }
    }

    pub fn thread(&self) -> usize {
        self.thread
    }

    pub fn phase(&self) -> StorePhase {
        self.phase
    }

    pub fn max_lid_bound(&self) -> usize {
        self.max_lid_bound
    }

    /// Number of LID slots on the primary side
    pub fn num_target_slots(&self) -> usize {
        self.targets.len()
    }

    /// Number of LID slots on the secondary side
    pub fn num_secondary_slots(&self) -> usize {
        self.secondary_send_buffer_pos.len()
    }

    /// Sizes the store for `max_lid_bound` local nodes.
    ///
    /// The primary side gets one extra slot to absorb off-by-one LIDs from the
    /// distribution step; the secondary side does not. Lists within the new
    /// bound keep their entries. A smaller bound that would drop entries fails
    /// with [`RoutingError::LidBoundShrink`] unless `allow_shrink` is set.
    pub(crate) fn prepare(&mut self, max_lid_bound: usize, allow_shrink: bool) -> Result<()> {
        if max_lid_bound > MAX_LID_BOUND {
            return Err(RoutingError::LidBoundTooLarge {
                requested: max_lid_bound,
                max: MAX_LID_BOUND,
            });
        }
        let target_slots = max_lid_bound + 1;
        let discarded = count_beyond(&self.targets, target_slots)
            + count_beyond(&self.secondary_send_buffer_pos, max_lid_bound);

        if discarded > 0 {
            if !allow_shrink {
                return Err(RoutingError::LidBoundShrink {
                    thread: self.thread,
                    previous: self.max_lid_bound,
                    requested: max_lid_bound,
                    discarded,
                });
            }
            warn!(
                thread = self.thread,
                previous = self.max_lid_bound,
                requested = max_lid_bound,
                discarded,
                "Shrinking LID bound discards routing entries"
            );
        }

        reserve_slots(&mut self.targets, target_slots, self.thread)?;
        reserve_slots(&mut self.secondary_send_buffer_pos, max_lid_bound, self.thread)?;
        self.targets.resize_with(target_slots, Vec::new);
        self.secondary_send_buffer_pos
            .resize_with(max_lid_bound, Vec::new);
        self.max_lid_bound = max_lid_bound;
        self.phase = StorePhase::Prepared;
        Ok(())
    }

    /// Validates one construction record against this store without
    /// modifying it.
    pub(crate) fn check_record(&self, rank: u32, data: &TargetData) -> Result<()> {
        if self.phase == StorePhase::Allocated {
            return Err(RoutingError::NotPrepared {
                thread: self.thread,
            });
        }
        let (slots, side) = match data {
            TargetData::Primary(primary) => {
                primary.to_target(rank)?;
                (self.targets.len(), TargetSide::Primary)
            }
            TargetData::Secondary(_) => (self.secondary_send_buffer_pos.len(), TargetSide::Secondary),
        };
        let lid = data.lid() as usize;
        if lid >= slots {
            return Err(RoutingError::LidOutOfRange {
                thread: self.thread,
                lid,
                slots,
                side,
            });
        }
        Ok(())
    }

    /// Inserts one construction record.
    ///
    /// Validation happens before any list is touched, so a rejected record
    /// leaves the store unchanged.
    pub(crate) fn add_target(&mut self, rank: u32, data: &TargetData) -> Result<()> {
        self.check_record(rank, data)?;

        let thread = self.thread;
        let lid = data.lid() as usize;
        let allocation = |requested| RoutingError::Allocation { thread, requested };
        match data {
            TargetData::Primary(primary) => {
                let target = primary.to_target(rank)?;
                push_with_growth(&mut self.targets[lid], target).map_err(allocation)?;
                trace!(thread, lid, ?target, "Added primary target");
            }
            TargetData::Secondary(secondary) => {
                push_with_growth(
                    &mut self.secondary_send_buffer_pos[lid],
                    secondary.send_buffer_pos,
                )
                .map_err(allocation)?;
                trace!(
                    thread,
                    lid,
                    send_buffer_pos = secondary.send_buffer_pos,
                    "Added secondary send buffer position"
                );
            }
        }

        self.phase = StorePhase::Populated;
        Ok(())
    }

    /// Sorts every LID's send buffer positions and removes duplicates.
    pub(crate) fn compress_secondary_send_buffer_pos(&mut self) -> Result<()> {
        if self.phase == StorePhase::Allocated {
            return Err(RoutingError::NotPrepared {
                thread: self.thread,
            });
        }
        for positions in &mut self.secondary_send_buffer_pos {
            positions.sort_unstable();
            positions.dedup();
        }
        self.phase = StorePhase::Ready;
        Ok(())
    }

    /// Primary targets of `lid`, in insertion order
    pub fn targets(&self, lid: usize) -> Result<&[Target]> {
        self.targets
            .get(lid)
            .map(Vec::as_slice)
            .ok_or(RoutingError::LidOutOfRange {
                thread: self.thread,
                lid,
                slots: self.targets.len(),
                side: TargetSide::Primary,
            })
    }

    /// Sorted, unique send buffer positions of `lid`
    pub fn secondary_send_buffer_pos(&self, lid: usize) -> Result<&[u32]> {
        if self.phase != StorePhase::Ready {
            return Err(RoutingError::NotCompressed {
                thread: self.thread,
            });
        }
        self.secondary_send_buffer_pos
            .get(lid)
            .map(Vec::as_slice)
            .ok_or(RoutingError::LidOutOfRange {
                thread: self.thread,
                lid,
                slots: self.secondary_send_buffer_pos.len(),
                side: TargetSide::Secondary,
            })
    }

    /// Reserved capacity of the primary list of `lid`
    pub fn target_capacity(&self, lid: usize) -> Option<usize> {
        self.targets.get(lid).map(Vec::capacity)
    }

    pub(crate) fn target_lists(&self) -> &[Vec<Target>] {
        &self.targets
    }

    /// Send buffer position lists, regardless of compression state
    pub(crate) fn secondary_lists(&self) -> &[Vec<u32>] {
        &self.secondary_send_buffer_pos
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            thread: self.thread,
            phase: self.phase,
            target_slots: self.targets.len(),
            secondary_slots: self.secondary_send_buffer_pos.len(),
            num_targets: self.targets.iter().map(Vec::len).sum(),
            num_secondary_send_buffer_pos: self
                .secondary_send_buffer_pos
                .iter()
                .map(Vec::len)
                .sum(),
            target_capacity: self.targets.iter().map(Vec::capacity).sum(),
        }
    }
}

/// Reserves room for `slots` lists up front so a failed allocation is
/// reported instead of aborting.
fn reserve_slots<T>(lists: &mut Vec<Vec<T>>, slots: usize, thread: usize) -> Result<()> {
    let additional = slots.saturating_sub(lists.len());
    lists
        .try_reserve_exact(additional)
        .map_err(|_| RoutingError::Allocation {
            thread,
            requested: slots,
        })
}

fn count_beyond<T>(lists: &[Vec<T>], bound: usize) -> usize {
    lists.iter().skip(bound).map(Vec::len).sum()
}

/// Entry counts of one store
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StoreStats {
    pub thread: usize,
    pub phase: StorePhase,
    pub target_slots: usize,
    pub secondary_slots: usize,
    pub num_targets: usize,
    pub num_secondary_send_buffer_pos: usize,
    pub target_capacity: usize,
}
