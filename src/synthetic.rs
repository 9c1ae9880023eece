// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Deterministic synthetic connectivity for probing and benchmarking.

use neurosim_routing::{
    ConstructionFeed, StaticTopology, TargetData, ThreadTopology, MAX_LCID, MAX_SYN_ID,
};

/// Every fourth record is a secondary send-buffer position.
const SECONDARY_STRIDE: u32 = 4;
/// Distinct send-buffer positions drawn by secondary records.
const SEND_BUFFER_POSITIONS: u32 = 512;

/// Pseudo-random records derived only from `(thread_id, index)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticFeed {
    topology: StaticTopology,
    records_per_thread: u32,
    max_lid_bound: usize,
}

impl SyntheticFeed {
    pub fn new(topology: StaticTopology, records_per_thread: u32, max_lid_bound: usize) -> Self {
        Self {
            topology,
            records_per_thread,
            max_lid_bound,
        }
    }

    pub fn records_per_thread(&self) -> u32 {
        self.records_per_thread
    }

    fn record(&self, thread_id: usize, i: u32) -> (u32, TargetData) {
        let mix = mix(thread_id as u64, i as u64);
        let rank = (mix % self.topology.num_ranks() as u64) as u32;
        let bound = self.max_lid_bound as u64;

        // secondary LIDs must stay below the bound; with a zero bound only
        // LID 0 exists, and only on the primary side
        if bound > 0 && i % SECONDARY_STRIDE == 0 {
            let lid = ((mix >> 8) % bound) as u32;
            let pos = ((mix >> 32) % SEND_BUFFER_POSITIONS as u64) as u32;
            return (rank, TargetData::secondary(lid, pos));
        }

        let lid = ((mix >> 8) % (bound + 1)) as u32;
        let tid = ((mix >> 20) % self.topology.num_threads() as u64) as u16;
        let syn_id = ((mix >> 30) % (MAX_SYN_ID as u64 + 1)) as u8;
        let lcid = ((mix >> 36) % (MAX_LCID as u64 + 1)) as u32;
        (rank, TargetData::primary(lid, tid, syn_id, lcid))
    }
}

impl ConstructionFeed for SyntheticFeed {
    fn records(&self, thread_id: usize) -> Box<dyn Iterator<Item = (u32, TargetData)> + '_> {
        if thread_id >= self.topology.num_threads() {
            return Box::new(std::iter::empty());
        }
        Box::new((0..self.records_per_thread).map(move |i| self.record(thread_id, i)))
    }
}

/// splitmix64 finalizer over the record coordinates
fn mix(thread_id: u64, index: u64) -> u64 {
    let mut z = (thread_id << 32 | index).wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
