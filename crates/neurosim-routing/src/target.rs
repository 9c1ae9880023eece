// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Compact target descriptor
//!
//! A `Target` names one direct delivery destination of a spike: the thread and
//! rank hosting the receiving connection, the connection type, and the index of
//! the connection within that thread's connection storage. All four fields are
//! packed into a single `u64`:
//!
//! ```text
//!  63  62      57 56        47 46            27 26                  0
//! +---+----------+------------+----------------+---------------------+
//! | 0 |  syn_id  |    tid     |      rank      |        lcid         |
//! +---+----------+------------+----------------+---------------------+
//! ```

use core::fmt;

use crate::error::{Result, RoutingError};

/// Bits reserved for the local connection index
pub const LCID_BITS: u32 = 27;
/// Bits reserved for the destination rank
pub const RANK_BITS: u32 = 20;
/// Bits reserved for the destination thread
pub const TID_BITS: u32 = 10;
/// Bits reserved for the connection type id
pub const SYN_ID_BITS: u32 = 6;

const LCID_SHIFT: u32 = 0;
const RANK_SHIFT: u32 = LCID_SHIFT + LCID_BITS;
const TID_SHIFT: u32 = RANK_SHIFT + RANK_BITS;
const SYN_ID_SHIFT: u32 = TID_SHIFT + TID_BITS;

const fn mask(bits: u32) -> u64 {
    (1u64 << bits) - 1
}

/// Largest encodable local connection index
pub const MAX_LCID: u32 = mask(LCID_BITS) as u32;
/// Largest encodable rank
pub const MAX_RANK: u32 = mask(RANK_BITS) as u32;
/// Largest encodable thread id
pub const MAX_TID: u16 = mask(TID_BITS) as u16;
/// Largest encodable connection type id
pub const MAX_SYN_ID: u8 = mask(SYN_ID_BITS) as u8;

/// Upper bound on worker threads per rank, dictated by `TID_BITS`
pub const MAX_THREADS: usize = MAX_TID as usize + 1;
/// Upper bound on ranks, dictated by `RANK_BITS`
pub const MAX_RANKS: usize = MAX_RANK as usize + 1;

/// Checks that `value` fits in `bits` bits
pub(crate) fn check_width(field: &'static str, value: u64, bits: u32) -> Result<()> {
    if value > mask(bits) {
        return Err(RoutingError::FieldOverflow { field, value, bits });
    }
    Ok(())
}

/// Bit-packed destination of a primary (spike) connection
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Target(u64);

impl Target {
    /// Packs a descriptor, rejecting any field that does not fit its bit width.
    pub fn new(tid: u16, rank: u32, syn_id: u8, lcid: u32) -> Result<Self> {
        check_width("tid", tid as u64, TID_BITS)?;
        check_width("rank", rank as u64, RANK_BITS)?;
        check_width("syn_id", syn_id as u64, SYN_ID_BITS)?;
        check_width("lcid", lcid as u64, LCID_BITS)?;

        Ok(Self(
            (lcid as u64) << LCID_SHIFT
                | (rank as u64) << RANK_SHIFT
                | (tid as u64) << TID_SHIFT
                | (syn_id as u64) << SYN_ID_SHIFT,
        ))
    }

    #[inline(always)]
    pub fn tid(self) -> u16 {
        ((self.0 >> TID_SHIFT) & mask(TID_BITS)) as u16
    }

    #[inline(always)]
    pub fn rank(self) -> u32 {
        ((self.0 >> RANK_SHIFT) & mask(RANK_BITS)) as u32
    }

    #[inline(always)]
    pub fn syn_id(self) -> u8 {
        ((self.0 >> SYN_ID_SHIFT) & mask(SYN_ID_BITS)) as u8
    }

    #[inline(always)]
    pub fn lcid(self) -> u32 {
        ((self.0 >> LCID_SHIFT) & mask(LCID_BITS)) as u32
    }

    /// Raw packed representation
    #[inline(always)]
    pub fn to_bits(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("tid", &self.tid())
            .field("rank", &self.rank())
            .field("syn_id", &self.syn_id())
            .field("lcid", &self.lcid())
            .finish()
    }
}
