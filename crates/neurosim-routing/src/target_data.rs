// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Construction records
//!
//! `TargetData` is what the connection distribution step hands to the target
//! table for every (source, destination) pair it resolved. Primary records
//! carry everything needed to build a [`Target`]; secondary records carry a
//! position in the outgoing send buffer of the rank.
//!
//! ## Wire format
//!
//! Records travel between ranks in 12-byte slots. All words are little endian.
//!
//! ```text
//! header  (u32): bits 0..30 lid, bits 30..32 marker (0 primary, 1 secondary)
//! primary  : header | payload (u64 split in two u32 words)
//!            payload bits 0..27 lcid, 27..37 tid, 37..43 syn_id
//! secondary: header | send_buffer_pos (u32) [| 4 zero bytes inside a slot]
//! ```

use crate::error::{Result, RoutingError};
use crate::target::{check_width, Target, LCID_BITS, SYN_ID_BITS, TID_BITS};

/// Bits reserved for the LID in the record header
pub const LID_BITS: u32 = 30;
/// Largest LID a wire record can carry
pub const MAX_LID: u32 = (1 << LID_BITS) - 1;

/// Size of one wire slot (primary record)
pub const TARGET_DATA_SIZE: usize = 12;
/// Size of a secondary record
pub const SECONDARY_TARGET_DATA_SIZE: usize = 8;

const MARKER_PRIMARY: u8 = 0;
const MARKER_SECONDARY: u8 = 1;

const PAYLOAD_TID_SHIFT: u32 = LCID_BITS;
const PAYLOAD_SYN_ID_SHIFT: u32 = LCID_BITS + TID_BITS;
/// Bits of the primary payload that carry fields; the rest must be zero
const PAYLOAD_MASK: u64 = (1 << (PAYLOAD_SYN_ID_SHIFT + SYN_ID_BITS)) - 1;

/// Primary record: a connection reached by direct spike delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimaryTargetData {
    pub lid: u32,
    /// Thread hosting the connection on the destination rank
    pub tid: u16,
    pub syn_id: u8,
    pub lcid: u32,
}

impl PrimaryTargetData {
    /// Builds the compact descriptor for a connection living on `rank`
    pub fn to_target(&self, rank: u32) -> Result<Target> {
        Target::new(self.tid, rank, self.syn_id, self.lcid)
    }
}

/// Secondary record: a connection fed through the send buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecondaryTargetData {
    pub lid: u32,
    pub send_buffer_pos: u32,
}

/// Construction record, discriminated by delivery path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetData {
    Primary(PrimaryTargetData),
    Secondary(SecondaryTargetData),
}

impl TargetData {
    pub fn primary(lid: u32, tid: u16, syn_id: u8, lcid: u32) -> Self {
        TargetData::Primary(PrimaryTargetData {
            lid,
            tid,
            syn_id,
            lcid,
        })
    }

    pub fn secondary(lid: u32, send_buffer_pos: u32) -> Self {
        TargetData::Secondary(SecondaryTargetData {
            lid,
            send_buffer_pos,
        })
    }

    #[inline]
    pub fn lid(&self) -> u32 {
        match self {
            TargetData::Primary(data) => data.lid,
            TargetData::Secondary(data) => data.lid,
        }
    }

    #[inline]
    pub fn is_primary(&self) -> bool {
        matches!(self, TargetData::Primary(_))
    }

    /// Encodes into a 12-byte wire slot
    pub fn to_wire(&self) -> Result<TargetDataWire> {
        match self {
            TargetData::Primary(data) => {
                let header = encode_header(data.lid, MARKER_PRIMARY)?;
                check_width("tid", data.tid as u64, TID_BITS)?;
                check_width("syn_id", data.syn_id as u64, SYN_ID_BITS)?;
                check_width("lcid", data.lcid as u64, LCID_BITS)?;
                let payload = data.lcid as u64
                    | (data.tid as u64) << PAYLOAD_TID_SHIFT
                    | (data.syn_id as u64) << PAYLOAD_SYN_ID_SHIFT;
                Ok(TargetDataWire {
                    header: header.to_le(),
                    payload: [(payload as u32).to_le(), ((payload >> 32) as u32).to_le()],
                })
            }
            TargetData::Secondary(data) => {
                let wire = SecondaryTargetDataWire::from_data(data)?;
                Ok(TargetDataWire {
                    header: wire.header,
                    payload: [wire.send_buffer_pos, 0],
                })
            }
        }
    }

    /// Decodes a 12-byte wire slot, validating the marker and that every
    /// reserved bit is zero
    pub fn from_wire(wire: &TargetDataWire) -> Result<Self> {
        let header = u32::from_le(wire.header);
        let (lid, marker) = decode_header(header);
        match marker {
            MARKER_PRIMARY => {
                let payload = u32::from_le(wire.payload[0]) as u64
                    | (u32::from_le(wire.payload[1]) as u64) << 32;
                let reserved = payload & !PAYLOAD_MASK;
                if reserved != 0 {
                    return Err(RoutingError::ReservedBits { bits: reserved });
                }
                Ok(TargetData::primary(
                    lid,
                    ((payload >> PAYLOAD_TID_SHIFT) & ((1 << TID_BITS) - 1)) as u16,
                    ((payload >> PAYLOAD_SYN_ID_SHIFT) & ((1 << SYN_ID_BITS) - 1)) as u8,
                    (payload & ((1 << LCID_BITS) - 1)) as u32,
                ))
            }
            MARKER_SECONDARY => {
                let padding = u32::from_le(wire.payload[1]);
                if padding != 0 {
                    return Err(RoutingError::ReservedBits {
                        bits: (padding as u64) << 32,
                    });
                }
                let prefix = &wire.as_bytes()[..SECONDARY_TARGET_DATA_SIZE];
                let secondary: SecondaryTargetDataWire = bytemuck::pod_read_unaligned(prefix);
                secondary.to_data()
            }
            other => Err(RoutingError::InvalidDiscriminator(other)),
        }
    }

    /// Decodes a slot straight from a receive buffer
    pub fn from_bytes(bytes: &[u8; TARGET_DATA_SIZE]) -> Result<Self> {
        let wire: TargetDataWire = bytemuck::pod_read_unaligned(bytes);
        Self::from_wire(&wire)
    }
}

fn encode_header(lid: u32, marker: u8) -> Result<u32> {
    check_width("lid", lid as u64, LID_BITS)?;
    Ok(lid | (marker as u32) << LID_BITS)
}

fn decode_header(header: u32) -> (u32, u8) {
    (header & MAX_LID, (header >> LID_BITS) as u8)
}

/// 12-byte wire slot
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TargetDataWire {
    header: u32,
    payload: [u32; 2],
}

impl TargetDataWire {
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// 8-byte secondary record, the leading part of a secondary slot
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SecondaryTargetDataWire {
    header: u32,
    send_buffer_pos: u32,
}

impl SecondaryTargetDataWire {
    pub fn from_data(data: &SecondaryTargetData) -> Result<Self> {
        Ok(Self {
            header: encode_header(data.lid, MARKER_SECONDARY)?.to_le(),
            send_buffer_pos: data.send_buffer_pos.to_le(),
        })
    }

    pub fn to_data(&self) -> Result<TargetData> {
        let (lid, marker) = decode_header(u32::from_le(self.header));
        if marker != MARKER_SECONDARY {
            return Err(RoutingError::InvalidDiscriminator(marker));
        }
        Ok(TargetData::secondary(lid, u32::from_le(self.send_buffer_pos)))
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Iterates over the records of a receive buffer made of 12-byte slots.
pub fn decode_slots(bytes: &[u8]) -> Result<impl Iterator<Item = Result<TargetData>> + '_> {
    if bytes.len() % TARGET_DATA_SIZE != 0 {
        return Err(RoutingError::TruncatedRecord {
            len: bytes.len(),
            record_size: TARGET_DATA_SIZE,
        });
    }
    Ok(bytes.chunks_exact(TARGET_DATA_SIZE).map(|chunk| {
        let wire: TargetDataWire = bytemuck::pod_read_unaligned(chunk);
        TargetData::from_wire(&wire)
    }))
}
