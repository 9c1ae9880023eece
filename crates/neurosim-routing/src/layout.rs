// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Startup validation of routing record layouts
//!
//! Receive buffers are sized in units of these records on every rank, so a
//! layout that drifts from the wire size corrupts communication silently. The
//! check runs once when a [`TargetTable`](crate::TargetTable) is created.

use crate::target::Target;
use crate::target_data::{
    SecondaryTargetDataWire, TargetDataWire, SECONDARY_TARGET_DATA_SIZE, TARGET_DATA_SIZE,
};

/// Expected size of a [`Target`]
pub const TARGET_SIZE: usize = 8;

/// A routing record whose in-memory size differs from its wire size
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{type_name} occupies {actual} bytes, expected {expected}")]
pub struct LayoutError {
    pub type_name: &'static str,
    pub expected: usize,
    pub actual: usize,
}

/// Checks that `T` occupies exactly `expected` bytes
pub fn check_size<T>(expected: usize) -> Result<(), LayoutError> {
    let actual = core::mem::size_of::<T>();
    if actual != expected {
        return Err(LayoutError {
            type_name: core::any::type_name::<T>(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// Validates every record the target table stores or decodes
pub fn validate_layout() -> Result<(), LayoutError> {
    check_size::<Target>(TARGET_SIZE)?;
    check_size::<TargetDataWire>(TARGET_DATA_SIZE)?;
    check_size::<SecondaryTargetDataWire>(SECONDARY_TARGET_DATA_SIZE)?;
    Ok(())
}
