// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! 1.5x growth policy for per-LID routing lists
//!
//! Routing lists are numerous and mostly short, so the default doubling of
//! `Vec` wastes up to half of the reserved memory. Lists here grow by a factor
//! of 1.5 with exact reservations instead (see folly's FBVector notes).

/// Capacity a full list of `len` entries grows to
#[inline]
pub fn next_capacity(len: usize) -> usize {
    (len.saturating_mul(3).saturating_add(1) / 2).max(len + 1)
}

/// Appends `value`, growing the list by 1.5x when it is full.
///
/// Returns the requested capacity if the allocation fails; the list is left
/// unchanged in that case.
#[inline]
pub fn push_with_growth<T>(list: &mut Vec<T>, value: T) -> Result<(), usize> {
    if list.len() == list.capacity() {
        let capacity = next_capacity(list.len());
        list.try_reserve_exact(capacity - list.len())
            .map_err(|_| capacity)?;
    }
    list.push(value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_sequence() {
        let mut len = 0;
        let mut sequence = Vec::new();
        for _ in 0..8 {
            len = next_capacity(len);
            sequence.push(len);
        }
        assert_eq!(sequence, vec![1, 2, 3, 5, 8, 12, 18, 27]);
    }

    #[test]
    fn test_capacity_stays_within_bound() {
        let mut list: Vec<u64> = Vec::new();
        let mut reallocations = 0;
        for k in 1..=10_000usize {
            let before = list.capacity();
            push_with_growth(&mut list, k as u64).unwrap();
            if list.capacity() != before {
                reallocations += 1;
            }
            assert!(list.capacity() <= (3 * k + 1) / 2, "k = {k}");
        }
        // log_1.5(10_000) ~ 22.7
        assert!(reallocations <= 25, "reallocations = {reallocations}");
    }

    #[test]
    fn test_push_preserves_order() {
        let mut list = Vec::new();
        for value in [3, 1, 2] {
            push_with_growth(&mut list, value).unwrap();
        }
        assert_eq!(list, vec![3, 1, 2]);
    }
}
