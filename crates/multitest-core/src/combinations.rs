// crates/multitest-core/src/combinations.rs
// ============================================================================
// Module: Combination Enumeration
// Description: Size-ascending, lexicographic enumeration of feature subsets.
// Purpose: Produce every non-empty subset exactly once in a stable order.
// Dependencies: crate::features
// ============================================================================

//! ## Overview
//! Subsets are produced for r = 1, 2, ... in turn. Within one size they follow
//! the lexicographic order of their index tuples, so `[a, b, c]` yields
//! `[a] [b] [c] [a, b] [a, c] [b, c] [a, b, c]`.
//!
//! ## Invariants
//! - Every subset of size r precedes every subset of size r + 1.
//! - The iterator is fused and its length is known up front.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::iter::FusedIterator;

use crate::features::Combination;

// ============================================================================
// SECTION: Counting
// ============================================================================

/// Returns the number of non-empty subsets of `n` features with at most
/// `max_size` members (`2^n - 1` without a limit). Saturates at `u64::MAX`.
#[must_use]
pub fn combination_count(n: usize, max_size: Option<usize>) -> u64 {
    let n = u64::try_from(n).unwrap_or(u64::MAX);
    let limit = max_size.map_or(n, |max| u64::try_from(max).unwrap_or(u64::MAX).min(n));
    if limit == n {
        return if n >= 64 { u64::MAX } else { (1_u64 << n) - 1 };
    }
    let mut total: u64 = 0;
    for r in 1..=limit {
        let Some(count) = binomial(n, r) else {
            return u64::MAX;
        };
        total = total.saturating_add(count);
    }
    total
}

/// Computes `C(n, r)`, or `None` when it does not fit in a `u64`.
fn binomial(n: u64, r: u64) -> Option<u64> {
    if r > n {
        return Some(0);
    }
    let r = r.min(n - r);
    let mut acc: u128 = 1;
    for k in 0..r {
        acc = acc * u128::from(n - k) / u128::from(k + 1);
        if acc > u128::from(u64::MAX) {
            return None;
        }
    }
    u64::try_from(acc).ok()
}

// ============================================================================
// SECTION: Iterator
// ============================================================================

/// Lazy iterator over the combinations of a feature slice.
#[derive(Debug, Clone)]
pub struct Combinations<'a> {
    /// Feature universe in enumeration order.
    features: &'a [String],
    /// Largest subset size to produce.
    max_size: usize,
    /// Index tuple of the next combination; `None` once exhausted.
    next: Option<Vec<usize>>,
    /// Combinations not yet yielded.
    remaining: u64,
}

impl<'a> Combinations<'a> {
    /// Starts enumeration over `features`, optionally capping subset size.
    pub(crate) fn new(features: &'a [String], max_size: Option<usize>) -> Self {
        let max_size = max_size.map_or(features.len(), |max| max.min(features.len()));
        let next = if max_size == 0 { None } else { Some(vec![0]) };
        Self {
            features,
            max_size,
            next,
            remaining: combination_count(features.len(), Some(max_size)),
        }
    }

    /// Computes the index tuple following `current`.
    fn successor(&self, mut current: Vec<usize>) -> Option<Vec<usize>> {
        let n = self.features.len();
        let r = current.len();
        // Rightmost position that can still move right.
        if let Some(position) = (0..r).rev().find(|&i| current[i] < n - r + i) {
            current[position] += 1;
            for i in position + 1..r {
                current[i] = current[i - 1] + 1;
            }
            return Some(current);
        }
        if r < self.max_size { Some((0..=r).collect()) } else { None }
    }
}

impl Iterator for Combinations<'_> {
    type Item = Combination;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        let features = current.iter().map(|&index| self.features[index].clone()).collect();
        self.next = self.successor(current);
        self.remaining = self.remaining.saturating_sub(1);
        Some(Combination::from_validated(features))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Combinations<'_> {}

impl FusedIterator for Combinations<'_> {}
