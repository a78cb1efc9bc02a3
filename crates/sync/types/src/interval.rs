//! Closed block-number interval sets.
//!
//! An [`Interval`] is an inclusive `[start_block, end_block]` range. A set of intervals is kept
//! as a sorted `Vec<Interval>`; [`union`] normalises any set into its minimal disjoint,
//! non-adjacent form and [`intersection_many`] computes the ranges shared by every group.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when constructing an invalid [`Interval`].
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("invalid interval: start {start} is greater than end {end}")]
pub struct IntervalError {
    /// Requested start block.
    pub start: u64,
    /// Requested end block.
    pub end: u64,
}

/// Inclusive range of block numbers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct Interval {
    /// First block of the range.
    pub start_block: u64,
    /// Last block of the range, inclusive.
    pub end_block: u64,
}

impl Interval {
    /// Creates a new interval. `start_block` must not exceed `end_block`.
    pub const fn new(start_block: u64, end_block: u64) -> Self {
        debug_assert!(start_block <= end_block);
        Self { start_block, end_block }
    }

    /// Creates a new interval, rejecting reversed bounds.
    pub const fn try_new(start_block: u64, end_block: u64) -> Result<Self, IntervalError> {
        if start_block > end_block {
            return Err(IntervalError { start: start_block, end: end_block });
        }
        Ok(Self { start_block, end_block })
    }

    /// Returns `true` if `block` lies inside the interval.
    pub const fn contains(&self, block: u64) -> bool {
        self.start_block <= block && block <= self.end_block
    }

    /// Number of blocks covered by the interval.
    pub const fn len(&self) -> u64 {
        (self.end_block - self.start_block).saturating_add(1)
    }

    /// Intervals are closed, so they are never empty.
    pub const fn is_empty(&self) -> bool {
        false
    }
}

impl From<(u64, u64)> for Interval {
    fn from((start_block, end_block): (u64, u64)) -> Self {
        Self::new(start_block, end_block)
    }
}

impl core::fmt::Display for Interval {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[{}, {}]", self.start_block, self.end_block)
    }
}

/// Merges overlapping and adjacent intervals.
///
/// The result is sorted by start, pairwise disjoint and non-adjacent, and covers exactly the
/// same block numbers as the input.
pub fn union<I>(intervals: I) -> Vec<Interval>
where
    I: IntoIterator<Item = Interval>,
{
    let mut sorted: Vec<Interval> = intervals.into_iter().collect();
    sorted.sort_unstable();

    let mut merged: Vec<Interval> = Vec::with_capacity(sorted.len());
    for interval in sorted {
        match merged.last_mut() {
            Some(last) if interval.start_block <= last.end_block.saturating_add(1) => {
                last.end_block = last.end_block.max(interval.end_block);
            }
            _ => merged.push(interval),
        }
    }
    merged
}

/// Intersects two interval sets with a merge scan. Both inputs must already be normalised.
fn intersection(a: &[Interval], b: &[Interval]) -> Vec<Interval> {
    let mut result = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        let start = a[i].start_block.max(b[j].start_block);
        let end = a[i].end_block.min(b[j].end_block);
        if start <= end {
            result.push(Interval::new(start, end));
        }

        if a[i].end_block < b[j].end_block {
            i += 1;
        } else {
            j += 1;
        }
    }
    result
}

/// Returns the ranges present in every group.
///
/// Each group is normalised with [`union`] first. An empty group, or no groups at all, yields an
/// empty result.
pub fn intersection_many<G>(groups: G) -> Vec<Interval>
where
    G: IntoIterator,
    G::Item: IntoIterator<Item = Interval>,
{
    let mut groups = groups.into_iter().map(union);

    let Some(first) = groups.next() else {
        return Vec::new();
    };

    groups.fold(first, |acc, group| {
        if acc.is_empty() {
            return acc;
        }
        union(intersection(&acc, &group))
    })
}
