//! Half-open interval arithmetic over instants
//!
//! Darkness intervals and filter windows are `[start, end)`; the darkness
//! computer closes its final interval at the scan end by construction, an
//! asymmetry that cannot add minutes beyond the astronomical night.

use crate::types::Instant;
use serde::{Deserialize, Serialize};

/// A half-open `[start, end)` span of the UTC timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start: Instant,
    pub end: Instant,
}

impl Interval {
    pub fn new(start: Instant, end: Instant) -> Self {
        Self { start, end }
    }

    /// Whole minutes in this interval, rounded.
    pub fn minutes(&self) -> i64 {
        round_minutes(self.start, self.end)
    }

    pub fn contains(&self, t: Instant) -> bool {
        t >= self.start && t < self.end
    }

    /// Overlap with another interval in whole minutes; zero when disjoint.
    pub fn overlap_minutes(&self, other: &Interval) -> i64 {
        let s = self.start.max(other.start);
        let e = self.end.min(other.end);
        if e > s {
            round_minutes(s, e)
        } else {
            0
        }
    }
}

/// Minutes from `a` to `b`, rounded to the nearest whole minute.
pub fn round_minutes(a: Instant, b: Instant) -> i64 {
    let ms = b.timestamp_millis() - a.timestamp_millis();
    (ms as f64 / 60_000.0).round() as i64
}

/// Sum of rounded minutes over a list of intervals.
pub fn total_minutes(intervals: &[Interval]) -> i64 {
    intervals.iter().map(Interval::minutes).sum()
}

/// True when an instant falls inside any of the given intervals.
pub fn inside_any(t: Instant, intervals: &[Interval]) -> bool {
    intervals.iter().any(|i| i.contains(t))
}

/// Overlap of `window` with a list of intervals, in whole minutes.
pub fn overlap_with_window(intervals: &[Interval], window: &Interval) -> i64 {
    intervals.iter().map(|i| i.overlap_minutes(window)).sum()
}

/// Check the ordering invariant: sorted by start and pairwise disjoint.
pub fn is_sorted_disjoint(intervals: &[Interval]) -> bool {
    intervals.windows(2).all(|w| w[0].end <= w[1].start)
}
