//! Half-open codepoint intervals and the set operations the classification
//! pipeline is built on.
//!
//! Every classification stage operates only on the residue left by
//! higher-priority stages; `subtract` computes that residue and `merge`
//! maintains the accumulated mask.

use serde::{Deserialize, Serialize};

/// A half-open `[start, end)` range of codepoint offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Interval {
    pub start: usize,
    pub end: usize,
}

impl Interval {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

/// Collapse a list of intervals into the minimal sorted non-overlapping union.
///
/// Adjacent intervals are coalesced; empty intervals are dropped.
pub fn merge(mut ranges: Vec<Interval>) -> Vec<Interval> {
    ranges.retain(|r| !r.is_empty());
    ranges.sort();

    let mut out: Vec<Interval> = Vec::with_capacity(ranges.len());
    for r in ranges {
        match out.last_mut() {
            Some(last) if r.start <= last.end => {
                last.end = last.end.max(r.end);
            }
            _ => out.push(r),
        }
    }
    out
}

/// Subtract `mask` from `a`, returning the minimal sorted non-overlapping
/// ranges that cover everything in `a` not covered by the mask.
pub fn subtract(a: Interval, mask: &[Interval]) -> Vec<Interval> {
    if a.is_empty() {
        return Vec::new();
    }

    let mask = merge(mask.to_vec());
    let mut out = Vec::new();
    let mut cursor = a.start;

    for m in &mask {
        if m.end <= cursor {
            continue;
        }
        if m.start >= a.end {
            break;
        }
        if m.start > cursor {
            out.push(Interval::new(cursor, m.start.min(a.end)));
        }
        cursor = cursor.max(m.end);
        if cursor >= a.end {
            break;
        }
    }

    if cursor < a.end {
        out.push(Interval::new(cursor, a.end));
    }
    out
}

/// True when `[start, end)` lies entirely inside the union of `segs`.
pub fn contains_fully(start: usize, end: usize, segs: &[Interval]) -> bool {
    if end <= start {
        return true;
    }
    subtract(Interval::new(start, end), segs).is_empty()
}

/// True when `[start, end)` intersects any interval in `segs`.
pub fn overlaps_any(start: usize, end: usize, segs: &[Interval]) -> bool {
    let probe = Interval::new(start, end);
    segs.iter().any(|s| s.overlaps(&probe))
}
