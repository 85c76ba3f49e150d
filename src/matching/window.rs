use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::ops::Range;

use crate::types::Interval;

/// Half-open index range `[lo, hi)` into a sorted collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Window {
    pub lo: usize,
    pub hi: usize,
}

impl Window {
    pub const EMPTY: Window = Window { lo: 0, hi: 0 };

    pub fn new(lo: usize, hi: usize) -> Self {
        debug_assert!(lo <= hi, "window lo {lo} exceeds hi {hi}");
        Self { lo, hi }
    }

    pub fn len(&self) -> usize {
        self.hi - self.lo
    }

    pub fn is_empty(&self) -> bool {
        self.hi == self.lo
    }

    pub fn range(&self) -> Range<usize> {
        self.lo..self.hi
    }

    pub fn contains(&self, other: &Window) -> bool {
        self.lo <= other.lo && other.hi <= self.hi
    }
}

/// Whether `candidate`, extended by `fuzz` on both sides, overlaps `element`.
/// Ends are exclusive, so intervals that only share an edge do not touch
/// unless `fuzz > 0`.
#[inline]
pub fn touches(element: &Interval, candidate: &Interval, fuzz: i64) -> bool {
    candidate.start.saturating_sub(fuzz) < element.end
        && element.start < candidate.end.saturating_add(fuzz)
}

/// For every element, the range of `candidates` that can touch it.
///
/// Both collections must be sorted by start. Candidates may overlap each
/// other, so the left edge is found on the running maximum of candidate ends:
/// everything left of `lo` is guaranteed not to touch, and `candidates[lo]`
/// touches whenever the window is non-empty. Candidates inside the window can
/// still miss the element; see [`TouchingCandidates`] for the exact pass.
///
/// Runs as a two-pointer sweep in O(|elements| + |candidates|); only an
/// element whose end bound shrinks relative to its predecessor costs a
/// binary search.
pub fn touching_windows(elements: &[Interval], candidates: &[Interval], fuzz: i64) -> Vec<Window> {
    let mut windows = Vec::with_capacity(elements.len());
    let n = candidates.len();
    if n == 0 {
        windows.resize(elements.len(), Window::EMPTY);
        return windows;
    }

    let max_end = running_max_end(candidates);
    let mut lo = 0usize;
    let mut hi = 0usize;
    let mut previous_right_bound = i64::MIN;

    for element in elements {
        while lo < n && max_end[lo].saturating_add(fuzz) <= element.start {
            lo += 1;
        }

        let right_bound = element.end.saturating_add(fuzz);
        if right_bound >= previous_right_bound {
            while hi < n && candidates[hi].start < right_bound {
                hi += 1;
            }
        } else {
            hi = candidates.partition_point(|candidate| candidate.start < right_bound);
        }
        previous_right_bound = right_bound;

        windows.push(Window::new(lo, hi.max(lo)));
    }

    windows
}

fn running_max_end(intervals: &[Interval]) -> Vec<i64> {
    let mut max_end = Vec::with_capacity(intervals.len());
    let mut current = i64::MIN;
    for interval in intervals {
        current = current.max(interval.end);
        max_end.push(current);
    }
    max_end
}

/// Element-wise NOR of two masks: `!x[i] && !y[i]`.
pub fn combine_and_flip(x: &[bool], y: &[bool]) -> Vec<bool> {
    let mut out = Vec::with_capacity(x.len());
    combine_and_flip_into(x, y, &mut out);
    out
}

/// [`combine_and_flip`] writing into a reusable buffer.
pub fn combine_and_flip_into(x: &[bool], y: &[bool], out: &mut Vec<bool>) {
    debug_assert_eq!(x.len(), y.len(), "combine_and_flip needs equal-length masks");
    out.clear();
    out.extend(x.iter().zip(y.iter()).map(|(&a, &b)| !a && !b));
}

/// Exact touching candidates of every element, stored flat.
///
/// Built by one sweep over both sorted collections. Candidates that start
/// before an element sit in a min-heap keyed on their fuzz-extended end and
/// are evicted once the sweep passes that end, so each element only visits
/// its real hits plus amortized evictions, however long some candidates are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TouchingCandidates {
    offsets: Vec<usize>,
    hits: Vec<usize>,
    scanned: usize,
}

impl TouchingCandidates {
    pub fn sweep(elements: &[Interval], candidates: &[Interval], fuzz: i64) -> Self {
        let mut offsets = Vec::with_capacity(elements.len() + 1);
        offsets.push(0);
        let mut hits = Vec::new();
        let mut scanned = 0usize;
        let mut active: BinaryHeap<Reverse<(i64, usize)>> = BinaryHeap::new();
        let mut next = 0usize;

        for element in elements {
            while next < candidates.len()
                && candidates[next].start.saturating_sub(fuzz) < element.start
            {
                active.push(Reverse((candidates[next].end.saturating_add(fuzz), next)));
                next += 1;
            }
            while let Some(&Reverse((reach, _))) = active.peek() {
                if reach > element.start {
                    break;
                }
                active.pop();
            }

            // Everything still active starts before the element and reaches
            // past its start, so it touches.
            let segment = hits.len();
            scanned += active.len();
            hits.extend(active.iter().map(|&Reverse((_, index))| index));

            for (index, candidate) in candidates.iter().enumerate().skip(next) {
                if candidate.start.saturating_sub(fuzz) >= element.end {
                    break;
                }
                scanned += 1;
                if touches(element, candidate, fuzz) {
                    hits.push(index);
                }
            }
            hits[segment..].sort_unstable();
            offsets.push(hits.len());
        }

        Self {
            offsets,
            hits,
            scanned,
        }
    }

    /// Ascending candidate indices touching `element`.
    pub fn hits(&self, element: usize) -> &[usize] {
        &self.hits[self.offsets[element]..self.offsets[element + 1]]
    }

    /// `[first hit, last hit + 1)`, or `None` when nothing touches.
    pub fn span(&self, element: usize) -> Option<Window> {
        let hits = self.hits(element);
        Some(Window::new(*hits.first()?, *hits.last()? + 1))
    }

    pub fn element_count(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn total_hits(&self) -> usize {
        self.hits.len()
    }

    /// Candidates examined by the sweep, evictions excluded.
    pub fn scanned(&self) -> usize {
        self.scanned
    }
}
