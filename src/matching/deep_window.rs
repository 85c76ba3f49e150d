use super::window::{combine_and_flip_into, TouchingCandidates, Window};
use crate::types::Interval;

/// Narrows coarse touching windows down to the candidates that really
/// overlap an element once `fuzz` is applied.
///
/// The resolver keeps its mask buffers between calls so resolving a whole
/// collection does not allocate per element.
#[derive(Debug, Default)]
pub struct DeepWindowResolver {
    fuzz: i64,
    ends_before: Vec<bool>,
    starts_after: Vec<bool>,
    overlaps: Vec<bool>,
}

impl DeepWindowResolver {
    pub fn new(fuzz: i64) -> Self {
        Self {
            fuzz,
            ..Self::default()
        }
    }

    /// Returns `[first, last + 1)` over the truly overlapping candidates of
    /// `coarse`, or `None` when none of them overlaps. The result always lies
    /// inside `coarse`.
    pub fn resolve(
        &mut self,
        element: &Interval,
        candidates: &[Interval],
        coarse: Window,
    ) -> Option<Window> {
        if coarse.is_empty() {
            return None;
        }
        let slice = &candidates[coarse.range()];

        self.ends_before.clear();
        self.starts_after.clear();
        for candidate in slice {
            self.ends_before
                .push(candidate.end.saturating_add(self.fuzz) <= element.start);
            self.starts_after
                .push(candidate.start.saturating_sub(self.fuzz) >= element.end);
        }
        combine_and_flip_into(&self.ends_before, &self.starts_after, &mut self.overlaps);

        let first = self.overlaps.iter().position(|&hit| hit)?;
        let last = self.overlaps.iter().rposition(|&hit| hit)?;
        Some(Window::new(coarse.lo + first, coarse.lo + last + 1))
    }

    /// Resolves a whole sorted collection in one sweep. A long candidate
    /// stays active across many elements without being rescanned for each.
    pub fn resolve_all(
        &mut self,
        elements: &[Interval],
        candidates: &[Interval],
        coarse: &[Window],
    ) -> Vec<Option<Window>> {
        debug_assert_eq!(elements.len(), coarse.len());
        let sweep = TouchingCandidates::sweep(elements, candidates, self.fuzz);
        coarse
            .iter()
            .enumerate()
            .map(|(index, window)| {
                let hits = sweep.hits(index);
                let inside = &hits[hits.partition_point(|&hit| hit < window.lo)..];
                let inside = &inside[..inside.partition_point(|&hit| hit < window.hi)];
                Some(Window::new(*inside.first()?, *inside.last()? + 1))
            })
            .collect()
    }
}

/// Convenience wrapper around a fresh [`DeepWindowResolver`].
pub fn deep_windows(
    elements: &[Interval],
    candidates: &[Interval],
    coarse: &[Window],
    fuzz: i64,
) -> Vec<Option<Window>> {
    DeepWindowResolver::new(fuzz).resolve_all(elements, candidates, coarse)
}
