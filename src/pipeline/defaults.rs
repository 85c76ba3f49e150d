use std::collections::BTreeMap;

use crate::matching::outcome::Outcome;
use crate::pipeline::traits::{Direction, FragmentResolution, MatchDiagnostics, WindowStats};
use crate::types::{AcceptanceRecord, Interval, MatchOutput, MatchRecord};

/// Forwards engine diagnostics to the `tracing` facade.
pub struct TracingDiagnostics;

impl MatchDiagnostics for TracingDiagnostics {
    fn windows_resolved(&self, direction: Direction, stats: &WindowStats) {
        tracing::debug!(
            direction = direction.as_str(),
            elements = stats.elements,
            coarse_candidates = stats.coarse_candidates,
            deep_candidates = stats.deep_candidates,
            narrowed = stats.narrowed,
            scanned = stats.scanned,
            "matching: windows resolved"
        );
    }

    fn fragments_resolved(&self, resolution: &FragmentResolution) {
        tracing::trace!(
            collection = resolution.collection,
            index = resolution.index,
            fragments = resolution.fragments,
            same_type = resolution.same_type,
            misidentified = resolution.misidentified,
            outcome = resolution.outcome.as_str(),
            "matching: resolved fragments"
        );
    }

    fn matching_finished(&self, output: &MatchOutput) {
        tracing::debug!(
            truth = output.truth.len(),
            peaks = output.peaks.len(),
            truth_outcomes = %format_counts(&output.truth),
            peak_outcomes = %format_counts(&output.peaks),
            "matching: finished"
        );
    }

    fn degenerate_metric(&self, truth_index: usize, truth: &Interval) {
        tracing::warn!(
            truth_index,
            truth_id = truth.id,
            amplitude = truth.amplitude,
            "acceptance: matched truth expects no signal, reconstruction bias set to 0"
        );
    }

    fn acceptance_finished(&self, records: &[AcceptanceRecord]) {
        let found = records.iter().filter(|record| record.is_found).count();
        tracing::debug!(truth = records.len(), found, "acceptance: finished");
    }
}

/// Discards every diagnostic.
pub struct NullDiagnostics;

impl MatchDiagnostics for NullDiagnostics {}

fn format_counts(records: &[MatchRecord]) -> String {
    let mut counts: BTreeMap<Outcome, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.outcome).or_insert(0) += 1;
    }
    counts
        .iter()
        .map(|(outcome, count)| format!("{outcome}={count}"))
        .collect::<Vec<_>>()
        .join(",")
}
