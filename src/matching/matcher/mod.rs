use crate::config::{DominanceRule, MatchConfig};
use crate::error::MatchError;
use crate::matching::outcome::Outcome;
use crate::matching::precondition::check_collection;
use crate::matching::window::{touches, touching_windows, TouchingCandidates};
use crate::pipeline::traits::{Direction, MatchDiagnostics, WindowStats};
use crate::types::{Interval, MatchOutput, MatchRecord};

mod fragments;
#[cfg(test)]
mod tests;

pub(crate) const TRUTH: &str = "truth";
pub(crate) const PEAKS: &str = "peaks";

/// Match truth intervals against reconstructed peaks.
///
/// Both collections must be sorted by start. Every element of either side
/// gets exactly one outcome; `matched_to` is set for every outcome except
/// `missed`. The run is symmetric in structure: the first pass resolves each
/// truth interval against its overlapping peaks, the second pass revisits
/// peaks overlapping several truth intervals and marks those as merged.
pub fn match_peaks(
    truth: &[Interval],
    peaks: &[Interval],
    config: &MatchConfig,
    diagnostics: &dyn MatchDiagnostics,
) -> Result<MatchOutput, MatchError> {
    config.validate()?;
    check_collection(TRUTH, truth)?;
    check_collection(PEAKS, peaks)?;
    let fuzz = config.fuzz_ns;

    let forward = resolve_windows(truth, peaks, fuzz);
    diagnostics.windows_resolved(Direction::TruthToPeaks, &forward.stats);
    let backward = resolve_windows(peaks, truth, fuzz);
    diagnostics.windows_resolved(Direction::PeaksToTruth, &backward.stats);

    let mut truth_records: Vec<MatchRecord> = truth.iter().map(MatchRecord::unmatched).collect();
    let mut peak_records: Vec<MatchRecord> = peaks.iter().map(MatchRecord::unmatched).collect();

    for (index, element) in truth.iter().enumerate() {
        match forward.touching.hits(index) {
            [] => {}
            [only] => resolve_single(
                element,
                &mut truth_records[index],
                &peaks[*only],
                &mut peak_records[*only],
                config,
            ),
            several => fragments::resolve(
                fragments::Parent {
                    collection: TRUTH,
                    index,
                    interval: element,
                },
                &mut truth_records[index],
                several,
                peaks,
                &mut peak_records,
                config,
                diagnostics,
            )?,
        }
    }

    for (index, element) in peaks.iter().enumerate() {
        let candidates = backward.touching.hits(index);
        if candidates.len() > 1 {
            fragments::resolve(
                fragments::Parent {
                    collection: PEAKS,
                    index,
                    interval: element,
                },
                &mut peak_records[index],
                candidates,
                truth,
                &mut truth_records,
                config,
                diagnostics,
            )?;
        }
    }

    let output = MatchOutput {
        truth: truth_records,
        peaks: peak_records,
    };
    diagnostics.matching_finished(&output);
    Ok(output)
}

/// Overlap in ns between `candidate` and the fuzz-extended `element`,
/// saturating at `i64::MAX`.
pub fn overlap_ns(element: &Interval, candidate: &Interval, fuzz: i64) -> i64 {
    i64::try_from(overlap_wide(element, candidate, fuzz)).unwrap_or(i64::MAX)
}

/// Fraction of `candidate` attributable to `element`, in [0, 1].
///
/// The candidate's amplitude is taken as uniform over its duration, so this
/// is the fraction of its duration inside the fuzz-extended element. A
/// zero-length candidate counts fully when it touches the element.
pub fn overlap_quality(element: &Interval, candidate: &Interval, fuzz: i64) -> f64 {
    let duration = i128::from(candidate.end) - i128::from(candidate.start);
    if duration <= 0 {
        return if touches(element, candidate, fuzz) { 1.0 } else { 0.0 };
    }
    (overlap_wide(element, candidate, fuzz) as f64 / duration as f64).clamp(0.0, 1.0)
}

// Widened so extreme bounds cannot overflow the subtraction.
fn overlap_wide(element: &Interval, candidate: &Interval, fuzz: i64) -> i128 {
    let lo = candidate.start.max(element.start.saturating_sub(fuzz));
    let hi = candidate.end.min(element.end.saturating_add(fuzz));
    (i128::from(hi) - i128::from(lo)).max(0)
}

pub(crate) fn dominance_score(
    element: &Interval,
    candidate: &Interval,
    fuzz: i64,
    rule: DominanceRule,
) -> f64 {
    match rule {
        DominanceRule::AttributedAmplitude => {
            candidate.amplitude * overlap_quality(element, candidate, fuzz)
        }
        DominanceRule::Overlap => overlap_ns(element, candidate, fuzz) as f64,
    }
}

struct ResolvedWindows {
    touching: TouchingCandidates,
    stats: WindowStats,
}

fn resolve_windows(elements: &[Interval], candidates: &[Interval], fuzz: i64) -> ResolvedWindows {
    let coarse = touching_windows(elements, candidates, fuzz);
    let touching = TouchingCandidates::sweep(elements, candidates, fuzz);

    let mut stats = WindowStats {
        elements: elements.len(),
        scanned: touching.scanned(),
        ..WindowStats::default()
    };
    for (index, coarse) in coarse.iter().enumerate() {
        let deep_len = touching.span(index).map_or(0, |window| window.len());
        stats.coarse_candidates += coarse.len();
        stats.deep_candidates += deep_len;
        if deep_len < coarse.len() {
            stats.narrowed += 1;
        }
    }
    ResolvedWindows { touching, stats }
}

fn resolve_single(
    element: &Interval,
    element_record: &mut MatchRecord,
    counterpart: &Interval,
    counterpart_record: &mut MatchRecord,
    config: &MatchConfig,
) {
    element_record.matched_to = Some(counterpart.id);
    counterpart_record.matched_to = Some(element.id);

    let (element_outcome, counterpart_outcome) = if element.kind == counterpart.kind {
        let quality = overlap_quality(element, counterpart, config.fuzz_ns);
        if quality >= config.found_quality_threshold {
            (Outcome::Found, Outcome::Found)
        } else {
            (Outcome::Chopped, Outcome::Chopped)
        }
    } else if !element.kind.is_classified() || !counterpart.kind.is_classified() {
        (Outcome::Unclassified, Outcome::Unclassified)
    } else {
        (
            Outcome::misid_as(counterpart.kind),
            Outcome::misid_as(element.kind),
        )
    };
    element_record.outcome = element_outcome;
    counterpart_record.outcome = counterpart_outcome;
}
