use std::cmp::Ordering;

use super::dominance_score;
use crate::config::MatchConfig;
use crate::error::MatchError;
use crate::matching::outcome::Outcome;
use crate::pipeline::traits::{FragmentResolution, MatchDiagnostics};
use crate::types::{Interval, MatchRecord, PeakType};

/// Element whose window holds several candidates; those candidates are
/// its fragments.
pub(super) struct Parent<'a> {
    pub(super) collection: &'static str,
    pub(super) index: usize,
    pub(super) interval: &'a Interval,
}

/// Classify a parent and its fragments, and link them.
///
/// Fragments are linked back to the parent; the parent is linked to its
/// dominant fragment.
pub(super) fn resolve(
    parent: Parent<'_>,
    parent_record: &mut MatchRecord,
    fragments: &[usize],
    others: &[Interval],
    other_records: &mut [MatchRecord],
    config: &MatchConfig,
    diagnostics: &dyn MatchDiagnostics,
) -> Result<(), MatchError> {
    let Some(dominant) = select_dominant(&parent, fragments, others, config)? else {
        return Ok(());
    };

    let parent_kind = parent.interval.kind;
    let mut same_type = 0usize;
    let mut misidentified = 0usize;
    for &fragment_index in fragments {
        let fragment = &others[fragment_index];
        let outcome = if fragment.kind == parent_kind {
            same_type += 1;
            Outcome::Merged
        } else if !parent_kind.is_classified() {
            Outcome::MergedToUnknown
        } else if !fragment.kind.is_classified() {
            Outcome::MergedAndUnclassified
        } else {
            misidentified += 1;
            Outcome::merged_to(parent_kind)
        };
        let record = &mut other_records[fragment_index];
        record.outcome = outcome;
        record.matched_to = Some(parent.interval.id);
    }

    parent_record.outcome = parent_outcome(parent_kind, same_type, misidentified);
    parent_record.matched_to = Some(others[dominant].id);

    diagnostics.fragments_resolved(&FragmentResolution {
        collection: parent.collection,
        index: parent.index,
        fragments: fragments.len(),
        same_type,
        misidentified,
        outcome: parent_record.outcome,
    });
    Ok(())
}

fn parent_outcome(parent_kind: PeakType, same_type: usize, misidentified: usize) -> Outcome {
    if !parent_kind.is_classified() {
        Outcome::Unclassified
    } else if misidentified > 0 {
        Outcome::SplitAndMisid
    } else if same_type > 1 {
        Outcome::Split
    } else if same_type == 1 {
        Outcome::Chopped
    } else {
        Outcome::SplitAndUnclassified
    }
}

/// Pick the fragment with the highest dominance score; ties go to the earlier
/// start, then the smaller id. Two fragments still equal after that make the
/// match ambiguous.
fn select_dominant(
    parent: &Parent<'_>,
    fragments: &[usize],
    others: &[Interval],
    config: &MatchConfig,
) -> Result<Option<usize>, MatchError> {
    let Some((&first, rest)) = fragments.split_first() else {
        return Ok(None);
    };
    let score =
        |index: usize| dominance_score(parent.interval, &others[index], config.fuzz_ns, config.dominance);

    let mut best = first;
    let mut best_score = score(first);
    let mut tied_with: Option<usize> = None;
    for &candidate in rest {
        let candidate_score = score(candidate);
        match preference(
            candidate_score,
            &others[candidate],
            best_score,
            &others[best],
        ) {
            Ordering::Greater => {
                best = candidate;
                best_score = candidate_score;
                tied_with = None;
            }
            Ordering::Equal => tied_with = Some(candidate),
            Ordering::Less => {}
        }
    }

    if let Some(second) = tied_with {
        return Err(MatchError::AmbiguousMatch {
            collection: parent.collection,
            element: parent.index,
            first: best,
            second,
        });
    }
    Ok(Some(best))
}

/// `Greater` when `a` should be preferred over `b`.
fn preference(a_score: f64, a: &Interval, b_score: f64, b: &Interval) -> Ordering {
    a_score
        .total_cmp(&b_score)
        .then_with(|| b.start.cmp(&a.start))
        .then_with(|| b.id.cmp(&a.id))
}
