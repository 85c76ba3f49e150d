use std::sync::Mutex;

use proptest::prelude::*;

use super::{match_peaks, overlap_ns, overlap_quality};
use crate::config::{DominanceRule, MatchConfig};
use crate::error::MatchError;
use crate::matching::outcome::Outcome;
use crate::matching::window::touches;
use crate::pipeline::defaults::NullDiagnostics;
use crate::pipeline::traits::{Direction, FragmentResolution, MatchDiagnostics, WindowStats};
use crate::types::{Interval, MatchOutput, PeakType};

fn iv(id: i64, start: i64, end: i64, kind: PeakType, amplitude: f64) -> Interval {
    Interval::new(id, start, end, kind, amplitude)
}

fn run(truth: &[Interval], peaks: &[Interval]) -> MatchOutput {
    run_with(truth, peaks, &MatchConfig::default())
}

fn run_with(truth: &[Interval], peaks: &[Interval], config: &MatchConfig) -> MatchOutput {
    match_peaks(truth, peaks, config, &NullDiagnostics).expect("matching should succeed")
}

fn outcomes(records: &[crate::types::MatchRecord]) -> Vec<Outcome> {
    records.iter().map(|record| record.outcome).collect()
}

#[derive(Default)]
struct RecordingDiagnostics {
    windows: Mutex<Vec<(Direction, WindowStats)>>,
    fragments: Mutex<Vec<FragmentResolution>>,
}

impl MatchDiagnostics for RecordingDiagnostics {
    fn windows_resolved(&self, direction: Direction, stats: &WindowStats) {
        self.windows.lock().unwrap().push((direction, *stats));
    }

    fn fragments_resolved(&self, resolution: &FragmentResolution) {
        self.fragments.lock().unwrap().push(*resolution);
    }
}

#[test]
fn single_contained_peak_is_found() {
    let truth = [iv(0, 0, 10, PeakType::Type1, 100.0)];
    let peaks = [iv(7, 2, 8, PeakType::Type1, 100.0)];
    let output = run(&truth, &peaks);

    assert_eq!(output.truth[0].outcome, Outcome::Found);
    assert_eq!(output.truth[0].matched_to, Some(7));
    assert_eq!(output.peaks[0].outcome, Outcome::Found);
    assert_eq!(output.peaks[0].matched_to, Some(0));
}

#[test]
fn two_fragments_split_the_truth_and_link_the_dominant_one() {
    let truth = [iv(0, 0, 10, PeakType::Type2, 100.0)];
    let peaks = [
        iv(10, 0, 5, PeakType::Type2, 40.0),
        iv(11, 5, 10, PeakType::Type2, 60.0),
    ];
    let output = run(&truth, &peaks);

    assert_eq!(output.truth[0].outcome, Outcome::Split);
    assert_eq!(output.truth[0].matched_to, Some(11));
    assert_eq!(outcomes(&output.peaks), vec![Outcome::Merged, Outcome::Merged]);
    assert!(output.peaks.iter().all(|record| record.matched_to == Some(0)));
}

#[test]
fn disjoint_elements_are_missed() {
    let truth = [iv(0, 0, 10, PeakType::Type2, 1.0)];
    let peaks = [iv(1, 10, 30, PeakType::Type2, 1.0)];
    let output = run(&truth, &peaks);

    assert_eq!(output.truth[0].outcome, Outcome::Missed);
    assert_eq!(output.truth[0].matched_to, None);
    assert_eq!(output.peaks[0].outcome, Outcome::Missed);
    assert_eq!(output.peaks[0].matched_to, None);
}

#[test]
fn empty_collections_produce_empty_or_missed_records() {
    let truth = [iv(0, 0, 10, PeakType::Type1, 1.0)];
    let output = run(&truth, &[]);
    assert_eq!(outcomes(&output.truth), vec![Outcome::Missed]);
    assert!(output.peaks.is_empty());

    let output = run(&[], &[]);
    assert!(output.truth.is_empty() && output.peaks.is_empty());
}

#[test]
fn different_known_types_are_misidentified_both_ways() {
    let truth = [iv(0, 0, 10, PeakType::Type2, 1.0)];
    let peaks = [iv(1, 0, 10, PeakType::Type1, 1.0)];
    let output = run(&truth, &peaks);

    assert_eq!(output.truth[0].outcome, Outcome::MisidAsType1);
    assert_eq!(output.peaks[0].outcome, Outcome::MisidAsType2);
    assert_eq!(output.truth[0].matched_to, Some(1));
}

#[test]
fn unclassified_counterpart_marks_both_unclassified() {
    let truth = [iv(0, 0, 10, PeakType::Type2, 1.0)];
    let peaks = [iv(1, 0, 10, PeakType::Unclassified, 1.0)];
    let output = run(&truth, &peaks);

    assert_eq!(output.truth[0].outcome, Outcome::Unclassified);
    assert_eq!(output.peaks[0].outcome, Outcome::Unclassified);
}

#[test]
fn low_quality_single_match_is_chopped() {
    let truth = [iv(0, 0, 10, PeakType::Type2, 1.0)];
    let peaks = [iv(1, 5, 30, PeakType::Type2, 1.0)];
    assert!((overlap_quality(&truth[0], &peaks[0], 0) - 0.2).abs() < 1e-12);

    let output = run(&truth, &peaks);
    assert_eq!(output.truth[0].outcome, Outcome::Chopped);
    assert_eq!(output.peaks[0].outcome, Outcome::Chopped);
}

#[test]
fn quality_threshold_is_inclusive() {
    let truth = [iv(0, 0, 10, PeakType::Type1, 1.0)];
    let peaks = [iv(1, 5, 15, PeakType::Type1, 1.0)];
    assert_eq!(run(&truth, &peaks).truth[0].outcome, Outcome::Found);

    let strict = MatchConfig {
        found_quality_threshold: 0.6,
        ..MatchConfig::default()
    };
    assert_eq!(
        run_with(&truth, &peaks, &strict).truth[0].outcome,
        Outcome::Chopped
    );
}

#[test]
fn fuzz_extends_the_overlap_test_and_the_quality() {
    let truth = [iv(0, 0, 10, PeakType::Type2, 1.0)];
    let peaks = [iv(1, 12, 20, PeakType::Type2, 1.0)];
    assert_eq!(run(&truth, &peaks).truth[0].outcome, Outcome::Missed);

    let fuzzy = MatchConfig {
        fuzz_ns: 5,
        ..MatchConfig::default()
    };
    assert!((overlap_quality(&truth[0], &peaks[0], 5) - 0.375).abs() < 1e-12);
    let output = run_with(&truth, &peaks, &fuzzy);
    assert_eq!(output.truth[0].outcome, Outcome::Chopped);
    assert_eq!(output.peaks[0].matched_to, Some(0));
}

#[test]
fn peak_covering_two_truths_merges_them() {
    let truth = [
        iv(0, 0, 5, PeakType::Type2, 100.0),
        iv(1, 5, 10, PeakType::Type2, 50.0),
    ];
    let peaks = [iv(9, 0, 10, PeakType::Type2, 150.0)];
    let output = run(&truth, &peaks);

    assert_eq!(outcomes(&output.truth), vec![Outcome::Merged, Outcome::Merged]);
    assert!(output.truth.iter().all(|record| record.matched_to == Some(9)));
    assert_eq!(output.peaks[0].outcome, Outcome::Split);
    assert_eq!(output.peaks[0].matched_to, Some(0));
}

#[test]
fn fragment_of_another_known_type_makes_split_and_misid() {
    let truth = [iv(0, 0, 10, PeakType::Type2, 1.0)];
    let peaks = [
        iv(1, 0, 5, PeakType::Type2, 1.0),
        iv(2, 5, 10, PeakType::Type1, 1.0),
    ];
    let output = run(&truth, &peaks);

    assert_eq!(output.truth[0].outcome, Outcome::SplitAndMisid);
    assert_eq!(
        outcomes(&output.peaks),
        vec![Outcome::Merged, Outcome::MergedToType2]
    );
}

#[test]
fn single_same_type_fragment_among_unclassified_is_chopped() {
    let truth = [iv(0, 0, 10, PeakType::Type2, 1.0)];
    let peaks = [
        iv(1, 0, 5, PeakType::Type2, 1.0),
        iv(2, 5, 10, PeakType::Unclassified, 1.0),
    ];
    let output = run(&truth, &peaks);

    assert_eq!(output.truth[0].outcome, Outcome::Chopped);
    assert_eq!(
        outcomes(&output.peaks),
        vec![Outcome::Merged, Outcome::MergedAndUnclassified]
    );
}

#[test]
fn only_unclassified_fragments_make_split_and_unclassified() {
    let truth = [iv(0, 0, 10, PeakType::Type1, 1.0)];
    let peaks = [
        iv(1, 0, 5, PeakType::Unclassified, 1.0),
        iv(2, 5, 10, PeakType::Unclassified, 1.0),
    ];
    let output = run(&truth, &peaks);

    assert_eq!(output.truth[0].outcome, Outcome::SplitAndUnclassified);
    assert_eq!(
        outcomes(&output.peaks),
        vec![
            Outcome::MergedAndUnclassified,
            Outcome::MergedAndUnclassified
        ]
    );
}

#[test]
fn fragments_of_unclassified_parent_are_merged_to_unknown() {
    let truth = [iv(0, 0, 10, PeakType::Unclassified, 1.0)];
    let peaks = [
        iv(1, 0, 5, PeakType::Type1, 1.0),
        iv(2, 5, 10, PeakType::Type2, 1.0),
    ];
    let output = run(&truth, &peaks);

    assert_eq!(output.truth[0].outcome, Outcome::Unclassified);
    assert_eq!(
        outcomes(&output.peaks),
        vec![Outcome::MergedToUnknown, Outcome::MergedToUnknown]
    );
}

#[test]
fn equal_scores_prefer_the_earlier_fragment() {
    let truth = [iv(0, 0, 10, PeakType::Type2, 1.0)];
    let peaks = [
        iv(5, 0, 5, PeakType::Type2, 50.0),
        iv(4, 5, 10, PeakType::Type2, 50.0),
    ];
    assert_eq!(run(&truth, &peaks).truth[0].matched_to, Some(5));
}

#[test]
fn overlap_rule_picks_the_longest_overlap() {
    let truth = [iv(0, 0, 10, PeakType::Type2, 1.0)];
    let peaks = [
        iv(1, 0, 8, PeakType::Type2, 10.0),
        iv(2, 8, 20, PeakType::Type2, 100.0),
    ];
    assert_eq!(run(&truth, &peaks).truth[0].matched_to, Some(2));

    let by_overlap = MatchConfig {
        dominance: DominanceRule::Overlap,
        ..MatchConfig::default()
    };
    assert_eq!(
        run_with(&truth, &peaks, &by_overlap).truth[0].matched_to,
        Some(1)
    );
}

#[test]
fn indistinguishable_fragments_are_ambiguous() {
    let truth = [iv(0, 0, 10, PeakType::Type2, 1.0)];
    let peaks = [
        iv(3, 0, 5, PeakType::Type2, 50.0),
        iv(3, 0, 5, PeakType::Type2, 50.0),
    ];
    let result = match_peaks(&truth, &peaks, &MatchConfig::default(), &NullDiagnostics);
    match result {
        Err(MatchError::AmbiguousMatch {
            collection,
            element,
            first,
            second,
        }) => {
            assert_eq!(collection, "truth");
            assert_eq!(element, 0);
            assert_eq!((first, second), (0, 1));
        }
        other => panic!("expected ambiguous match, got {other:?}"),
    }
}

#[test]
fn later_stronger_fragment_clears_an_earlier_tie() {
    let truth = [iv(0, 0, 10, PeakType::Type2, 1.0)];
    let peaks = [
        iv(3, 0, 4, PeakType::Type2, 50.0),
        iv(3, 0, 4, PeakType::Type2, 50.0),
        iv(4, 4, 10, PeakType::Type2, 100.0),
    ];
    assert_eq!(run(&truth, &peaks).truth[0].matched_to, Some(4));
}

#[test]
fn unsorted_input_and_negative_fuzz_are_rejected() {
    let truth = [
        iv(0, 10, 20, PeakType::Type1, 1.0),
        iv(1, 0, 5, PeakType::Type1, 1.0),
    ];
    let result = match_peaks(&truth, &[], &MatchConfig::default(), &NullDiagnostics);
    assert!(matches!(
        result,
        Err(MatchError::Precondition {
            collection: "truth",
            index: 1,
            ..
        })
    ));

    let negative = MatchConfig {
        fuzz_ns: -1,
        ..MatchConfig::default()
    };
    let result = match_peaks(&[], &[], &negative, &NullDiagnostics);
    assert!(matches!(result, Err(MatchError::Precondition { .. })));
}

#[test]
fn fragment_resolutions_go_through_the_sink() {
    let truth = [iv(0, 0, 10, PeakType::Type2, 100.0)];
    let peaks = [
        iv(10, 0, 5, PeakType::Type2, 40.0),
        iv(11, 5, 10, PeakType::Type2, 60.0),
    ];
    let diagnostics = RecordingDiagnostics::default();
    match_peaks(&truth, &peaks, &MatchConfig::default(), &diagnostics).unwrap();

    let fragments = diagnostics.fragments.lock().unwrap();
    assert_eq!(
        *fragments,
        vec![FragmentResolution {
            collection: "truth",
            index: 0,
            fragments: 2,
            same_type: 2,
            misidentified: 0,
            outcome: Outcome::Split,
        }]
    );
    let windows = diagnostics.windows.lock().unwrap();
    assert_eq!(windows.len(), 2);
    assert_eq!(windows[0].0, Direction::TruthToPeaks);
    assert_eq!(windows[1].0, Direction::PeaksToTruth);
}

#[test]
fn spanning_peak_keeps_matching_linear() {
    let n = 2_000i64;
    let truth: Vec<Interval> = (0..n)
        .map(|k| iv(k, 10 * k + 1, 10 * k + 4, PeakType::Type1, 5.0))
        .collect();
    let mut peaks = vec![iv(1_000_000, 0, 10 * n, PeakType::Type1, 1.0)];
    peaks.extend((0..n).map(|k| iv(k, 10 * k + 2, 10 * k + 3, PeakType::Type1, 10.0)));

    let diagnostics = RecordingDiagnostics::default();
    let output = match_peaks(&truth, &peaks, &MatchConfig::default(), &diagnostics).unwrap();

    let windows = diagnostics.windows.lock().unwrap();
    for (direction, stats) in windows.iter() {
        assert_eq!(stats.scanned, 2 * n as usize, "{}", direction.as_str());
    }
    assert_eq!(diagnostics.fragments.lock().unwrap().len(), n as usize + 1);

    // The spanning peak swallows every truth interval in the reverse pass.
    assert_eq!(output.peaks[0].outcome, Outcome::Split);
    assert_eq!(output.peaks[0].matched_to, Some(0));
    assert!(output
        .truth
        .iter()
        .all(|record| record.outcome == Outcome::Merged && record.matched_to == Some(1_000_000)));
    assert!(output.peaks[1..]
        .iter()
        .zip(truth.iter())
        .all(|(record, truth)| record.outcome == Outcome::Merged && record.matched_to == Some(truth.id)));
}

#[test]
fn extreme_bounds_do_not_overflow_the_quality() {
    let truth = [iv(0, 0, 10, PeakType::Type1, 1.0)];
    let peaks = [iv(1, -6_000_000_000_000_000_000, 6_000_000_000_000_000_000, PeakType::Type1, 1.0)];
    let output = run(&truth, &peaks);

    assert_eq!(output.truth[0].outcome, Outcome::Chopped);
    assert_eq!(output.peaks[0].matched_to, Some(0));
    let quality = overlap_quality(&truth[0], &peaks[0], 0);
    assert!(quality > 0.0 && quality < 1e-12, "quality {quality}");

    let everything = iv(2, i64::MIN, i64::MAX, PeakType::Type1, 1.0);
    assert_eq!(overlap_ns(&everything, &everything, 5), i64::MAX);
    assert_eq!(overlap_quality(&everything, &everything, 5), 1.0);
}

fn arb_collection(
    offset: i64,
    span: i64,
    max_len: usize,
) -> impl Strategy<Value = Vec<Interval>> {
    proptest::collection::vec((0..span, 0i64..50, 0i16..3, 0.0f64..100.0), 0..max_len).prop_map(
        move |raw| {
            let mut intervals: Vec<Interval> = raw
                .into_iter()
                .map(|(start, len, code, amplitude)| {
                    let kind = PeakType::from_code(code).unwrap_or(PeakType::Unclassified);
                    Interval::new(0, offset + start, offset + start + len, kind, amplitude)
                })
                .collect();
            intervals.sort_by_key(|interval| interval.start);
            for (index, interval) in intervals.iter_mut().enumerate() {
                interval.id = offset + index as i64;
            }
            intervals
        },
    )
}

proptest! {
    #[test]
    fn output_is_aligned_with_input(
        truth in arb_collection(0, 1_000, 40),
        peaks in arb_collection(0, 1_000, 40),
        fuzz in 0i64..20,
    ) {
        let config = MatchConfig { fuzz_ns: fuzz, ..MatchConfig::default() };
        let output = match_peaks(&truth, &peaks, &config, &NullDiagnostics).unwrap();
        prop_assert_eq!(output.truth.len(), truth.len());
        prop_assert_eq!(output.peaks.len(), peaks.len());
        for (record, interval) in output.truth.iter().zip(truth.iter()) {
            prop_assert_eq!(record.id, interval.id);
            prop_assert_eq!((record.start, record.end), (interval.start, interval.end));
        }
    }

    #[test]
    fn matched_to_is_set_exactly_when_something_matched(
        truth in arb_collection(0, 1_000, 40),
        peaks in arb_collection(10_000, 1_000, 40),
    ) {
        let peaks: Vec<Interval> = peaks
            .into_iter()
            .map(|mut peak| {
                peak.start -= 10_000;
                peak.end -= 10_000;
                peak
            })
            .collect();
        let output = match_peaks(&truth, &peaks, &MatchConfig::default(), &NullDiagnostics).unwrap();
        for record in &output.truth {
            prop_assert_eq!(record.matched_to.is_some(), record.outcome.implies_match());
            if let Some(id) = record.matched_to {
                prop_assert!(peaks.iter().any(|peak| peak.id == id));
            }
        }
        for record in &output.peaks {
            prop_assert_eq!(record.matched_to.is_some(), record.outcome.implies_match());
            if let Some(id) = record.matched_to {
                prop_assert!(truth.iter().any(|interval| interval.id == id));
            }
        }
    }

    #[test]
    fn disjoint_collections_are_all_missed(
        truth in arb_collection(0, 1_000, 30),
        peaks in arb_collection(5_000, 1_000, 30),
    ) {
        let output = match_peaks(&truth, &peaks, &MatchConfig::default(), &NullDiagnostics).unwrap();
        let all_missed = output.truth.iter().chain(output.peaks.iter()).all(|record| {
            record.outcome == Outcome::Missed && record.matched_to.is_none()
        });
        prop_assert!(all_missed);
    }

    #[test]
    fn matching_is_deterministic(
        truth in arb_collection(0, 500, 40),
        peaks in arb_collection(0, 500, 40),
        fuzz in 0i64..10,
    ) {
        let config = MatchConfig { fuzz_ns: fuzz, ..MatchConfig::default() };
        let first = match_peaks(&truth, &peaks, &config, &NullDiagnostics).unwrap();
        let second = match_peaks(&truth, &peaks, &config, &NullDiagnostics).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn one_to_one_same_type_pairs_are_found(
        gaps in proptest::collection::vec((1i64..50, 1i64..50), 0..30),
    ) {
        let mut truth = Vec::new();
        let mut peaks = Vec::new();
        let mut cursor = 0i64;
        for (index, (gap, len)) in gaps.into_iter().enumerate() {
            let start = cursor + gap;
            let end = start + len;
            truth.push(Interval::new(index as i64, start, end, PeakType::Type1, 1.0));
            peaks.push(Interval::new(index as i64, start, end, PeakType::Type1, 1.0));
            cursor = end;
        }
        let output = match_peaks(&truth, &peaks, &MatchConfig::default(), &NullDiagnostics).unwrap();
        prop_assert!(output.truth.iter().all(|record| record.outcome == Outcome::Found));
        prop_assert!(output.peaks.iter().all(|record| record.outcome == Outcome::Found));
    }

    #[test]
    fn found_iff_quality_reaches_threshold(
        truth_start in -1_000i64..1_000,
        truth_len in 0i64..200,
        peak_offset in -150i64..150,
        peak_len in 0i64..200,
        fuzz in 0i64..20,
        threshold in 0.0f64..=1.0,
    ) {
        let peak_start = truth_start + peak_offset;
        let truth = [iv(0, truth_start, truth_start + truth_len, PeakType::Type2, 1.0)];
        let peaks = [iv(0, peak_start, peak_start + peak_len, PeakType::Type2, 1.0)];
        prop_assume!(touches(&truth[0], &peaks[0], fuzz));
        let config = MatchConfig {
            fuzz_ns: fuzz,
            found_quality_threshold: threshold,
            ..MatchConfig::default()
        };
        let output = run_with(&truth, &peaks, &config);

        let quality = overlap_quality(&truth[0], &peaks[0], fuzz);
        let expected = if quality >= threshold { Outcome::Found } else { Outcome::Chopped };
        prop_assert_eq!(output.truth[0].outcome, expected);
        prop_assert_eq!(output.peaks[0].outcome, expected);
    }
}
