use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;
use statrs::distribution::{Beta, ContinuousCDF, Normal};

use crate::error::MatchError;
use crate::matching::outcome::Outcome;
use crate::types::{AcceptanceRecord, Interval, MatchOutput, MatchRecord, PeakType};

/// Upper bound on the bins of [`binned_acceptance`].
pub const MAX_BINS: usize = 100_000;

/// Per-bin counts of matching outcomes along some per-element quantity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeHistogram {
    pub bin_edges: Vec<f64>,
    pub total: Vec<u64>,
    /// Only outcomes that occur at least once.
    pub by_outcome: BTreeMap<Outcome, Vec<u64>>,
}

impl OutcomeHistogram {
    pub fn bin_centers(&self) -> Vec<f64> {
        self.bin_edges
            .windows(2)
            .map(|edges| (edges[0] + edges[1]) / 2.0)
            .collect()
    }

    pub fn counts(&self, outcome: Outcome) -> Option<&[u64]> {
        self.by_outcome.get(&outcome).map(Vec::as_slice)
    }
}

/// Fraction of a bin that passed, with 1-sigma binomial errors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BinnedFraction {
    pub center: f64,
    pub total: f64,
    pub passed: f64,
    pub fraction: f64,
    pub lower_error: f64,
    pub upper_error: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchSummary {
    pub truth_outcomes: BTreeMap<Outcome, usize>,
    pub peak_outcomes: BTreeMap<Outcome, usize>,
    pub found_fraction: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bias: Option<BiasDistribution>,
    pub acceptance_by_type: Vec<TypeAcceptance>,
}

/// Reconstruction bias over matched truth intervals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BiasDistribution {
    pub count: usize,
    pub mean: f64,
    pub p50: f64,
    pub p90: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TypeAcceptance {
    #[serde(rename = "type")]
    pub kind: PeakType,
    pub count: usize,
    pub mean_acceptance: f64,
}

/// Histogram `records` by `values[i]` into bins `[edge_i, edge_{i+1})`.
///
/// Values outside the edges or NaN are not counted.
pub fn outcome_histogram(
    records: &[MatchRecord],
    values: &[f64],
    bin_edges: &[f64],
) -> Result<OutcomeHistogram, MatchError> {
    check_edges(bin_edges)?;
    if records.len() != values.len() {
        return Err(MatchError::invalid_config(format!(
            "{} records but {} histogram values",
            records.len(),
            values.len()
        )));
    }

    let n_bins = bin_edges.len() - 1;
    let mut total = vec![0u64; n_bins];
    let mut by_outcome: BTreeMap<Outcome, Vec<u64>> = BTreeMap::new();
    for (record, &value) in records.iter().zip(values.iter()) {
        let Some(bin) = bin_index(bin_edges, value) else {
            continue;
        };
        total[bin] += 1;
        by_outcome
            .entry(record.outcome)
            .or_insert_with(|| vec![0; n_bins])[bin] += 1;
    }

    Ok(OutcomeHistogram {
        bin_edges: bin_edges.to_vec(),
        total,
        by_outcome,
    })
}

/// Exact (Clopper-Pearson) binomial interval on `success / total`.
///
/// Limits whose beta quantile is undefined (no successes, no failures or a
/// degenerate sample) fall back to the trivial 0 and 1.
pub fn binomial_interval(success: f64, total: f64, conf_level: f64) -> (f64, f64) {
    let quantile = (1.0 - conf_level) / 2.0;
    let lower = Beta::new(success, total - success + 1.0)
        .ok()
        .map(|beta| beta.inverse_cdf(quantile))
        .filter(|value| value.is_finite())
        .unwrap_or(0.0);
    let upper = Beta::new(success + 1.0, total - success)
        .ok()
        .map(|beta| beta.inverse_cdf(1.0 - quantile))
        .filter(|value| value.is_finite())
        .unwrap_or(1.0);
    (lower, upper)
}

/// Per-bin reconstruction efficiency: `found` and `chopped` both count as
/// recovered.
pub fn efficiency(histogram: &OutcomeHistogram) -> Vec<BinnedFraction> {
    let centers = histogram.bin_centers();
    let found = histogram.counts(Outcome::Found);
    let chopped = histogram.counts(Outcome::Chopped);
    centers
        .iter()
        .enumerate()
        .map(|(bin, &center)| {
            let passed = found.map_or(0, |counts| counts[bin]) + chopped.map_or(0, |counts| counts[bin]);
            binned_fraction(center, histogram.total[bin] as f64, passed as f64)
        })
        .collect()
}

/// Acceptance along `values`, binned into `n_bins` equal bins over `range`.
///
/// Each bin sums the acceptance fractions of its elements. `n_bins` defaults
/// to one bin per unit of `range`; either way at most [`MAX_BINS`] bins.
pub fn binned_acceptance(
    values: &[f64],
    acceptance: &[AcceptanceRecord],
    range: (f64, f64),
    n_bins: Option<usize>,
) -> Result<Vec<BinnedFraction>, MatchError> {
    let (lo, hi) = range;
    if !(lo.is_finite() && hi.is_finite() && lo < hi && (hi - lo).is_finite()) {
        return Err(MatchError::invalid_config(format!(
            "acceptance range must be finite and increasing, got ({lo}, {hi})"
        )));
    }
    if values.len() != acceptance.len() {
        return Err(MatchError::invalid_config(format!(
            "{} acceptance records but {} values",
            acceptance.len(),
            values.len()
        )));
    }
    let n_bins = match n_bins {
        Some(n_bins) => n_bins,
        None => {
            let unit_bins = (hi - lo).floor().max(1.0);
            if unit_bins > MAX_BINS as f64 {
                return Err(MatchError::invalid_config(format!(
                    "acceptance range ({lo}, {hi}) needs {unit_bins} unit bins, more than {MAX_BINS}; pass n_bins"
                )));
            }
            unit_bins as usize
        }
    };
    if n_bins == 0 || n_bins > MAX_BINS {
        return Err(MatchError::invalid_config(format!(
            "n_bins must be within [1, {MAX_BINS}], got {n_bins}"
        )));
    }

    let width = (hi - lo) / n_bins as f64;
    let edges: Vec<f64> = (0..=n_bins).map(|i| lo + width * i as f64).collect();
    let mut total = vec![0.0; n_bins];
    let mut passed = vec![0.0; n_bins];
    for (&value, record) in values.iter().zip(acceptance.iter()) {
        if let Some(bin) = bin_index(&edges, value) {
            total[bin] += 1.0;
            passed[bin] += record.acceptance_fraction;
        }
    }

    Ok(edges
        .windows(2)
        .enumerate()
        .map(|(bin, pair)| binned_fraction((pair[0] + pair[1]) / 2.0, total[bin], passed[bin]))
        .collect())
}

/// Headline numbers of one matching run.
///
/// `truth`, `output.truth` and `acceptance` must be aligned.
pub fn summarize(
    truth: &[Interval],
    output: &MatchOutput,
    acceptance: &[AcceptanceRecord],
) -> MatchSummary {
    let truth_outcomes = count_outcomes(&output.truth);
    let peak_outcomes = count_outcomes(&output.peaks);
    let found = truth_outcomes.get(&Outcome::Found).copied().unwrap_or(0);
    let found_fraction = if output.truth.is_empty() {
        0.0
    } else {
        found as f64 / output.truth.len() as f64
    };

    let biases: Vec<f64> = output
        .truth
        .iter()
        .zip(acceptance.iter())
        .filter(|(record, _)| record.outcome.implies_match())
        .map(|(_, accepted)| accepted.reconstruction_bias)
        .collect();

    let acceptance_by_type = PeakType::ALL
        .iter()
        .filter_map(|&kind| {
            let fractions: Vec<f64> = truth
                .iter()
                .zip(acceptance.iter())
                .filter(|(interval, _)| interval.kind == kind)
                .map(|(_, accepted)| accepted.acceptance_fraction)
                .collect();
            if fractions.is_empty() {
                return None;
            }
            Some(TypeAcceptance {
                kind,
                count: fractions.len(),
                mean_acceptance: mean(&fractions),
            })
        })
        .collect();

    MatchSummary {
        truth_outcomes,
        peak_outcomes,
        found_fraction,
        bias: bias_distribution(&biases),
        acceptance_by_type,
    }
}

fn count_outcomes(records: &[MatchRecord]) -> BTreeMap<Outcome, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.outcome).or_insert(0) += 1;
    }
    counts
}

fn bias_distribution(values: &[f64]) -> Option<BiasDistribution> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    Some(BiasDistribution {
        count: sorted.len(),
        mean: mean(&sorted),
        p50: percentile_sorted(&sorted, 0.5),
        p90: percentile_sorted(&sorted, 0.9),
    })
}

fn binned_fraction(center: f64, total: f64, passed: f64) -> BinnedFraction {
    let fraction = if total > 0.0 { passed / total } else { 0.0 };
    let (lower, upper) = binomial_interval(passed, total, one_sigma());
    BinnedFraction {
        center,
        total,
        passed,
        fraction,
        lower_error: (fraction - lower).abs(),
        upper_error: (upper - fraction).abs(),
    }
}

fn one_sigma() -> f64 {
    Normal::new(0.0, 1.0)
        .map(|normal| normal.cdf(1.0) - normal.cdf(-1.0))
        .unwrap_or(0.682_689_492_137_086)
}

fn check_edges(bin_edges: &[f64]) -> Result<(), MatchError> {
    if bin_edges.len() < 2 {
        return Err(MatchError::invalid_config("histogram needs at least two bin edges"));
    }
    if bin_edges
        .windows(2)
        .any(|pair| !pair[0].is_finite() || !pair[1].is_finite() || pair[0] >= pair[1])
    {
        return Err(MatchError::invalid_config(
            "histogram bin edges must be finite and strictly increasing",
        ));
    }
    Ok(())
}

fn bin_index(bin_edges: &[f64], value: f64) -> Option<usize> {
    let first = *bin_edges.first()?;
    let last = *bin_edges.last()?;
    if value.is_nan() || value < first || value >= last {
        return None;
    }
    Some(bin_edges.partition_point(|&edge| edge <= value) - 1)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn percentile_sorted(sorted_values: &[f64], percentile: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }
    if sorted_values.len() == 1 {
        return sorted_values[0];
    }

    let clamped = percentile.clamp(0.0, 1.0);
    let max_index = (sorted_values.len() - 1) as f64;
    let rank = clamped * max_index;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted_values[lower]
    } else {
        let weight = rank - lower as f64;
        sorted_values[lower] * (1.0 - weight) + sorted_values[upper] * weight
    }
}
