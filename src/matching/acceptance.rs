use std::collections::HashMap;

use crate::config::AcceptanceConfig;
use crate::error::MatchError;
use crate::matching::matcher::TRUTH;
use crate::matching::outcome::Outcome;
use crate::pipeline::traits::MatchDiagnostics;
use crate::types::{AcceptanceRecord, Interval, MatchRecord, PeakType};

/// Derive reconstruction bias and acceptance for every truth interval.
///
/// `truth_records` must be the truth side of a matching run over `truth` and
/// `peaks`. The output is aligned with `truth`.
pub fn compute_acceptance(
    truth: &[Interval],
    truth_records: &[MatchRecord],
    peaks: &[Interval],
    config: &AcceptanceConfig,
    diagnostics: &dyn MatchDiagnostics,
) -> Result<Vec<AcceptanceRecord>, MatchError> {
    config.validate()?;
    if truth.len() != truth_records.len() {
        return Err(MatchError::precondition(
            TRUTH,
            truth.len().min(truth_records.len()),
            format!(
                "{} truth intervals but {} match records",
                truth.len(),
                truth_records.len()
            ),
        ));
    }

    let mut peaks_by_id: HashMap<i64, (usize, usize)> = HashMap::with_capacity(peaks.len());
    for (index, peak) in peaks.iter().enumerate() {
        peaks_by_id
            .entry(peak.id)
            .and_modify(|(_, count)| *count += 1)
            .or_insert((index, 1));
    }

    let mut records = Vec::with_capacity(truth.len());
    for (index, (interval, record)) in truth.iter().zip(truth_records.iter()).enumerate() {
        let counterpart = match record.matched_to {
            Some(id) => match peaks_by_id.get(&id) {
                Some(&(peak_index, 1)) => Some(&peaks[peak_index]),
                Some(&(_, count)) => {
                    return Err(MatchError::InvalidMatchResult {
                        index,
                        matched_to: id,
                        count,
                    })
                }
                None => {
                    return Err(MatchError::InvalidMatchResult {
                        index,
                        matched_to: id,
                        count: 0,
                    })
                }
            },
            None => None,
        };

        let reconstruction_bias = match counterpart {
            None => 0.0,
            Some(peak) if config.require_type_agreement && peak.kind != interval.kind => 0.0,
            Some(_) if interval.amplitude <= 0.0 => {
                diagnostics.degenerate_metric(index, interval);
                0.0
            }
            Some(peak) => peak.amplitude / interval.amplitude / config.double_emission_correction,
        };

        let is_found = record.outcome == Outcome::Found;
        let acceptance_fraction = match interval.kind {
            PeakType::Type1 => {
                if is_found {
                    1.0
                } else {
                    0.0
                }
            }
            PeakType::Type2 => {
                if reconstruction_bias > config.min_bias_threshold {
                    1.0
                } else {
                    config.penalty_for(record.outcome)
                }
            }
            PeakType::Unclassified => 0.0,
        };

        records.push(AcceptanceRecord {
            id: interval.id,
            start: interval.start,
            end: interval.end,
            is_found,
            reconstruction_bias,
            acceptance_fraction,
        });
    }

    diagnostics.acceptance_finished(&records);
    Ok(records)
}
