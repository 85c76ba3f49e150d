use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::MatchError;
use crate::matching::outcome::Outcome;
use crate::matching::precondition::check_collection;
use crate::matching::window::TouchingCandidates;
use crate::types::{Interval, PeakType};

const TRUTH_EVENTS: &str = "truth_events";
const EVENTS: &str = "events";

/// Time span covered by one event, either a simulated one (all truth
/// intervals sharing an event number) or a reconstructed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSpan {
    pub number: i64,
    pub start: i64,
    pub end: i64,
}

impl EventSpan {
    fn as_interval(&self) -> Interval {
        Interval::new(self.number, self.start, self.end, PeakType::Unclassified, 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventMatch {
    pub truth_number: i64,
    pub start: i64,
    pub end: i64,
    /// `missed`, `found` or `split` depending on how many events overlap.
    pub outcome: Outcome,
    pub first_match: Option<i64>,
    /// Inclusive.
    pub last_match: Option<i64>,
}

/// Collapse truth intervals into one span per event number.
///
/// `event_numbers[i]` is the event of `truth[i]`. Spans are returned sorted by
/// start and must have positive length and strictly increasing starts.
pub fn truth_event_spans(
    truth: &[Interval],
    event_numbers: &[i64],
) -> Result<Vec<EventSpan>, MatchError> {
    if truth.len() != event_numbers.len() {
        return Err(MatchError::precondition(
            TRUTH_EVENTS,
            truth.len().min(event_numbers.len()),
            format!(
                "{} truth intervals but {} event numbers",
                truth.len(),
                event_numbers.len()
            ),
        ));
    }

    let mut bounds: BTreeMap<i64, (i64, i64)> = BTreeMap::new();
    for (interval, &number) in truth.iter().zip(event_numbers.iter()) {
        bounds
            .entry(number)
            .and_modify(|(start, end)| {
                *start = (*start).min(interval.start);
                *end = (*end).max(interval.end);
            })
            .or_insert((interval.start, interval.end));
    }

    let mut spans: Vec<EventSpan> = bounds
        .into_iter()
        .map(|(number, (start, end))| EventSpan { number, start, end })
        .collect();
    spans.sort_by_key(|span| (span.start, span.number));

    for (index, span) in spans.iter().enumerate() {
        if span.end <= span.start {
            return Err(MatchError::precondition(
                TRUTH_EVENTS,
                index,
                format!("event {} has no duration", span.number),
            ));
        }
        if index > 0 && spans[index - 1].start >= span.start {
            return Err(MatchError::precondition(
                TRUTH_EVENTS,
                index,
                format!(
                    "events {} and {} start at the same time",
                    spans[index - 1].number,
                    span.number
                ),
            ));
        }
    }
    Ok(spans)
}

/// Match simulated events against reconstructed ones by time overlap.
pub fn match_events(
    truth_events: &[EventSpan],
    events: &[EventSpan],
    fuzz: i64,
) -> Result<Vec<EventMatch>, MatchError> {
    if fuzz < 0 {
        return Err(MatchError::precondition(
            "config",
            0,
            format!("fuzz_ns must be >= 0, got {fuzz}"),
        ));
    }
    let truth: Vec<Interval> = truth_events.iter().map(EventSpan::as_interval).collect();
    let reconstructed: Vec<Interval> = events.iter().map(EventSpan::as_interval).collect();
    check_collection(TRUTH_EVENTS, &truth)?;
    check_collection(EVENTS, &reconstructed)?;

    let touching = TouchingCandidates::sweep(&truth, &reconstructed, fuzz);

    let matches = truth_events
        .iter()
        .enumerate()
        .map(|(index, span)| {
            let hits = touching.hits(index);
            let outcome = match hits.len() {
                0 => Outcome::Missed,
                1 => Outcome::Found,
                _ => Outcome::Split,
            };
            EventMatch {
                truth_number: span.number,
                start: span.start,
                end: span.end,
                outcome,
                first_match: hits.first().map(|&j| events[j].number),
                last_match: hits.last().map(|&j| events[j].number),
            }
        })
        .collect();
    Ok(matches)
}
