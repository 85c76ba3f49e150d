use crate::error::MatchError;
use crate::types::Interval;

/// Reject collections the matching engine cannot work on: every interval
/// must satisfy `end >= start` and carry a finite, non-negative amplitude,
/// and starts must be non-decreasing. Intervals may overlap within a
/// collection.
pub fn check_collection(collection: &'static str, intervals: &[Interval]) -> Result<(), MatchError> {
    for (index, interval) in intervals.iter().enumerate() {
        if interval.end < interval.start {
            return Err(MatchError::precondition(
                collection,
                index,
                format!(
                    "end {} is before start {}",
                    interval.end, interval.start
                ),
            ));
        }
        if !interval.amplitude.is_finite() || interval.amplitude < 0.0 {
            return Err(MatchError::precondition(
                collection,
                index,
                format!("amplitude must be finite and >= 0, got {}", interval.amplitude),
            ));
        }
    }
    if let Some(index) = intervals
        .windows(2)
        .position(|pair| pair[1].start < pair[0].start)
    {
        return Err(MatchError::precondition(
            collection,
            index + 1,
            format!(
                "collection is not sorted by start: {} follows {}",
                intervals[index + 1].start,
                intervals[index].start
            ),
        ));
    }
    Ok(())
}
