use crate::matching::outcome::Outcome;
use crate::types::{AcceptanceRecord, Interval, MatchOutput};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    TruthToPeaks,
    PeaksToTruth,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TruthToPeaks => "truth_to_peaks",
            Self::PeaksToTruth => "peaks_to_truth",
        }
    }
}

/// Candidate counts of one windowing direction, before and after the exact
/// overlap pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowStats {
    pub elements: usize,
    pub coarse_candidates: usize,
    pub deep_candidates: usize,
    /// Elements whose deep window is strictly smaller than the coarse one.
    pub narrowed: usize,
    /// Candidates examined by the exact overlap pass.
    pub scanned: usize,
}

/// One element resolved against several overlapping candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentResolution {
    pub collection: &'static str,
    pub index: usize,
    pub fragments: usize,
    pub same_type: usize,
    pub misidentified: usize,
    pub outcome: Outcome,
}

/// Sink for engine diagnostics. The engine never touches process-wide
/// logging state on its own; whatever it has to say goes through here.
pub trait MatchDiagnostics: Send + Sync {
    fn windows_resolved(&self, _direction: Direction, _stats: &WindowStats) {}

    fn fragments_resolved(&self, _resolution: &FragmentResolution) {}

    fn matching_finished(&self, _output: &MatchOutput) {}

    /// A matched truth interval expected no signal, so its bias is 0.
    fn degenerate_metric(&self, _truth_index: usize, _truth: &Interval) {}

    fn acceptance_finished(&self, _records: &[AcceptanceRecord]) {}
}
