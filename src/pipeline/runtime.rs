use rayon::prelude::*;

use crate::config::PemaConfig;
use crate::error::MatchError;
use crate::matching::acceptance::compute_acceptance;
use crate::matching::matcher::match_peaks;
use crate::pipeline::traits::MatchDiagnostics;
use crate::types::{AcceptanceRecord, Interval, MatchOutput};

/// One independent matching job: truth and peaks of the same time range.
#[derive(Debug, Clone, Copy)]
pub struct MatchChunk<'a> {
    pub truth: &'a [Interval],
    pub peaks: &'a [Interval],
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChunkResult {
    pub output: MatchOutput,
    pub acceptance: Vec<AcceptanceRecord>,
}

/// Validated configuration plus a diagnostics sink. Holds no per-run state,
/// so one matcher can serve any number of threads.
pub struct PeakMatcher {
    config: PemaConfig,
    diagnostics: Box<dyn MatchDiagnostics>,
}

pub(crate) struct PeakMatcherParts {
    pub config: PemaConfig,
    pub diagnostics: Box<dyn MatchDiagnostics>,
}

impl PeakMatcher {
    pub(crate) fn from_parts(parts: PeakMatcherParts) -> Self {
        Self {
            config: parts.config,
            diagnostics: parts.diagnostics,
        }
    }

    pub fn config(&self) -> &PemaConfig {
        &self.config
    }

    pub fn match_peaks(
        &self,
        truth: &[Interval],
        peaks: &[Interval],
    ) -> Result<MatchOutput, MatchError> {
        match_peaks(truth, peaks, &self.config.matching, self.diagnostics.as_ref())
    }

    pub fn acceptance(
        &self,
        truth: &[Interval],
        output: &MatchOutput,
        peaks: &[Interval],
    ) -> Result<Vec<AcceptanceRecord>, MatchError> {
        compute_acceptance(
            truth,
            &output.truth,
            peaks,
            &self.config.acceptance,
            self.diagnostics.as_ref(),
        )
    }

    pub fn match_with_acceptance(
        &self,
        truth: &[Interval],
        peaks: &[Interval],
    ) -> Result<ChunkResult, MatchError> {
        let output = self.match_peaks(truth, peaks)?;
        let acceptance = self.acceptance(truth, &output, peaks)?;
        Ok(ChunkResult { output, acceptance })
    }

    /// Match many independent chunks in parallel. Results keep the order of
    /// `chunks`; the first failing chunk fails the whole call.
    pub fn match_chunks(&self, chunks: &[MatchChunk<'_>]) -> Result<Vec<ChunkResult>, MatchError> {
        tracing::debug!(chunks = chunks.len(), "matching: dispatching chunks");
        chunks
            .par_iter()
            .map(|chunk| self.match_with_acceptance(chunk.truth, chunk.peaks))
            .collect()
    }
}
