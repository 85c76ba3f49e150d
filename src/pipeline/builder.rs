use std::path::Path;

use crate::config::PemaConfig;
use crate::error::MatchError;
use crate::pipeline::defaults::TracingDiagnostics;
use crate::pipeline::runtime::{PeakMatcher, PeakMatcherParts};
use crate::pipeline::traits::MatchDiagnostics;

pub struct PeakMatcherBuilder {
    config: PemaConfig,
    diagnostics: Option<Box<dyn MatchDiagnostics>>,
}

impl PeakMatcherBuilder {
    pub fn new(config: PemaConfig) -> Self {
        Self {
            config,
            diagnostics: None,
        }
    }

    /// Start from a JSON config file.
    pub fn from_config_file(path: &Path) -> Result<Self, MatchError> {
        Ok(Self::new(PemaConfig::load(path)?))
    }

    pub fn with_diagnostics(mut self, diagnostics: Box<dyn MatchDiagnostics>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    pub fn with_fuzz_ns(mut self, fuzz_ns: i64) -> Self {
        self.config.matching.fuzz_ns = fuzz_ns;
        self
    }

    pub fn build(self) -> Result<PeakMatcher, MatchError> {
        self.config.validate()?;
        Ok(PeakMatcher::from_parts(PeakMatcherParts {
            config: self.config,
            diagnostics: self
                .diagnostics
                .unwrap_or_else(|| Box::new(TracingDiagnostics)),
        }))
    }
}
