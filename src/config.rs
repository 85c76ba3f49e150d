use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::MatchError;
use crate::matching::outcome::Outcome;

/// How the single counterpart is chosen among several overlapping candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DominanceRule {
    /// Candidate amplitude weighted by the fraction of it inside the element.
    #[default]
    AttributedAmplitude,
    /// Overlap duration with the (fuzz-extended) element.
    Overlap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Symmetric time tolerance in ns added to interval bounds before overlap tests.
    pub fuzz_ns: i64,
    /// Minimum overlap quality for a same-type 1:1 match to count as `found`
    /// (inclusive); below it the match is `chopped`.
    pub found_quality_threshold: f64,
    pub dominance: DominanceRule,
}

impl MatchConfig {
    pub const DEFAULT_FUZZ_NS: i64 = 0;
    pub const DEFAULT_FOUND_QUALITY_THRESHOLD: f64 = 0.5;

    pub fn validate(&self) -> Result<(), MatchError> {
        if self.fuzz_ns < 0 {
            return Err(MatchError::precondition(
                "config",
                0,
                format!("fuzz_ns must be >= 0, got {}", self.fuzz_ns),
            ));
        }
        if !self.found_quality_threshold.is_finite()
            || !(0.0..=1.0).contains(&self.found_quality_threshold)
        {
            return Err(MatchError::invalid_config(format!(
                "found_quality_threshold must be within [0, 1], got {}",
                self.found_quality_threshold
            )));
        }
        Ok(())
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            fuzz_ns: Self::DEFAULT_FUZZ_NS,
            found_quality_threshold: Self::DEFAULT_FOUND_QUALITY_THRESHOLD,
            dominance: DominanceRule::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcceptanceConfig {
    /// Type-2 truth is accepted when its reconstruction bias is strictly above this.
    pub min_bias_threshold: f64,
    /// Acceptance assigned to type-2 truth below the bias threshold, per outcome.
    pub outcome_penalties: BTreeMap<Outcome, f64>,
    /// Acceptance for outcomes absent from `outcome_penalties`.
    pub default_penalty: f64,
    /// Uniform divisor applied to every reconstruction bias.
    pub double_emission_correction: f64,
    /// Only compute a bias against a counterpart of the same type.
    pub require_type_agreement: bool,
}

impl AcceptanceConfig {
    pub const DEFAULT_MIN_BIAS_THRESHOLD: f64 = 0.85;

    pub fn penalty_for(&self, outcome: Outcome) -> f64 {
        self.outcome_penalties
            .get(&outcome)
            .copied()
            .unwrap_or(self.default_penalty)
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if !self.min_bias_threshold.is_finite() {
            return Err(MatchError::invalid_config(format!(
                "min_bias_threshold must be finite, got {}",
                self.min_bias_threshold
            )));
        }
        if !self.double_emission_correction.is_finite() || self.double_emission_correction <= 0.0
        {
            return Err(MatchError::invalid_config(format!(
                "double_emission_correction must be a positive number, got {}",
                self.double_emission_correction
            )));
        }
        if !self.default_penalty.is_finite() {
            return Err(MatchError::invalid_config("default_penalty must be finite"));
        }
        if let Some((outcome, penalty)) = self
            .outcome_penalties
            .iter()
            .find(|(_, penalty)| !penalty.is_finite())
        {
            return Err(MatchError::invalid_config(format!(
                "penalty for '{outcome}' must be finite, got {penalty}"
            )));
        }
        Ok(())
    }
}

impl Default for AcceptanceConfig {
    fn default() -> Self {
        Self {
            min_bias_threshold: Self::DEFAULT_MIN_BIAS_THRESHOLD,
            outcome_penalties: BTreeMap::from([
                (Outcome::MisidAsType1, -1.0),
                (Outcome::SplitAndMisid, -1.0),
            ]),
            default_penalty: 0.0,
            double_emission_correction: 1.0,
            require_type_agreement: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PemaConfig {
    pub matching: MatchConfig,
    pub acceptance: AcceptanceConfig,
    /// Integer written in place of a missing counterpart in flat exports.
    pub no_match_sentinel: i64,
}

impl PemaConfig {
    pub const DEFAULT_NO_MATCH_SENTINEL: i64 = -99_999;

    pub fn load(path: &Path) -> Result<Self, MatchError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| MatchError::io("read matching config", e))?;
        let config: Self = serde_json::from_str(&data)
            .map_err(|e| MatchError::json("parse matching config", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        self.matching.validate()?;
        self.acceptance.validate()
    }
}

impl Default for PemaConfig {
    fn default() -> Self {
        Self {
            matching: MatchConfig::default(),
            acceptance: AcceptanceConfig::default(),
            no_match_sentinel: Self::DEFAULT_NO_MATCH_SENTINEL,
        }
    }
}
