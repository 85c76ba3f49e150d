use serde::{Deserialize, Serialize};

use crate::matching::outcome::Outcome;

/// Classification of a signal interval.
///
/// Serialized as the integer code used by the reconstruction chain:
/// `0` unclassified, `1` S1-like, `2` S2-like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum PeakType {
    Unclassified,
    Type1,
    Type2,
}

impl PeakType {
    pub const ALL: [PeakType; 3] = [PeakType::Unclassified, PeakType::Type1, PeakType::Type2];

    pub fn code(self) -> i16 {
        match self {
            Self::Unclassified => 0,
            Self::Type1 => 1,
            Self::Type2 => 2,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Unclassified),
            1 => Some(Self::Type1),
            2 => Some(Self::Type2),
            _ => None,
        }
    }

    pub fn is_classified(self) -> bool {
        self != Self::Unclassified
    }
}

impl TryFrom<i16> for PeakType {
    type Error = String;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("unknown peak type code {code}"))
    }
}

impl From<PeakType> for i16 {
    fn from(kind: PeakType) -> Self {
        kind.code()
    }
}

/// One truth interaction or reconstructed peak.
///
/// Time interval is [start, end), i.e. start inclusive/end exclusive, in ns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub id: i64,
    pub start: i64,
    pub end: i64,
    #[serde(rename = "type")]
    pub kind: PeakType,
    /// Signal size: expected quanta for truth, reconstructed area for peaks.
    #[serde(alias = "area", alias = "quanta", alias = "n_photon")]
    pub amplitude: f64,
}

impl Interval {
    pub fn new(id: i64, start: i64, end: i64, kind: PeakType, amplitude: f64) -> Self {
        Self {
            id,
            start,
            end,
            kind,
            amplitude,
        }
    }

    /// Saturates at `i64::MAX` for spans wider than an `i64` can hold.
    pub fn duration(&self) -> i64 {
        self.end.saturating_sub(self.start)
    }
}

/// Per-element result of matching one collection against the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: i64,
    pub start: i64,
    pub end: i64,
    pub outcome: Outcome,
    /// Id of the single best counterpart, `None` when nothing was matched.
    pub matched_to: Option<i64>,
}

impl MatchRecord {
    pub(crate) fn unmatched(interval: &Interval) -> Self {
        Self {
            id: interval.id,
            start: interval.start,
            end: interval.end,
            outcome: Outcome::Missed,
            matched_to: None,
        }
    }

    pub fn flatten(&self, no_match_sentinel: i64) -> FlatMatchRecord {
        FlatMatchRecord {
            id: self.id,
            time: self.start,
            endtime: self.end,
            outcome: self.outcome,
            matched_to: self.matched_to.unwrap_or(no_match_sentinel),
        }
    }
}

/// Columnar export form of [`MatchRecord`] with an integer sentinel in
/// place of a missing counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlatMatchRecord {
    pub id: i64,
    pub time: i64,
    pub endtime: i64,
    pub outcome: Outcome,
    pub matched_to: i64,
}

/// Both sides of one matching run, aligned with the inputs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MatchOutput {
    pub truth: Vec<MatchRecord>,
    pub peaks: Vec<MatchRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AcceptanceRecord {
    pub id: i64,
    pub start: i64,
    pub end: i64,
    pub is_found: bool,
    /// Recovered over expected signal; 0 when unmatched or nothing was expected.
    pub reconstruction_bias: f64,
    /// Policy-weighted acceptance, may be negative for penalized outcomes.
    pub acceptance_fraction: f64,
}
