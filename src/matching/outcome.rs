use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MatchError;
use crate::types::PeakType;

/// Closed set of matching outcomes.
///
/// Every element of either collection ends a matching run with exactly one of
/// these. The serialized labels are the snake_case variant names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Matched 1:1 with the same type and sufficient overlap quality.
    Found,
    /// Same type, but only part of the signal is recovered.
    Chopped,
    /// No counterpart in the other collection.
    Missed,
    /// One of several elements absorbed by a single counterpart of the same type.
    Merged,
    /// Counterpart is represented by several same-type fragments.
    Split,
    MisidAsType1,
    MisidAsType2,
    /// Split, and at least one fragment has a different (known) type.
    SplitAndMisid,
    MergedToType1,
    MergedToType2,
    /// Merged into a counterpart that is itself unclassified.
    MergedToUnknown,
    Unclassified,
    /// Split, and every fragment is unclassified.
    SplitAndUnclassified,
    /// Unclassified fragment merged into a classified counterpart.
    MergedAndUnclassified,
}

impl Outcome {
    /// Reporting order, most desirable first.
    pub const ALL: [Outcome; 14] = [
        Outcome::Found,
        Outcome::Chopped,
        Outcome::Missed,
        Outcome::Merged,
        Outcome::Split,
        Outcome::MisidAsType2,
        Outcome::MisidAsType1,
        Outcome::SplitAndMisid,
        Outcome::MergedToType2,
        Outcome::MergedToType1,
        Outcome::MergedToUnknown,
        Outcome::Unclassified,
        Outcome::SplitAndUnclassified,
        Outcome::MergedAndUnclassified,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Found => "found",
            Self::Chopped => "chopped",
            Self::Missed => "missed",
            Self::Merged => "merged",
            Self::Split => "split",
            Self::MisidAsType1 => "misid_as_type1",
            Self::MisidAsType2 => "misid_as_type2",
            Self::SplitAndMisid => "split_and_misid",
            Self::MergedToType1 => "merged_to_type1",
            Self::MergedToType2 => "merged_to_type2",
            Self::MergedToUnknown => "merged_to_unknown",
            Self::Unclassified => "unclassified",
            Self::SplitAndUnclassified => "split_and_unclassified",
            Self::MergedAndUnclassified => "merged_and_unclassified",
        }
    }

    /// Plot color associated with the outcome (matplotlib named colors).
    pub fn color(self) -> &'static str {
        match self {
            Self::Found => "darkblue",
            Self::Chopped => "mediumslateblue",
            Self::Missed => "red",
            Self::Merged => "turquoise",
            Self::Split => "purple",
            Self::MisidAsType2 => "orange",
            Self::MisidAsType1 => "goldenrod",
            Self::SplitAndMisid => "darkorange",
            Self::MergedToType2 => "chocolate",
            Self::MergedToType1 => "sandybrown",
            Self::MergedToUnknown => "khaki",
            Self::Unclassified => "green",
            Self::SplitAndUnclassified => "seagreen",
            Self::MergedAndUnclassified => "limegreen",
        }
    }

    /// Position in [`Outcome::ALL`]; lower sorts first in reports.
    pub fn priority(self) -> usize {
        match self {
            Self::Found => 0,
            Self::Chopped => 1,
            Self::Missed => 2,
            Self::Merged => 3,
            Self::Split => 4,
            Self::MisidAsType2 => 5,
            Self::MisidAsType1 => 6,
            Self::SplitAndMisid => 7,
            Self::MergedToType2 => 8,
            Self::MergedToType1 => 9,
            Self::MergedToUnknown => 10,
            Self::Unclassified => 11,
            Self::SplitAndUnclassified => 12,
            Self::MergedAndUnclassified => 13,
        }
    }

    /// Whether an element with this outcome carries a counterpart id.
    pub fn implies_match(self) -> bool {
        self != Self::Missed
    }

    /// Outcome of a 1:1 match whose counterpart has type `other`.
    pub(crate) fn misid_as(other: PeakType) -> Self {
        match other {
            PeakType::Type1 => Self::MisidAsType1,
            PeakType::Type2 => Self::MisidAsType2,
            PeakType::Unclassified => Self::Unclassified,
        }
    }

    /// Outcome of a fragment of another type merged into a `parent` peak.
    pub(crate) fn merged_to(parent: PeakType) -> Self {
        match parent {
            PeakType::Type1 => Self::MergedToType1,
            PeakType::Type2 => Self::MergedToType2,
            PeakType::Unclassified => Self::MergedToUnknown,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = MatchError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|outcome| outcome.as_str() == label)
            .ok_or_else(|| MatchError::UnknownOutcome {
                label: label.to_string(),
            })
    }
}
