pub mod config;
pub mod error;
pub mod matching;
pub mod pipeline;
pub mod types;

pub use config::{AcceptanceConfig, DominanceRule, MatchConfig, PemaConfig};
pub use error::MatchError;
pub use matching::acceptance::compute_acceptance;
pub use matching::matcher::match_peaks;
pub use matching::outcome::Outcome;
pub use pipeline::builder::PeakMatcherBuilder;
pub use pipeline::runtime::{ChunkResult, MatchChunk, PeakMatcher};
pub use pipeline::traits::MatchDiagnostics;
pub use types::{AcceptanceRecord, FlatMatchRecord, Interval, MatchOutput, MatchRecord, PeakType};
