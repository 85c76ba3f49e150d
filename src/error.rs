use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON parse error while {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// The caller's data violates an engine precondition (unsorted input,
    /// `end < start`, negative fuzz). Never recoverable inside the engine.
    #[error("precondition violated in {collection}[{index}]: {message}")]
    Precondition {
        collection: &'static str,
        index: usize,
        message: String,
    },
    /// Two candidates for the same element could not be told apart after
    /// every tie-break rule was applied.
    #[error(
        "ambiguous match for {collection}[{element}]: candidates {first} and {second} are indistinguishable"
    )]
    AmbiguousMatch {
        collection: &'static str,
        element: usize,
        first: usize,
        second: usize,
    },
    #[error("truth[{index}] is matched to id {matched_to}, which resolves to {count} counterparts")]
    InvalidMatchResult {
        index: usize,
        matched_to: i64,
        count: usize,
    },
    #[error("unknown matching outcome label '{label}'")]
    UnknownOutcome { label: String },
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl MatchError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    pub(crate) fn precondition(
        collection: &'static str,
        index: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::Precondition {
            collection,
            index,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
