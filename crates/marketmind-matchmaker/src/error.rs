use serde::Serialize;
use thiserror::Error;

/// One discrete model-invocation step of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Filter,
    Match,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Filter => write!(f, "filter"),
            Stage::Match => write!(f, "match"),
        }
    }
}

/// Coarse classification of a pipeline failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    TransportFailure,
    ParseFailure,
    IntegrityViolation,
    Internal,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::TransportFailure => write!(f, "transport_failure"),
            FailureKind::ParseFailure => write!(f, "parse_failure"),
            FailureKind::IntegrityViolation => write!(f, "integrity_violation"),
            FailureKind::Internal => write!(f, "internal"),
        }
    }
}

/// Errors raised by a [`crate::ModelClient`] before any text reaches a stage.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The model API answered with a non-success HTTP status.
    #[error("model API returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The prompt or every candidate was blocked by the provider's safety filter.
    #[error("model blocked the request: {0}")]
    Blocked(String),

    /// The response envelope carried no usable text.
    #[error("model returned no text: {0}")]
    EmptyResponse(String),

    /// The response envelope itself was not the expected JSON shape.
    #[error("model response envelope could not be decoded: {0}")]
    Envelope(String),

    /// The call did not complete within its deadline.
    #[error("model call timed out after {millis} ms")]
    Timeout { millis: u64 },

    /// The client could not be constructed from the supplied settings.
    #[error("model client configuration error: {0}")]
    Config(String),
}

impl ModelError {
    /// Returns `true` for failures worth retrying after a back-off delay:
    /// timeouts, connection failures, HTTP 429 and 5xx.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            ModelError::Http(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
            }
            ModelError::Status { status, .. } => *status == 429 || *status >= 500,
            ModelError::Timeout { .. } => true,
            ModelError::Blocked(_)
            | ModelError::EmptyResponse(_)
            | ModelError::Envelope(_)
            | ModelError::Config(_) => false,
        }
    }
}

/// Errors returned by the filter stage, the match stage, and the pipeline.
#[derive(Debug, Error)]
pub enum MatchmakerError {
    /// The model adapter could not complete the call.
    #[error("{stage} stage: transport failure: {source}")]
    Transport {
        stage: Stage,
        #[source]
        source: ModelError,
    },

    /// The model answered, but not with a bare JSON array of the expected records.
    /// `raw` holds the complete response text.
    #[error("{stage} stage: model output is not a valid record array: {reason}")]
    Parse {
        stage: Stage,
        reason: String,
        raw: String,
    },

    /// The model output referenced data that was not in the stage inputs.
    #[error("{stage} stage: integrity violation: {detail}")]
    Integrity { stage: Stage, detail: String },

    /// Stage inputs could not be serialized into the prompt.
    #[error("failed to encode {what} for the prompt: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("illegal pipeline transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

impl MatchmakerError {
    /// The stage that failed, when the failure belongs to one.
    #[must_use]
    pub fn stage(&self) -> Option<Stage> {
        match self {
            MatchmakerError::Transport { stage, .. }
            | MatchmakerError::Parse { stage, .. }
            | MatchmakerError::Integrity { stage, .. } => Some(*stage),
            MatchmakerError::Encode { .. } | MatchmakerError::InvalidTransition { .. } => None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            MatchmakerError::Transport { .. } => FailureKind::TransportFailure,
            MatchmakerError::Parse { .. } => FailureKind::ParseFailure,
            MatchmakerError::Integrity { .. } => FailureKind::IntegrityViolation,
            MatchmakerError::Encode { .. } | MatchmakerError::InvalidTransition { .. } => {
                FailureKind::Internal
            }
        }
    }

    /// The offending model text for parse failures.
    #[must_use]
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            MatchmakerError::Parse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}
