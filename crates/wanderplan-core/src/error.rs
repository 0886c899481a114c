//! Error taxonomy for the generation pipeline.
//!
//! Every failure a generation attempt can hit is a [`GenerationError`]
//! variant, and every variant maps onto the closed [`ErrorKind`] enum that
//! the retry loop and the batch scheduler branch on. Upstream failures are
//! classified exactly once, in [`classify_model_error`], where the model
//! collaborator's [`ModelError`] enters the pipeline.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::validate::StructureIssue;

// ---------------------------------------------------------------------------
// Upstream errors
// ---------------------------------------------------------------------------

/// Failure reported by a [`crate::ModelClient`].
///
/// `status` carries an HTTP-like status code when the backend exposes one
/// (429, 503, ...). `message` is the backend's own description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelError {
    pub status: Option<u16>,
    pub message: String,
}

impl ModelError {
    /// An error with no status code.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    /// An error carrying an HTTP-like status code.
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "[{status}] {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ModelError {}

// ---------------------------------------------------------------------------
// Pipeline errors
// ---------------------------------------------------------------------------

/// Errors produced while generating trips.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("model returned an empty response")]
    EmptyResponse,

    /// No repair pass produced valid JSON. `raw` is the untouched model text.
    #[error("could not decode model output as JSON: {message}")]
    Parse { message: String, raw: String },

    #[error("model output has the wrong shape: {0}")]
    InvalidStructure(StructureIssue),

    #[error("slot timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("upstream overloaded: {0}")]
    UpstreamOverload(ModelError),

    #[error("upstream request failed: {0}")]
    Transport(ModelError),

    #[error("all {count} trip generation slots failed")]
    BatchExhaustion { count: usize },
}

impl GenerationError {
    /// Closed classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyResponse => ErrorKind::EmptyResponse,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::InvalidStructure(_) => ErrorKind::InvalidStructure,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::UpstreamOverload(_) => ErrorKind::UpstreamOverload,
            Self::Transport(_) => ErrorKind::Transport,
            Self::BatchExhaustion { .. } => ErrorKind::BatchExhaustion,
        }
    }

    /// The raw model text attached to a parse failure, if any.
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            Self::Parse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

/// Closed set of failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    EmptyResponse,
    Parse,
    InvalidStructure,
    Timeout,
    UpstreamOverload,
    Transport,
    BatchExhaustion,
}

impl ErrorKind {
    /// Whether a fresh attempt may succeed where this one failed.
    ///
    /// Malformed or empty model output is retryable because a new sample
    /// can differ. A slot timeout is not: the slot's time budget is spent.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::EmptyResponse | Self::Parse | Self::InvalidStructure | Self::UpstreamOverload
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::EmptyResponse => "empty_response",
            Self::Parse => "parse",
            Self::InvalidStructure => "invalid_structure",
            Self::Timeout => "timeout",
            Self::UpstreamOverload => "upstream_overload",
            Self::Transport => "transport",
            Self::BatchExhaustion => "batch_exhaustion",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Status codes that signal a rate limit or an overloaded backend.
const OVERLOAD_STATUSES: [u16; 2] = [429, 503];

/// Message fragments that signal a transient upstream condition.
const OVERLOAD_MARKERS: [&str; 6] = [
    "overloaded",
    "timeout",
    "timed out",
    "rate limit",
    "429",
    "503",
];

/// Map a model collaborator failure onto the pipeline taxonomy.
///
/// Rate-limit and overload signals become [`GenerationError::UpstreamOverload`]
/// (retryable); everything else is a non-retryable
/// [`GenerationError::Transport`].
pub fn classify_model_error(err: ModelError) -> GenerationError {
    if err
        .status
        .is_some_and(|status| OVERLOAD_STATUSES.contains(&status))
    {
        return GenerationError::UpstreamOverload(err);
    }

    let lower = err.message.to_ascii_lowercase();
    if OVERLOAD_MARKERS.iter().any(|marker| lower.contains(marker)) {
        GenerationError::UpstreamOverload(err)
    } else {
        GenerationError::Transport(err)
    }
}
