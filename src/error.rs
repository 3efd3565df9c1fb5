use thiserror::Error;

use crate::round::RoundKind;

/// Failures reported by terminal, fullscreen, focus, or media capabilities
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("{capability} is not supported: {reason}")]
    Unsupported {
        capability: &'static str,
        reason: String,
    },
    #[error("permission for {capability} was denied")]
    PermissionDenied { capability: &'static str },
    #[error("terminal i/o failed: {0}")]
    Io(String),
}

impl From<std::io::Error> for PlatformError {
    fn from(e: std::io::Error) -> Self {
        PlatformError::Io(e.to_string())
    }
}

/// Failures from the hiring-process collaborator
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("hiring process {0} not found")]
    NotFound(String),
    #[error("assessment template {0} not found")]
    UnknownAssessment(String),
    #[error("hiring process {id} is inconsistent: {reason}")]
    Invalid { id: String, reason: String },
    #[error("storage failure: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("serialization failure: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("export failed: {0}")]
    Export(#[from] csv::Error),
    #[error("{0}")]
    Unavailable(String),
}

/// Rejections of a round submission
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("round is incomplete: {filled} of {required} inputs provided")]
    Incomplete { filled: usize, required: usize },
    #[error("round already submitted")]
    AlreadySubmitted,
}

/// Rejections and failures of assessment-level transitions
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no round result is awaiting advance")]
    NotAwaitingAdvance,
    #[error("no round is active")]
    NoActiveRound,
    #[error("candidate did not qualify for the {0} round")]
    Disqualified(RoundKind),
    #[error("assessment has already ended")]
    Ended,
    #[error("round content unavailable: {0}")]
    Content(#[from] ContentError),
    #[error("could not persist progress: {0}")]
    Persist(#[from] CollaboratorError),
    #[error(transparent)]
    Submit(#[from] SubmitError),
}

/// Failures inside the interview round
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InterviewError {
    #[error("cannot {action} while {phase}")]
    InvalidTransition {
        phase: &'static str,
        action: &'static str,
    },
    #[error("interviewer unavailable: {0}")]
    Interviewer(String),
    #[error("speech recognition failed: {0}")]
    Recognition(String),
    #[error("nothing has been said yet")]
    EmptyAnswer,
}

#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("no browser available to open {0}")]
    NoBrowser(String),
    #[error("failed to open {target}: {source}")]
    Open {
        target: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("bundled content file {0} is missing")]
    Missing(String),
    #[error("bundled content file {file} is malformed: {source}")]
    Malformed {
        file: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("no content available for the {0} round")]
    Empty(RoundKind),
}
