use crate::types::{Language, OverallStatus};
use thiserror::Error;

/// Failures that stop a judging session.
///
/// Problems with the candidate's code (wrong answers, crashes, timeouts,
/// compile errors) are verdicts, not errors. Everything here means the
/// request was rejected or the judge itself is broken.
#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("toolchain unavailable for {0}")]
    ToolchainUnavailable(Language),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid problem: {0}")]
    InvalidProblem(String),

    #[error("test case index {index} out of range ({len} cases)")]
    InvalidSelection { index: usize, len: usize },

    #[error("source too large: {size} bytes (limit {limit})")]
    SourceTooLarge { size: usize, limit: usize },

    #[error("session already {0}")]
    InvalidState(&'static str),

    #[error("judging cancelled after {completed} test case(s)")]
    Cancelled { completed: usize },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl JudgeError {
    /// True when the fault lies with the judge rather than the request
    pub fn is_internal(&self) -> bool {
        matches!(self, JudgeError::Internal(_))
    }

    /// Status reported in a `JudgeResponse` when judging stops with this error
    pub fn status(&self) -> OverallStatus {
        match self {
            JudgeError::UnsupportedLanguage(_) => OverallStatus::UnsupportedLanguage,
            JudgeError::ToolchainUnavailable(_) => OverallStatus::ToolchainUnavailable,
            JudgeError::InvalidRequest(_)
            | JudgeError::InvalidProblem(_)
            | JudgeError::InvalidSelection { .. }
            | JudgeError::SourceTooLarge { .. }
            | JudgeError::InvalidState(_) => OverallStatus::InvalidRequest,
            JudgeError::Cancelled { .. } => OverallStatus::Cancelled,
            JudgeError::Internal(_) => OverallStatus::InternalError,
        }
    }
}
