use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The closed error-kind taxonomy. Every component-level error maps onto
/// exactly one of these; nothing outside this set is surfaced to a run's
/// terminal event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidInput,
    ParseError,
    ValidationError,
    RevisionExhausted,
    PatchError,
    GitError,
    LlmError,
    CacheError,
    ApprovalTimeout,
    RunTimeout,
    StepTimeout,
    Cancelled,
    Internal,
}

impl ErrorKind {
    /// Whether this kind always terminates the run it occurs in, per the
    /// propagation policy.
    pub fn is_always_terminal(self) -> bool {
        matches!(
            self,
            ErrorKind::ApprovalTimeout
                | ErrorKind::RunTimeout
                | ErrorKind::StepTimeout
                | ErrorKind::Cancelled
                | ErrorKind::Internal
                | ErrorKind::RevisionExhausted
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::ParseError => "parse_error",
            ErrorKind::ValidationError => "validation_error",
            ErrorKind::RevisionExhausted => "revision_exhausted",
            ErrorKind::PatchError => "patch_error",
            ErrorKind::GitError => "git_error",
            ErrorKind::LlmError => "llm_error",
            ErrorKind::CacheError => "cache_error",
            ErrorKind::ApprovalTimeout => "approval_timeout",
            ErrorKind::RunTimeout => "run_timeout",
            ErrorKind::StepTimeout => "step_timeout",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// The error type every `orc-*` component returns. Carries a kind from the
/// closed taxonomy, a human-readable message, and an optional structured
/// detail bag (surfaced on terminal events, never a stack trace).
#[derive(Debug, Error, Clone)]
#[error("{kind}: {message}")]
pub struct OrcError {
    pub kind: ErrorKind,
    pub message: String,
    pub detail: Option<String>,
}

impl OrcError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}
