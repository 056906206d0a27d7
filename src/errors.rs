//! Error types for the workflow core.

use crate::phases::Phase;
use std::fmt::{Display, Formatter};

/// Errors surfaced by the state machine and the orchestration facade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// Malformed or out-of-range input, detected before any state access.
    InvalidArgument { message: String },
    /// A workflow is already running.
    AlreadyActive { issue_id: String },
    /// The operation needs a workflow but none has been started.
    NoActiveWorkflow,
    /// A completion targeted a phase other than the current one.
    PhaseMismatch { attempted: Phase, current: Phase },
    /// Catalog or table lookup miss. Only reachable through string lookups.
    UnknownPhase { phase: String },
}

impl WorkflowError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Stable category name, used in audit log entries and tool responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "InvalidArgument",
            Self::AlreadyActive { .. } => "AlreadyActive",
            Self::NoActiveWorkflow => "NoActiveWorkflow",
            Self::PhaseMismatch { .. } => "PhaseMismatch",
            Self::UnknownPhase { .. } => "UnknownPhase",
        }
    }
}

impl Display for WorkflowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument { message } => write!(f, "invalid argument: {}", message),
            Self::AlreadyActive { issue_id } => write!(
                f,
                "a workflow is already active for issue {}; reset it before starting another",
                issue_id
            ),
            Self::NoActiveWorkflow => {
                write!(f, "no active workflow; call start_workflow first")
            }
            Self::PhaseMismatch { attempted, current } => write!(
                f,
                "phase mismatch: attempted to complete '{}' but the current phase is '{}'",
                attempted, current
            ),
            Self::UnknownPhase { phase } => write!(f, "unknown phase: '{}'", phase),
        }
    }
}

impl std::error::Error for WorkflowError {}
