//! The six workflow phases, their static guidance, and the transition table.
//!
//! Both tables are `match` expressions over the closed [`Phase`] enum, so a
//! lookup for one of the six phases cannot miss. String input is parsed into
//! a `Phase` first; that parse is the only place `UnknownPhase` can arise.

mod catalog;
mod transitions;

pub use catalog::PhaseInstruction;
pub use transitions::{
    allowed_next_phases, default_next_phase, is_terminal, is_valid_transition,
    is_valid_transition_str,
};

use crate::errors::WorkflowError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// One named stage of the workflow lifecycle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    IssueStart,
    Implementation,
    QualityCheck,
    PrCreation,
    Fix,
    Completion,
}

impl Phase {
    /// All phases in default progression order.
    pub const ALL: [Phase; 6] = [
        Phase::IssueStart,
        Phase::Implementation,
        Phase::QualityCheck,
        Phase::PrCreation,
        Phase::Fix,
        Phase::Completion,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Wire name, as used in tool arguments and log entries.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::IssueStart => "issue_start",
            Phase::Implementation => "implementation",
            Phase::QualityCheck => "quality_check",
            Phase::PrCreation => "pr_creation",
            Phase::Fix => "fix",
            Phase::Completion => "completion",
        }
    }

    /// Title for guidance documents.
    pub fn label(&self) -> &'static str {
        match self {
            Phase::IssueStart => "Issue Start",
            Phase::Implementation => "Implementation",
            Phase::QualityCheck => "Quality Check",
            Phase::PrCreation => "Pull Request Creation",
            Phase::Fix => "Fix",
            Phase::Completion => "Completion",
        }
    }

    pub fn instruction(&self) -> &'static PhaseInstruction {
        PhaseInstruction::for_phase(*self)
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::ALL
            .iter()
            .copied()
            .find(|phase| phase.as_str() == s)
            .ok_or_else(|| WorkflowError::UnknownPhase {
                phase: s.to_string(),
            })
    }
}

/// Outcome reported by the caller when completing a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseStatus {
    Completed,
    Failed,
    Skipped,
}

impl PhaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseStatus::Completed => "completed",
            PhaseStatus::Failed => "failed",
            PhaseStatus::Skipped => "skipped",
        }
    }
}

impl Display for PhaseStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
