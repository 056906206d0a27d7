use super::Phase;
use crate::errors::WorkflowError;
use serde::Serialize;

/// Static guidance for a single phase.
#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseInstruction {
    pub preconditions: &'static [&'static str],
    pub acceptance_criteria: &'static [&'static str],
    pub tasks: &'static [&'static str],
}

impl PhaseInstruction {
    pub fn for_phase(phase: Phase) -> &'static PhaseInstruction {
        match phase {
            Phase::IssueStart => &ISSUE_START,
            Phase::Implementation => &IMPLEMENTATION,
            Phase::QualityCheck => &QUALITY_CHECK,
            Phase::PrCreation => &PR_CREATION,
            Phase::Fix => &FIX,
            Phase::Completion => &COMPLETION,
        }
    }

    /// Looks up guidance by wire name.
    pub fn for_name(name: &str) -> Result<&'static PhaseInstruction, WorkflowError> {
        name.parse::<Phase>().map(Self::for_phase)
    }
}

static ISSUE_START: PhaseInstruction = PhaseInstruction {
    preconditions: &[
        "An issue identifier has been provided",
        "The repository is checked out and the default branch is up to date",
    ],
    acceptance_criteria: &[
        "The issue requirements are understood and summarised",
        "A feature branch exists for the issue",
        "The files likely to change have been identified",
    ],
    tasks: &[
        "Read the issue description and any linked discussion",
        "Create a feature branch named after the issue",
        "Survey the code paths the change will touch",
        "Write down an implementation plan",
    ],
};

static IMPLEMENTATION: PhaseInstruction = PhaseInstruction {
    preconditions: &[
        "The issue has been analysed and a plan exists",
        "Work is happening on the feature branch",
    ],
    acceptance_criteria: &[
        "The planned change is implemented",
        "New behaviour is covered by tests",
        "The project builds locally",
    ],
    tasks: &[
        "Implement the change following the plan",
        "Add or update tests for the new behaviour",
        "Keep commits small and focused",
        "Record every file you touched in workingFiles",
    ],
};

static QUALITY_CHECK: PhaseInstruction = PhaseInstruction {
    preconditions: &["Implementation or fixes are committed on the feature branch"],
    acceptance_criteria: &[
        "Formatter and linter report no issues",
        "The full test suite passes",
        "Type checking or compilation succeeds with no warnings",
    ],
    tasks: &[
        "Run the formatter and linter",
        "Run the full test suite",
        "Run type checking or a full build",
        "Fix anything the checks report before moving on",
    ],
};

static PR_CREATION: PhaseInstruction = PhaseInstruction {
    preconditions: &[
        "All quality checks pass",
        "The feature branch is pushed to the remote",
    ],
    acceptance_criteria: &[
        "A pull request is open and references the issue",
        "The pull request description explains the change and how it was tested",
        "CI has reported a result for the pull request",
    ],
    tasks: &[
        "Push the feature branch",
        "Open a pull request that links the issue",
        "Wait for CI and review feedback",
        "If CI fails or changes are requested, complete this phase with nextPhaseOverride set to fix",
    ],
};

static FIX: PhaseInstruction = PhaseInstruction {
    preconditions: &["CI failures or review comments are available for the pull request"],
    acceptance_criteria: &[
        "Every reported failure or comment has been addressed",
        "Fixes are pushed to the pull request branch",
    ],
    tasks: &[
        "Read the CI logs and review comments",
        "Fix the reported problems",
        "Push the fixes to the pull request branch",
        "Return to quality checks once the fixes are in",
    ],
};

static COMPLETION: PhaseInstruction = PhaseInstruction {
    preconditions: &["The pull request is approved and CI is green"],
    acceptance_criteria: &[
        "The pull request is merged",
        "The issue is closed",
        "The feature branch is cleaned up",
    ],
    tasks: &[
        "Merge the pull request",
        "Close the issue with a short summary",
        "Delete the feature branch",
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_phase_has_guidance() {
        for phase in Phase::ALL {
            let instruction = PhaseInstruction::for_phase(phase);
            assert!(!instruction.preconditions.is_empty(), "{}", phase);
            assert!(!instruction.acceptance_criteria.is_empty(), "{}", phase);
            assert!(!instruction.tasks.is_empty(), "{}", phase);
        }
    }

    #[test]
    fn test_lookup_by_name() {
        let instruction = PhaseInstruction::for_name("fix").unwrap();
        assert_eq!(instruction, PhaseInstruction::for_phase(Phase::Fix));
    }

    #[test]
    fn test_lookup_by_unknown_name_fails() {
        let err = PhaseInstruction::for_name("release").unwrap_err();
        assert_eq!(err.kind(), "UnknownPhase");
    }

    #[test]
    fn test_instruction_serializes_camel_case() {
        let value = serde_json::to_value(PhaseInstruction::for_phase(Phase::IssueStart)).unwrap();
        assert!(value["acceptanceCriteria"].is_array());
        assert!(value["preconditions"].is_array());
        assert!(value["tasks"].is_array());
    }
}
