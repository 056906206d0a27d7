//! Commands that can mutate workflow state.
//!
//! All state changes go through [`super::WorkflowStateMachine::apply`].

use crate::state::PhaseResult;
use serde_json::{json, Value};

#[derive(Debug, Clone)]
pub enum StateCommand {
    /// Begin a workflow at `issue_start`.
    StartWorkflow { issue_id: String },
    /// Record the result of the current phase and advance.
    CompletePhase { result: PhaseResult },
    /// Discard the active workflow, if any.
    Reset,
}

impl StateCommand {
    pub fn name(&self) -> &'static str {
        match self {
            StateCommand::StartWorkflow { .. } => "start_workflow",
            StateCommand::CompletePhase { .. } => "complete_phase",
            StateCommand::Reset => "reset_workflow",
        }
    }

    /// Audit metadata describing what was attempted.
    pub fn describe(&self) -> Value {
        match self {
            StateCommand::StartWorkflow { issue_id } => json!({
                "command": self.name(),
                "issueId": issue_id,
            }),
            StateCommand::CompletePhase { result } => json!({
                "command": self.name(),
                "phaseName": result.phase_name,
                "status": result.status,
                "nextPhaseOverride": result.next_phase_override,
                "workingFiles": result.working_files.len(),
                "completedTasks": result.completed_tasks.len(),
            }),
            StateCommand::Reset => json!({ "command": self.name() }),
        }
    }
}
