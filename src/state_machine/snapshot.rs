//! Read-only status summary of the workflow.

use crate::phases::Phase;
use crate::state::WorkflowState;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStatus {
    pub active: bool,
    pub issue_id: Option<String>,
    pub current_phase: Option<Phase>,
    /// Always the number of recognized phases
    pub total_phases: usize,
    pub completed_phases: usize,
    pub working_files: usize,
}

impl WorkflowStatus {
    pub fn inactive() -> Self {
        Self {
            active: false,
            issue_id: None,
            current_phase: None,
            total_phases: Phase::COUNT,
            completed_phases: 0,
            working_files: 0,
        }
    }
}

impl From<&WorkflowState> for WorkflowStatus {
    fn from(state: &WorkflowState) -> Self {
        Self {
            active: true,
            issue_id: Some(state.issue_id.clone()),
            current_phase: Some(state.current_phase),
            total_phases: Phase::COUNT,
            completed_phases: state.completed_phases(),
            working_files: state.working_files.len(),
        }
    }
}

impl From<Option<&WorkflowState>> for WorkflowStatus {
    fn from(state: Option<&WorkflowState>) -> Self {
        match state {
            Some(state) => state.into(),
            None => Self::inactive(),
        }
    }
}
