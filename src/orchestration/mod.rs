//! Consumer-facing facade over the workflow state machine.
//!
//! Validates and shapes external input, serializes access to the single
//! machine, and renders markdown responses.

pub mod format;

use crate::errors::WorkflowError;
use crate::logging::{AuditLogger, EntryFields, LogLevel};
use crate::phases::{Phase, PhaseStatus};
use crate::state::PhaseResult;
use crate::state_machine::{WorkflowStateMachine, WorkflowStatus};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartWorkflowArgs {
    issue_id: String,
}

/// Serializes every operation through one lock, so a completion's
/// read-validate-mutate sequence never interleaves with another call.
pub struct PhaseOrchestrator {
    machine: Mutex<WorkflowStateMachine>,
    logger: Arc<AuditLogger>,
}

impl PhaseOrchestrator {
    pub fn new(machine: WorkflowStateMachine) -> Self {
        let logger = Arc::clone(machine.logger());
        Self {
            machine: Mutex::new(machine),
            logger,
        }
    }

    fn lock(&self) -> MutexGuard<'_, WorkflowStateMachine> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a workflow and returns the `issue_start` guidance.
    pub fn start_workflow(&self, issue_id: &str) -> Result<String, WorkflowError> {
        let mut machine = self.lock();
        let phase = machine.start(issue_id)?.current_phase;
        Ok(format::guidance(phase))
    }

    /// `start_workflow` with raw tool arguments (`{"issueId": "..."}`).
    pub fn start_workflow_json(&self, arguments: Value) -> Result<String, WorkflowError> {
        let args: StartWorkflowArgs = self.parse_arguments("start_workflow", arguments)?;
        self.start_workflow(&args.issue_id)
    }

    /// Completes the current phase.
    ///
    /// Returns the terminal summary when a `completed` result moves the
    /// workflow into `completion`, otherwise the guidance for the new phase.
    pub fn complete_phase(&self, result: PhaseResult) -> Result<String, WorkflowError> {
        let finished = result.status == PhaseStatus::Completed;
        let mut machine = self.lock();
        let state = machine.complete(result)?;
        if state.current_phase == Phase::Completion && finished {
            Ok(format::terminal_summary(state))
        } else {
            Ok(format::guidance(state.current_phase))
        }
    }

    /// `complete_phase` with raw tool arguments shaped like [`PhaseResult`].
    pub fn complete_phase_json(&self, arguments: Value) -> Result<String, WorkflowError> {
        let result: PhaseResult = self.parse_arguments("complete_phase", arguments)?;
        self.complete_phase(result)
    }

    /// Guidance for the active phase, or a "no active workflow" message.
    pub fn get_current_phase(&self) -> String {
        let machine = self.lock();
        match machine.state() {
            Some(state) => format::guidance(state.current_phase),
            None => format::NO_ACTIVE_WORKFLOW.to_string(),
        }
    }

    pub fn get_workflow_status(&self) -> String {
        format::status_report(&self.status())
    }

    pub fn reset_workflow(&self) -> String {
        match self.lock().reset() {
            Some(issue_id) => format!("Workflow for issue {} has been reset.", issue_id),
            None => format::NO_ACTIVE_WORKFLOW.to_string(),
        }
    }

    pub fn status(&self) -> WorkflowStatus {
        self.lock().status()
    }

    /// Schema validation happens here, before the machine is touched.
    /// Rejections are logged like any other surfaced error.
    fn parse_arguments<T: DeserializeOwned>(
        &self,
        operation: &str,
        arguments: Value,
    ) -> Result<T, WorkflowError> {
        let logged = arguments.clone();
        serde_json::from_value(arguments).map_err(|e| {
            let err = WorkflowError::invalid_argument(e.to_string());
            self.logger.emit(
                LogLevel::Error,
                Some(&format!("{} rejected: {}", operation, err)),
                EntryFields::default()
                    .with_error(err.kind(), err.to_string())
                    .with_metadata(json!({
                        "operation": operation,
                        "arguments": logged,
                    })),
            );
            err
        })
    }
}
