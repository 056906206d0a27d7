//! Centralized state machine for the phase workflow.
//!
//! This module is the ONLY place workflow state changes. The machine owns
//! the (optional) active workflow, validates commands before touching it,
//! and records every command, event and rejection in the audit log.

mod commands;
mod events;
mod snapshot;

pub use commands::StateCommand;
pub use events::StateEvent;
pub use snapshot::WorkflowStatus;

use crate::errors::WorkflowError;
use crate::logging::{AuditLogger, EntryFields, LogLevel};
use crate::phases::{default_next_phase, is_valid_transition, Phase, PhaseInstruction};
use crate::state::{PhaseResult, WorkflowState};
use serde_json::json;
use std::sync::Arc;

/// Holds at most one workflow. Independent instances never share state.
pub struct WorkflowStateMachine {
    state: Option<WorkflowState>,
    logger: Arc<AuditLogger>,
}

impl WorkflowStateMachine {
    pub fn new(logger: Arc<AuditLogger>) -> Self {
        Self {
            state: None,
            logger,
        }
    }

    /// All mutations go through this single method.
    ///
    /// On error the state is exactly as it was before the call and the
    /// rejection is logged at `error` with the attempted command.
    pub fn apply(&mut self, command: StateCommand) -> Result<Vec<StateEvent>, WorkflowError> {
        let name = command.name();
        let attempted = command.describe();
        self.logger.emit(
            LogLevel::Debug,
            Some(&format!("Applying {}", name)),
            EntryFields::default().with_metadata(attempted.clone()),
        );

        let events = match self.apply_internal(command) {
            Ok(events) => events,
            Err(e) => {
                self.logger.emit(
                    LogLevel::Error,
                    Some(&format!("{} rejected: {}", name, e)),
                    EntryFields::default()
                        .with_error(e.kind(), e.to_string())
                        .with_metadata(attempted),
                );
                return Err(e);
            }
        };

        for event in &events {
            self.log_event(event);
        }

        Ok(events)
    }

    fn apply_internal(&mut self, command: StateCommand) -> Result<Vec<StateEvent>, WorkflowError> {
        match command {
            StateCommand::StartWorkflow { issue_id } => {
                let issue_id = issue_id.trim();
                if issue_id.is_empty() {
                    return Err(WorkflowError::invalid_argument("issueId must not be empty"));
                }
                if let Some(active) = &self.state {
                    return Err(WorkflowError::AlreadyActive {
                        issue_id: active.issue_id.clone(),
                    });
                }
                self.state = Some(WorkflowState::new(issue_id));
                Ok(vec![StateEvent::WorkflowStarted {
                    issue_id: issue_id.to_string(),
                }])
            }

            StateCommand::CompletePhase { result } => {
                let state = self.state.as_mut().ok_or(WorkflowError::NoActiveWorkflow)?;
                let current = state.current_phase;
                if result.phase_name != current {
                    return Err(WorkflowError::PhaseMismatch {
                        attempted: result.phase_name,
                        current,
                    });
                }

                let mut events = Vec::new();
                let next = match result.next_phase_override {
                    Some(requested) if is_valid_transition(current, requested) => requested,
                    Some(requested) => {
                        events.push(StateEvent::OverrideIgnored {
                            from: current,
                            requested,
                        });
                        default_next_phase(current)
                    }
                    None => default_next_phase(current),
                };

                // Nothing below can fail; validation is complete.
                state.working_files.merge(&result.working_files);
                let status = result.status;
                state.phase_history.push(result);
                state.current_phase = next;
                state.set_updated_at();

                events.push(StateEvent::PhaseCompleted {
                    phase: current,
                    status,
                    next_phase: next,
                    working_file_count: state.working_files.len(),
                });
                Ok(events)
            }

            StateCommand::Reset => {
                let previous = self.state.take().map(|state| state.issue_id);
                Ok(vec![StateEvent::WorkflowReset { issue_id: previous }])
            }
        }
    }

    fn log_event(&self, event: &StateEvent) {
        match event {
            StateEvent::WorkflowStarted { issue_id } => {
                self.logger.log_workflow_transition(
                    &format!("Workflow started for issue {}", issue_id),
                    Phase::IssueStart,
                    None,
                    &[],
                    Some(json!({ "issueId": issue_id })),
                );
            }
            StateEvent::PhaseCompleted {
                phase,
                status,
                next_phase,
                working_file_count,
            } => {
                let (issue_id, files) = match &self.state {
                    Some(state) => (state.issue_id.as_str(), state.working_files.as_slice()),
                    None => ("", &[][..]),
                };
                self.logger.log_workflow_transition(
                    &format!("Phase {} {}, next phase {}", phase, status, next_phase),
                    *next_phase,
                    Some(*phase),
                    files,
                    Some(json!({
                        "issueId": issue_id,
                        "completedPhase": phase,
                        "status": status,
                        "nextPhase": next_phase,
                        "workingFileCount": working_file_count,
                    })),
                );
            }
            StateEvent::OverrideIgnored { from, requested } => {
                self.logger.emit(
                    LogLevel::Warn,
                    Some(&format!(
                        "Ignoring next phase override {} -> {}: not a legal transition",
                        from, requested
                    )),
                    EntryFields::default().with_metadata(json!({
                        "from": from,
                        "requested": requested,
                    })),
                );
            }
            StateEvent::WorkflowReset { issue_id } => {
                let message = match issue_id {
                    Some(id) => format!("Workflow for issue {} reset", id),
                    None => "Reset requested with no active workflow".to_string(),
                };
                self.logger.emit(
                    LogLevel::Info,
                    Some(&message),
                    EntryFields::default().with_metadata(json!({ "previousIssueId": issue_id })),
                );
            }
        }
    }

    /// Starts a workflow for `issue_id` at `issue_start`.
    pub fn start(&mut self, issue_id: &str) -> Result<&WorkflowState, WorkflowError> {
        self.apply(StateCommand::StartWorkflow {
            issue_id: issue_id.to_string(),
        })?;
        self.state.as_ref().ok_or(WorkflowError::NoActiveWorkflow)
    }

    /// Completes the current phase with `result` and advances.
    pub fn complete(&mut self, result: PhaseResult) -> Result<&WorkflowState, WorkflowError> {
        self.apply(StateCommand::CompletePhase { result })?;
        self.state.as_ref().ok_or(WorkflowError::NoActiveWorkflow)
    }

    /// Discards the active workflow. Returns its issue id, if there was one.
    pub fn reset(&mut self) -> Option<String> {
        self.apply(StateCommand::Reset)
            .ok()
            .into_iter()
            .flatten()
            .find_map(|event| match event {
                StateEvent::WorkflowReset { issue_id } => issue_id,
                _ => None,
            })
    }

    /// Guidance for the active phase, or `None` with no workflow.
    pub fn current_instruction(&self) -> Option<&'static PhaseInstruction> {
        self.state
            .as_ref()
            .map(|state| state.current_phase.instruction())
    }

    pub fn status(&self) -> WorkflowStatus {
        WorkflowStatus::from(self.state.as_ref())
    }

    /// With no workflow only `issue_start` is reachable; otherwise the
    /// transition table decides.
    pub fn can_transition_to(&self, target: Phase) -> bool {
        match &self.state {
            None => target == Phase::IssueStart,
            Some(state) => is_valid_transition(state.current_phase, target),
        }
    }

    pub fn state(&self) -> Option<&WorkflowState> {
        self.state.as_ref()
    }

    pub fn logger(&self) -> &Arc<AuditLogger> {
        &self.logger
    }
}
