//! Events emitted by the state machine after processing commands.
//!
//! Events feed the audit log; callers read state through `state()` and `status()`.

use crate::phases::{Phase, PhaseStatus};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum StateEvent {
    /// A workflow began at `issue_start`
    WorkflowStarted { issue_id: String },
    /// The current phase was completed and the workflow moved on
    PhaseCompleted {
        phase: Phase,
        status: PhaseStatus,
        next_phase: Phase,
        working_file_count: usize,
    },
    /// A next-phase override was not a legal transition and the default was used
    OverrideIgnored { from: Phase, requested: Phase },
    /// The workflow was discarded; `issue_id` is `None` if nothing was active
    WorkflowReset { issue_id: Option<String> },
}
