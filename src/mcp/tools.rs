//! Tool definitions advertised by `tools/list`.

use super::protocol::Tool;
use crate::phases::Phase;
use serde_json::{json, Value};

pub const START_WORKFLOW: &str = "start_workflow";
pub const COMPLETE_PHASE: &str = "complete_phase";
pub const GET_CURRENT_PHASE: &str = "get_current_phase";
pub const GET_WORKFLOW_STATUS: &str = "get_workflow_status";
pub const RESET_WORKFLOW: &str = "reset_workflow";

pub fn workflow_tools() -> Vec<Tool> {
    vec![
        Tool {
            name: START_WORKFLOW,
            description: "Start a development workflow for an issue. Returns the guidance for the issue_start phase. Fails if a workflow is already active.",
            input_schema: start_workflow_schema(),
        },
        Tool {
            name: COMPLETE_PHASE,
            description: "Report the result of the current phase and advance the workflow. Returns guidance for the next phase, or a summary once the workflow is complete.",
            input_schema: complete_phase_schema(),
        },
        Tool {
            name: GET_CURRENT_PHASE,
            description: "Get the guidance for the active phase.",
            input_schema: empty_schema(),
        },
        Tool {
            name: GET_WORKFLOW_STATUS,
            description: "Get a progress summary of the active workflow.",
            input_schema: empty_schema(),
        },
        Tool {
            name: RESET_WORKFLOW,
            description: "Discard the active workflow so a new one can be started.",
            input_schema: empty_schema(),
        },
    ]
}

fn phase_names() -> Vec<&'static str> {
    Phase::ALL.iter().map(Phase::as_str).collect()
}

/// JSON Schema for the start_workflow tool
pub fn start_workflow_schema() -> Value {
    json!({
        "type": "object",
        "required": ["issueId"],
        "properties": {
            "issueId": {
                "type": "string",
                "minLength": 1,
                "description": "Identifier of the issue being worked on."
            }
        }
    })
}

/// JSON Schema for the complete_phase tool
pub fn complete_phase_schema() -> Value {
    json!({
        "type": "object",
        "required": ["phaseName", "status", "completedAt"],
        "properties": {
            "phaseName": {
                "type": "string",
                "enum": phase_names(),
                "description": "The phase being completed. Must be the current phase."
            },
            "status": {
                "type": "string",
                "enum": ["completed", "failed", "skipped"]
            },
            "workingFiles": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Paths of files touched during this phase."
            },
            "completedTasks": {
                "type": "array",
                "items": { "type": "string" }
            },
            "notes": {
                "type": "string"
            },
            "nextPhaseOverride": {
                "type": "string",
                "enum": phase_names(),
                "description": "Explicit next phase. Used only when it is a legal transition; use fix after pr_creation to enter the remediation loop."
            },
            "completedAt": {
                "type": "string",
                "description": "ISO 8601 timestamp of completion."
            }
        }
    })
}

fn empty_schema() -> Value {
    json!({
        "type": "object",
        "properties": {},
        "additionalProperties": false
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_names_are_unique() {
        let tools = workflow_tools();
        let mut names: Vec<&str> = tools.iter().map(|t| t.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 5);
    }

    #[test]
    fn test_complete_phase_schema_lists_every_phase() {
        let schema = complete_phase_schema();
        let phases = schema["properties"]["phaseName"]["enum"].as_array().unwrap();
        assert_eq!(phases.len(), Phase::COUNT);
        assert!(phases.contains(&json!("pr_creation")));
    }
}
