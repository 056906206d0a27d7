//! Markdown rendering for tool responses.

use crate::phases::{allowed_next_phases, Phase};
use crate::state::WorkflowState;
use crate::state_machine::WorkflowStatus;
use std::fmt::Write;

pub const NO_ACTIVE_WORKFLOW: &str =
    "No active workflow. Call start_workflow with an issueId to begin.";

/// Guidance document for `phase`.
pub fn guidance(phase: Phase) -> String {
    let instruction = phase.instruction();
    let mut out = format!("# Phase: {} (`{}`)\n", phase.label(), phase);

    push_section(&mut out, "Preconditions", instruction.preconditions);
    push_section(&mut out, "Tasks", instruction.tasks);
    push_section(&mut out, "Acceptance Criteria", instruction.acceptance_criteria);

    out.push_str("\n## Next Phases\n");
    let next = allowed_next_phases(phase);
    if next.is_empty() {
        out.push_str("- none (terminal phase)\n");
    }
    for candidate in next {
        let _ = writeln!(out, "- `{}`", candidate);
    }

    let _ = write!(
        out,
        "\nWhen the acceptance criteria are met, call complete_phase with phaseName `{}`.\n",
        phase
    );
    out
}

fn push_section(out: &mut String, title: &str, items: &[&str]) {
    let _ = write!(out, "\n## {}\n", title);
    for item in items {
        let _ = writeln!(out, "- {}", item);
    }
}

/// Final report once the workflow reaches `completion`.
pub fn terminal_summary(state: &WorkflowState) -> String {
    let mut out = format!("# Workflow Complete: issue {}\n\n", state.issue_id);
    let _ = writeln!(out, "- Duration: {}", format_duration(state.elapsed()));
    let _ = writeln!(out, "- Working files: {}", state.working_files.len());
    let _ = writeln!(out, "- Phases completed: {}", state.completed_phases());

    out.push_str("\n## Phase History\n");
    for (index, result) in state.phase_history.iter().enumerate() {
        let _ = write!(
            out,
            "{}. {} ({}, {} tasks)",
            index + 1,
            result.phase_name,
            result.status,
            result.completed_tasks.len()
        );
        match result.notes.as_deref() {
            Some(notes) if !notes.trim().is_empty() => {
                let _ = writeln!(out, ": {}", notes.trim());
            }
            _ => out.push('\n'),
        }
    }
    out
}

pub fn status_report(status: &WorkflowStatus) -> String {
    let (Some(issue_id), Some(phase)) = (&status.issue_id, status.current_phase) else {
        return NO_ACTIVE_WORKFLOW.to_string();
    };
    format!(
        "# Workflow Status\n\n- Issue: {}\n- Current phase: {}\n- Progress: {}/{} phases completed\n- Working files: {}\n",
        issue_id, phase, status.completed_phases, status.total_phases, status.working_files
    )
}

/// Formats a duration as e.g. `1h 2m 3s`, omitting leading zero units.
pub fn format_duration(duration: chrono::Duration) -> String {
    let total = duration.num_seconds().max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phases::PhaseStatus;
    use crate::state::PhaseResult;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(chrono::Duration::seconds(3723)), "1h 2m 3s");
        assert_eq!(format_duration(chrono::Duration::seconds(125)), "2m 5s");
        assert_eq!(format_duration(chrono::Duration::seconds(7)), "7s");
        assert_eq!(format_duration(chrono::Duration::seconds(3600)), "1h 0m 0s");
        assert_eq!(format_duration(chrono::Duration::seconds(-5)), "0s");
    }

    #[test]
    fn test_guidance_lists_sections_and_next_phases() {
        let doc = guidance(Phase::PrCreation);
        assert!(doc.starts_with("# Phase: Pull Request Creation (`pr_creation`)"));
        assert!(doc.contains("## Preconditions"));
        assert!(doc.contains("## Tasks"));
        assert!(doc.contains("## Acceptance Criteria"));
        assert!(doc.contains("- `fix`"));
        assert!(doc.contains("- `completion`"));
        assert!(doc.contains("phaseName `pr_creation`"));
    }

    #[test]
    fn test_guidance_for_terminal_phase() {
        let doc = guidance(Phase::Completion);
        assert!(doc.contains("none (terminal phase)"));
    }

    #[test]
    fn test_terminal_summary_lists_history() {
        let mut state = WorkflowState::new("42");
        state.working_files.merge(&["a.ts".to_string(), "b.ts".to_string()]);
        let mut first = PhaseResult::completed(Phase::IssueStart);
        first.completed_tasks = vec!["read".to_string(), "branch".to_string()];
        first.notes = Some("scoped".to_string());
        let mut second = PhaseResult::completed(Phase::Implementation);
        second.status = PhaseStatus::Skipped;
        state.phase_history = vec![first, second];
        state.updated_at = state.started_at + chrono::Duration::seconds(65);

        let summary = terminal_summary(&state);
        assert!(summary.contains("issue 42"));
        assert!(summary.contains("Duration: 1m 5s"));
        assert!(summary.contains("Working files: 2"));
        assert!(summary.contains("1. issue_start (completed, 2 tasks): scoped"));
        assert!(summary.contains("2. implementation (skipped, 0 tasks)\n"));
    }

    #[test]
    fn test_status_report() {
        assert_eq!(status_report(&WorkflowStatus::inactive()), NO_ACTIVE_WORKFLOW);

        let state = WorkflowState::new("7");
        let report = status_report(&WorkflowStatus::from(&state));
        assert!(report.contains("Issue: 7"));
        assert!(report.contains("Current phase: issue_start"));
        assert!(report.contains("0/6 phases completed"));
    }
}
