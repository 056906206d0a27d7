//! Workflow state and the phase completion payload.

use crate::phases::{Phase, PhaseStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of a phase, as submitted by the caller on completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseResult {
    pub phase_name: Phase,
    pub status: PhaseStatus,
    #[serde(default)]
    pub working_files: Vec<String>,
    #[serde(default)]
    pub completed_tasks: Vec<String>,
    /// Free-form notes. `None` means the field was absent; `Some("")` is kept as given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_phase_override: Option<Phase>,
    #[serde(with = "timestamp")]
    pub completed_at: DateTime<Utc>,
}

impl PhaseResult {
    /// A `completed` result for `phase` with no files or tasks, stamped now.
    pub fn completed(phase: Phase) -> Self {
        Self {
            phase_name: phase,
            status: PhaseStatus::Completed,
            working_files: Vec::new(),
            completed_tasks: Vec::new(),
            notes: None,
            next_phase_override: None,
            completed_at: Utc::now(),
        }
    }

    pub fn with_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.working_files = files.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_override(mut self, next: Phase) -> Self {
        self.next_phase_override = Some(next);
        self
    }
}

/// File paths touched across the workflow, deduplicated, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WorkingFiles(Vec<String>);

impl WorkingFiles {
    /// Appends every path not already present. Returns how many were added.
    pub fn merge<'a, I>(&mut self, files: I) -> usize
    where
        I: IntoIterator<Item = &'a String>,
    {
        let before = self.0.len();
        for file in files {
            if !self.0.contains(file) {
                self.0.push(file.clone());
            }
        }
        self.0.len() - before
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// The single in-flight workflow.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState {
    pub issue_id: String,
    pub current_phase: Phase,
    pub working_files: WorkingFiles,
    pub phase_history: Vec<PhaseResult>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowState {
    pub fn new(issue_id: &str) -> Self {
        let now = Utc::now();
        Self {
            issue_id: issue_id.to_string(),
            current_phase: Phase::IssueStart,
            working_files: WorkingFiles::default(),
            phase_history: Vec::new(),
            started_at: now,
            updated_at: now,
        }
    }

    /// Advances `updated_at` to now, never backwards.
    pub fn set_updated_at(&mut self) {
        let now = Utc::now();
        if now > self.updated_at {
            self.updated_at = now;
        }
    }

    pub fn completed_phases(&self) -> usize {
        self.phase_history.len()
    }

    /// Time between start and the most recent mutation.
    pub fn elapsed(&self) -> chrono::Duration {
        self.updated_at - self.started_at
    }
}

/// Serde adapter for caller-supplied timestamps.
///
/// Accepts RFC 3339, a zone-less `YYYY-MM-DDTHH:MM:SS[.fff]` (read as UTC) and a
/// bare `YYYY-MM-DD` (midnight UTC). Serializes as RFC 3339.
pub mod timestamp {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(naive.and_utc());
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("'{}' is not a valid timestamp", raw))
        })
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
