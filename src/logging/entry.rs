use super::LogLevel;
use crate::phases::Phase;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single audit entry, one per line in the durable sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// ISO 8601 timestamp with microseconds
    pub timestamp: String,
    pub session_id: String,
    /// 0-based, +1 per emitted entry
    pub sequence_number: u64,
    pub level: LogLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<ProtocolInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<WorkflowInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<TimingInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolDirection {
    Request,
    Response,
    Notification,
}

impl ProtocolDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolDirection::Request => "request",
            ProtocolDirection::Response => "response",
            ProtocolDirection::Notification => "notification",
        }
    }

    /// Arrow used in console output: inbound `<-`, outbound `->`.
    pub fn arrow(&self) -> &'static str {
        match self {
            ProtocolDirection::Request | ProtocolDirection::Notification => "<-",
            ProtocolDirection::Response => "->",
        }
    }
}

/// One protocol message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolInfo {
    pub direction: ProtocolDirection,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

/// Phase transition snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowInfo {
    pub phase: Phase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_phase: Option<Phase>,
    #[serde(default)]
    pub working_files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingInfo {
    pub start_time: String,
    pub end_time: String,
    pub duration_ms: f64,
}

impl TimingInfo {
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let micros = (end - start).num_microseconds().unwrap_or(i64::MAX);
        Self {
            start_time: start.to_rfc3339_opts(SecondsFormat::Micros, true),
            end_time: end.to_rfc3339_opts(SecondsFormat::Micros, true),
            duration_ms: micros.max(0) as f64 / 1000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    pub kind: String,
    pub message: String,
}

/// Optional structured parts of an entry, filled in by callers of `emit`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryFields {
    pub protocol: Option<ProtocolInfo>,
    pub workflow: Option<WorkflowInfo>,
    pub timing: Option<TimingInfo>,
    pub metadata: Option<Value>,
    pub error: Option<ErrorInfo>,
}

impl EntryFields {
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_error(mut self, kind: &str, message: impl Into<String>) -> Self {
        self.error = Some(ErrorInfo {
            kind: kind.to_string(),
            message: message.into(),
        });
        self
    }
}
