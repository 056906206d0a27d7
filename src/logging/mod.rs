//! Sequenced audit logging.
//!
//! Every accepted entry gets the next 0-based sequence number for the
//! session and goes to up to two independent sinks:
//! - a colour-coded single line on the console (`[ts] [LEVEL] #seq message`)
//! - one JSON object per line in `audit-<YYYYMMDD-HHMMSS>-<session>.jsonl`
//!
//! Entries below the configured minimum level are dropped before a sequence
//! number is assigned.

mod console;
mod entry;
mod structured_logger;

pub use console::{render_line, ConsoleSink};
pub use entry::{
    EntryFields, ErrorInfo, LogEntry, ProtocolDirection, ProtocolInfo, TimingInfo, WorkflowInfo,
};
pub use structured_logger::{AuditLogger, LoggerOptions};

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Log severity, ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error = 0,
    #[serde(alias = "warning")]
    Warn = 1,
    #[default]
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    /// Returns the uppercase string representation for console output.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// Error and warn go to the error stream.
    pub fn is_error_class(&self) -> bool {
        matches!(self, LogLevel::Error | LogLevel::Warn)
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            other => Err(format!(
                "unknown log level '{}' (expected error, warn, info or debug)",
                other
            )),
        }
    }
}
