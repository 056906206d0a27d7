//! Sequenced JSONL audit logger with an optional console mirror.

use super::{
    ConsoleSink, EntryFields, LogEntry, LogLevel, ProtocolInfo, TimingInfo, WorkflowInfo,
};
use crate::phases::Phase;
use chrono::Utc;
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Construction options for [`AuditLogger`].
#[derive(Debug, Clone)]
pub struct LoggerOptions {
    /// Entries below this level are dropped without consuming a sequence number.
    pub min_level: LogLevel,
    pub console: bool,
    pub durable: bool,
    /// Directory for the durable JSONL file.
    pub log_dir: PathBuf,
    /// Caller-supplied session id; a UUID v4 is generated when absent.
    pub session_id: Option<String>,
}

impl LoggerOptions {
    /// Durable-only logger writing to `log_dir`, level `debug`.
    pub fn durable_only(log_dir: &Path) -> Self {
        Self {
            min_level: LogLevel::Debug,
            console: false,
            durable: true,
            log_dir: log_dir.to_path_buf(),
            session_id: None,
        }
    }
}

struct DurableSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

/// Everything guarded by the logger mutex. The counter lives next to the sinks
/// so the order of lines in the file always equals sequence order.
struct Sinks {
    next_seq: u64,
    console: Option<ConsoleSink>,
    durable: Option<DurableSink>,
}

impl Sinks {
    fn write_durable(&mut self, entry: &LogEntry) {
        let Some(durable) = self.durable.as_mut() else {
            return;
        };
        let line = match serde_json::to_string(entry) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("Failed to serialize audit entry {}: {}", entry.sequence_number, e);
                return;
            }
        };
        let written = writeln!(durable.writer, "{}", line).and_then(|_| durable.writer.flush());
        if let Err(e) = written {
            tracing::warn!(
                "Durable audit log {} disabled after write failure: {}",
                durable.path.display(),
                e
            );
            self.durable = None;
        }
    }
}

/// Sequenced, leveled audit logger.
///
/// Thread-safe; all sinks and the sequence counter sit behind one mutex.
pub struct AuditLogger {
    session_id: String,
    min_level: LogLevel,
    log_path: Option<PathBuf>,
    sinks: Mutex<Sinks>,
}

impl AuditLogger {
    /// Creates a logger whose console sink (if enabled) writes to stdout/stderr.
    pub fn new(options: LoggerOptions) -> Self {
        Self::build(options, ConsoleSink::stdio)
    }

    /// Creates a logger with explicit console streams.
    pub fn with_console_writers(
        options: LoggerOptions,
        out: Box<dyn Write + Send>,
        err: Box<dyn Write + Send>,
    ) -> Self {
        Self::build(options, move || ConsoleSink::new(out, err))
    }

    fn build(options: LoggerOptions, console: impl FnOnce() -> ConsoleSink) -> Self {
        let session_id = options
            .session_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let durable = if options.durable {
            open_durable_sink(&options.log_dir, &session_id)
        } else {
            None
        };

        Self {
            log_path: durable.as_ref().map(|d| d.path.clone()),
            session_id,
            min_level: options.min_level,
            sinks: Mutex::new(Sinks {
                next_seq: 0,
                console: options.console.then(console),
                durable,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Sinks> {
        self.sinks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Checks if an entry at the given level would be emitted.
    pub fn should_log(&self, level: LogLevel) -> bool {
        level <= self.min_level
    }

    /// Records one entry. Returns its sequence number, or `None` when the
    /// level is filtered out (in which case nothing else happens).
    pub fn emit(&self, level: LogLevel, message: Option<&str>, fields: EntryFields) -> Option<u64> {
        if !self.should_log(level) {
            return None;
        }

        let mut sinks = self.lock();
        let seq = sinks.next_seq;
        sinks.next_seq += 1;

        let entry = LogEntry {
            timestamp: format_timestamp(),
            session_id: self.session_id.clone(),
            sequence_number: seq,
            level,
            message: message.map(str::to_string),
            protocol: fields.protocol,
            workflow: fields.workflow,
            timing: fields.timing,
            metadata: fields.metadata,
            error: fields.error,
        };

        if let Some(console) = sinks.console.as_mut() {
            console.write(&entry);
        }
        sinks.write_durable(&entry);

        Some(seq)
    }

    pub fn debug(&self, message: &str) -> Option<u64> {
        self.emit(LogLevel::Debug, Some(message), EntryFields::default())
    }

    pub fn info(&self, message: &str) -> Option<u64> {
        self.emit(LogLevel::Info, Some(message), EntryFields::default())
    }

    pub fn warn(&self, message: &str) -> Option<u64> {
        self.emit(LogLevel::Warn, Some(message), EntryFields::default())
    }

    pub fn error(&self, message: &str) -> Option<u64> {
        self.emit(LogLevel::Error, Some(message), EntryFields::default())
    }

    /// Records a protocol message at `info`, with timing for responses.
    pub fn log_protocol(&self, protocol: ProtocolInfo, timing: Option<TimingInfo>) -> Option<u64> {
        let message = format!("{} {}", protocol.direction.as_str(), protocol.method);
        self.emit(
            LogLevel::Info,
            Some(&message),
            EntryFields {
                protocol: Some(protocol),
                timing,
                ..EntryFields::default()
            },
        )
    }

    /// Records a workflow transition at `info`.
    pub fn log_workflow_transition(
        &self,
        message: &str,
        phase: Phase,
        previous_phase: Option<Phase>,
        working_files: &[String],
        metadata: Option<Value>,
    ) -> Option<u64> {
        self.emit(
            LogLevel::Info,
            Some(message),
            EntryFields {
                workflow: Some(WorkflowInfo {
                    phase,
                    previous_phase,
                    working_files: working_files.to_vec(),
                }),
                metadata,
                ..EntryFields::default()
            },
        )
    }

    /// Flushes and syncs the durable sink, then releases it.
    ///
    /// Safe to call repeatedly. Later entries still reach the console and
    /// still consume sequence numbers.
    pub fn close(&self) {
        let mut sinks = self.lock();
        if let Some(mut durable) = sinks.durable.take() {
            let synced = durable
                .writer
                .flush()
                .and_then(|_| durable.writer.get_ref().sync_all());
            if let Err(e) = synced {
                tracing::warn!(
                    "Failed to sync audit log {}: {}",
                    durable.path.display(),
                    e
                );
            }
        }
        if let Some(console) = sinks.console.as_mut() {
            console.flush();
        }
    }

    /// True while entries are still being persisted.
    pub fn is_durable(&self) -> bool {
        self.lock().durable.is_some()
    }

    /// Path of the durable log file, if one was opened.
    pub fn path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// Suffixes `-1` .. `-99` are tried before durable output is given up.
const MAX_NAME_ATTEMPTS: u32 = 100;

/// Opens a file nobody else has written to. Two loggers sharing a session id
/// within the same second get `-1`, `-2`, ... suffixes instead of one file.
fn open_durable_sink(log_dir: &Path, session_id: &str) -> Option<DurableSink> {
    if let Err(e) = std::fs::create_dir_all(log_dir) {
        tracing::warn!(
            "Durable audit log disabled, cannot create {}: {}",
            log_dir.display(),
            e
        );
        return None;
    }

    let stem = log_file_stem(session_id);
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let path = log_dir.join(log_file_name(&stem, attempt));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => {
                return Some(DurableSink {
                    path,
                    writer: BufWriter::new(file),
                })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => {
                tracing::warn!(
                    "Durable audit log disabled, cannot open {}: {}",
                    path.display(),
                    e
                );
                return None;
            }
        }
    }

    tracing::warn!(
        "Durable audit log disabled, no free file name for {} in {}",
        stem,
        log_dir.display()
    );
    None
}

/// `audit-<YYYYMMDD-HHMMSS>-<session>`, with the session id reduced to
/// filename-safe characters.
fn log_file_stem(session_id: &str) -> String {
    let safe: String = session_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("audit-{}-{}", Utc::now().format("%Y%m%d-%H%M%S"), safe)
}

fn log_file_name(stem: &str, attempt: u32) -> String {
    match attempt {
        0 => format!("{}.jsonl", stem),
        n => format!("{}-{}.jsonl", stem, n),
    }
}

/// Formats the current UTC time as ISO 8601 with microseconds.
fn format_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

#[cfg(test)]
#[path = "../tests/structured_logger_tests.rs"]
mod tests;
