use super::{LogEntry, LogLevel};
use crossterm::style::{Color, Stylize};
use std::io::Write;

/// Console half of the audit logger: a standard stream and an error stream.
pub struct ConsoleSink {
    out: Box<dyn Write + Send>,
    err: Box<dyn Write + Send>,
}

impl ConsoleSink {
    pub fn new(out: Box<dyn Write + Send>, err: Box<dyn Write + Send>) -> Self {
        Self { out, err }
    }

    /// Process stdout for info/debug, stderr for warn/error.
    pub fn stdio() -> Self {
        Self::new(Box::new(std::io::stdout()), Box::new(std::io::stderr()))
    }

    pub fn write(&mut self, entry: &LogEntry) {
        let line = render_line(entry);
        let stream = if entry.level.is_error_class() {
            &mut self.err
        } else {
            &mut self.out
        };
        // Console output is best effort; a closed terminal must not affect the audit trail.
        let _ = writeln!(stream, "{}", line);
        let _ = stream.flush();
    }

    pub fn flush(&mut self) {
        let _ = self.out.flush();
        let _ = self.err.flush();
    }
}

fn level_color(level: LogLevel) -> Color {
    match level {
        LogLevel::Error => Color::Red,
        LogLevel::Warn => Color::Yellow,
        LogLevel::Info => Color::Cyan,
        LogLevel::Debug => Color::DarkGrey,
    }
}

/// Renders an entry as one human-readable line.
///
/// Format: `[ts] [LEVEL] #seq message <protocol> <workflow> (timing) error=kind: msg`
pub fn render_line(entry: &LogEntry) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(message) = &entry.message {
        parts.push(single_line(message));
    }
    if let Some(protocol) = &entry.protocol {
        let mut text = format!("{} {}", protocol.direction.arrow(), protocol.method);
        if let Some(id) = &protocol.id {
            text.push_str(&format!(" (id {})", id));
        }
        parts.push(text);
    }
    if let Some(workflow) = &entry.workflow {
        let mut text = format!("phase={}", workflow.phase);
        if let Some(previous) = workflow.previous_phase {
            text.push_str(&format!(" from={}", previous));
        }
        text.push_str(&format!(" files={}", workflow.working_files.len()));
        parts.push(text);
    }
    if let Some(timing) = &entry.timing {
        parts.push(format!("({:.1}ms)", timing.duration_ms));
    }
    if let Some(error) = &entry.error {
        parts.push(format!("error={}: {}", error.kind, single_line(&error.message)));
    }

    let color = level_color(entry.level);
    format!(
        "{} {} {} {}",
        format!("[{}]", entry.timestamp).dark_grey(),
        format!("[{}]", entry.level).with(color).bold(),
        format!("#{}", entry.sequence_number).with(color),
        parts.join(" ")
    )
}

fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}
