//! Structured JSON logger
//!
//! One line per event on stderr. `event` and `severity` lead, then the
//! caller's fields sorted by key; a repeated key keeps its first value.
//! Stdout is left to the CLI's response envelope.

use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU8, Ordering};

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Per-heartbeat detail
    Trace = 0,
    /// Normal operations
    Info = 1,
    /// Degraded outcomes (rejected plan, failed action)
    Warn = 2,
    /// Operation failures
    Error = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Severity::Trace,
            1 => Severity::Info,
            2 => Severity::Warn,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

static MIN_SEVERITY: AtomicU8 = AtomicU8::new(Severity::Info as u8);

/// Process-wide structured logger
pub struct Logger;

impl Logger {
    /// Lines below `severity` are dropped. Defaults to INFO.
    pub fn set_min_severity(severity: Severity) {
        MIN_SEVERITY.store(severity as u8, Ordering::Relaxed);
    }

    pub fn min_severity() -> Severity {
        Severity::from_u8(MIN_SEVERITY.load(Ordering::Relaxed))
    }

    pub fn enabled(severity: Severity) -> bool {
        severity >= Self::min_severity()
    }

    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if !Self::enabled(severity) {
            return;
        }
        let line = render_line(severity, event, fields);
        let mut stderr = io::stderr().lock();
        // a lost log line must never fail a failover
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }

    pub fn info(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Info, event, fields);
    }

    pub fn warn(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Warn, event, fields);
    }

    pub fn error(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Error, event, fields);
    }
}

/// Render one newline-terminated JSON object.
pub(crate) fn render_line(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
    let mut line = String::with_capacity(128 + fields.len() * 32);
    line.push_str("{\"event\":");
    push_quoted(&mut line, event);
    line.push_str(",\"severity\":\"");
    line.push_str(severity.as_str());
    line.push('"');

    let mut sorted: Vec<&(&str, &str)> = fields.iter().collect();
    sorted.sort_by_key(|(key, _)| *key);
    sorted.dedup_by_key(|(key, _)| *key);

    for (key, value) in sorted {
        if matches!(*key, "event" | "severity") {
            continue;
        }
        line.push(',');
        push_quoted(&mut line, key);
        line.push(':');
        push_quoted(&mut line, value);
    }
    line.push_str("}\n");
    line
}

fn push_quoted(out: &mut String, s: &str) {
    match serde_json::to_string(s) {
        Ok(quoted) => out.push_str(&quoted),
        Err(_) => out.push_str("\"\""),
    }
}
