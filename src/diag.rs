//! Diagnostic output.
//!
//! The engine never logs through a global macro; every machine and queue
//! writes to an injected [`DiagnosticSink`]. The sink contract is a single
//! method: accept a severity and one line of text. [`LogSink`] is the default
//! and forwards to the `log` crate; [`MemorySink`] captures lines for
//! inspection, which is what most tests want.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Severity of one diagnostic line.
///
/// INFO covers state changes and transitions, WARNING covers interruptions
/// on the shutdown path, ERROR covers unhandled events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Where diagnostic lines go.
pub trait DiagnosticSink: Send + Sync {
    fn write_line(&self, severity: Severity, line: &str);
}

/// Forwards diagnostics to the `log` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn write_line(&self, severity: Severity, line: &str) {
        match severity {
            Severity::Info => log::info!("{}", line),
            Severity::Warning => log::warn!("{}", line),
            Severity::Error => log::error!("{}", line),
        }
    }
}

/// Captures diagnostics in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<(Severity, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(Severity, String)>> {
        match self.lines.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// All captured lines, in write order.
    pub fn lines(&self) -> Vec<(Severity, String)> {
        self.lock().clone()
    }

    /// Whether any captured line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lock().iter().any(|(_, line)| line.contains(needle))
    }

    /// Number of captured lines at the given severity.
    pub fn count_at(&self, severity: Severity) -> usize {
        self.lock().iter().filter(|(s, _)| *s == severity).count()
    }
}

impl DiagnosticSink for MemorySink {
    fn write_line(&self, severity: Severity, line: &str) {
        self.lock().push((severity, line.to_owned()));
    }
}

pub(crate) fn default_sink() -> Arc<dyn DiagnosticSink> {
    Arc::new(LogSink)
}
