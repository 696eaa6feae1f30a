//! Operator status output.
//!
//! The monitor talks to the person wearing the cuff through line-oriented
//! status messages: the welcome banner, pump-up instructions, live pressure
//! readouts, deflation-rate warnings, and the final result lines. The exact
//! wording is presentation, not contract (the conditions that trigger each
//! line are what the measurement pipeline guarantees), so output goes through
//! the small [`StatusSink`] seam rather than straight to stdout.
//!
//! [`ConsoleSink`] is the production implementation. [`MemorySink`] captures
//! lines for assertions in tests, the same role the log-capture buffer plays
//! in GUI builds of larger acquisition systems.

use std::sync::Mutex;

/// Destination for operator-facing status lines.
pub trait StatusSink: Send + Sync {
    /// Emit one status line.
    fn status(&self, line: &str);
}

/// Writes status lines to stdout.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl StatusSink for ConsoleSink {
    fn status(&self, line: &str) {
        println!("{line}");
    }
}

/// Captures status lines in memory for test assertions.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    /// Create an empty capture sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every line emitted so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Whether any captured line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }
}

impl StatusSink for MemorySink {
    fn status(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}

impl<T: StatusSink + ?Sized> StatusSink for &T {
    fn status(&self, line: &str) {
        (**self).status(line);
    }
}

impl<T: StatusSink + ?Sized> StatusSink for std::sync::Arc<T> {
    fn status(&self, line: &str) {
        (**self).status(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_captures_in_order() {
        let sink = MemorySink::new();
        sink.status("first");
        sink.status("second");
        assert_eq!(sink.lines(), vec!["first".to_string(), "second".to_string()]);
        assert!(sink.contains("sec"));
        assert!(!sink.contains("third"));
    }
}
