//! Line sinks shared by the JSON logger and telemetry adapters.

use serde_json::Value;
use std::io::Write;
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

/// A sink that receives pre-formatted, newline-terminated lines.
pub trait LogSink: Send + Sync {
    /// Write a line to the sink.
    fn write_line(&self, line: &str);

    /// Write `value` as one compact JSON line.
    fn write_json(&self, value: &Value) {
        self.write_line(&format!("{value}\n"));
    }
}

/// Milliseconds since the Unix epoch; zero if the clock is before it.
pub(crate) fn timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

/// Log sink that writes to stderr, keeping stdout free for command output.
#[derive(Debug, Default)]
pub struct StderrLogSink;

impl LogSink for StderrLogSink {
    fn write_line(&self, line: &str) {
        let mut stderr = std::io::stderr().lock();
        if let Err(error) = stderr.write_all(line.as_bytes()) {
            tracing::warn!(%error, "log sink write failed");
        }
    }
}

/// Sink that buffers lines in memory.
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    lines: Mutex<Vec<String>>,
}

impl MemoryLogSink {
    /// Drain buffered lines, oldest first.
    pub fn take(&self) -> Vec<String> {
        let mut guard = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *guard)
    }
}

impl LogSink for MemoryLogSink {
    fn write_line(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_drains_lines() {
        let sink = MemoryLogSink::default();
        sink.write_line("first\n");
        sink.write_line("second\n");

        assert_eq!(sink.take(), vec!["first\n".to_owned(), "second\n".to_owned()]);
        assert!(sink.take().is_empty());
    }

    #[test]
    fn json_lines_are_compact_and_terminated() {
        let sink = MemoryLogSink::default();
        sink.write_json(&serde_json::json!({ "familyCode": "HL-A", "serial": 3 }));

        assert_eq!(sink.take(), vec!["{\"familyCode\":\"HL-A\",\"serial\":3}\n".to_owned()]);
    }
}
