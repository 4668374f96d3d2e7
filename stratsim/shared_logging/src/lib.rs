#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Structured logging sinks used by the scenario simulator.
//!
//! Records are plain JSON objects, one per line. A sink is anything that accepts
//! a [`LogRecord`]; the file-backed [`JsonLogger`] is what hosts normally wire in,
//! and [`MemorySink`] keeps records around for assertions in tests.

use std::{
    fmt,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::Result;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Log severity level, ordered from least to most severe.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Debug information.
    Debug,
    /// Informational events.
    Info,
    /// Warning indicator.
    Warn,
    /// Error indicator.
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        };
        f.write_str(label)
    }
}

/// Structured log record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    /// Timestamp in ISO8601.
    pub timestamp: DateTime<Utc>,
    /// Component emitting the log.
    pub module: String,
    /// Severity.
    pub level: LogLevel,
    /// Dotted event name, e.g. `simulation.run.start`.
    pub message: String,
    /// Structured fields attached to the event.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl LogRecord {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(module: impl Into<String>, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            module: module.into(),
            level,
            message: message.into(),
            metadata: Map::new(),
        }
    }

    /// Attaches fields from a JSON object; non-object values are stored under `value`.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        match metadata {
            Value::Object(obj) => self.metadata = obj,
            Value::Null => {}
            other => {
                self.metadata.insert("value".into(), other);
            }
        }
        self
    }
}

/// Destination for structured log records.
pub trait LogSink: Send + Sync + fmt::Debug {
    /// Writes one record.
    fn write(&self, record: &LogRecord) -> Result<()>;
}

/// Thread-safe JSON-lines logger with append-only semantics.
#[derive(Debug)]
pub struct JsonLogger {
    path: PathBuf,
    writer: Mutex<File>,
}

impl JsonLogger {
    /// Creates or opens a logger at the desired path, creating parent directories.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        Ok(Self {
            path,
            writer: Mutex::new(file),
        })
    }

    /// Returns the underlying file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for JsonLogger {
    fn write(&self, record: &LogRecord) -> Result<()> {
        let line = serde_json::to_vec(record)?;
        let mut writer = self.writer.lock();
        writer.write_all(&line)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

/// In-memory sink retaining every record it receives.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies out all records seen so far.
    #[must_use]
    pub fn snapshot(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Returns the records whose message equals `message`.
    #[must_use]
    pub fn find(&self, message: &str) -> Vec<LogRecord> {
        self.records
            .lock()
            .iter()
            .filter(|record| record.message == message)
            .cloned()
            .collect()
    }
}

impl LogSink for MemorySink {
    fn write(&self, record: &LogRecord) -> Result<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn writes_json_lines() {
        let dir = tempdir().unwrap();
        let logger = JsonLogger::new(dir.path().join("nested").join("sim.log")).unwrap();
        logger
            .write(&LogRecord::new("sampler", LogLevel::Info, "simulation.run.start"))
            .unwrap();
        logger
            .write(
                &LogRecord::new("sampler", LogLevel::Warn, "simulation.effect.generator_failed")
                    .with_metadata(json!({ "action": "deploy" })),
            )
            .unwrap();
        let content = fs::read_to_string(logger.path()).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: LogRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.level, LogLevel::Warn);
        assert_eq!(second.metadata["action"], "deploy");
    }

    #[test]
    fn memory_sink_filters_by_message() {
        let sink = MemorySink::new();
        sink.write(&LogRecord::new("m", LogLevel::Info, "a")).unwrap();
        sink.write(&LogRecord::new("m", LogLevel::Info, "b")).unwrap();
        sink.write(&LogRecord::new("m", LogLevel::Debug, "a")).unwrap();
        assert_eq!(sink.find("a").len(), 2);
        assert_eq!(sink.snapshot().len(), 3);
    }

    #[test]
    fn levels_are_ordered_by_severity() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert_eq!(LogLevel::Warn.to_string(), "WARN");
    }

    #[test]
    fn scalar_metadata_is_wrapped() {
        let record = LogRecord::new("m", LogLevel::Info, "x").with_metadata(json!(3));
        assert_eq!(record.metadata["value"], 3);
    }
}
