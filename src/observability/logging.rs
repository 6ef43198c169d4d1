use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Severity levels of the decision log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the canonical uppercase representation.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = LoggingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            _ => Err(LoggingError::UnknownLevel(value.to_string())),
        }
    }
}

/// Rotation policy (default 16 MiB × 4 segments).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRotationPolicy {
    pub max_bytes: usize,
    pub max_files: usize,
}

impl Default for LogRotationPolicy {
    fn default() -> Self {
        Self {
            max_bytes: 16 << 20,
            max_files: 4,
        }
    }
}

/// Accumulated log lines for a rotated segment.
#[derive(Debug, Default, Clone)]
pub struct LogFile {
    lines: Vec<String>,
    bytes_written: usize,
}

impl LogFile {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Total bytes recorded before rotation.
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }
}

/// JSON-line logger stamped with trigger clockticks instead of wall time.
///
/// Replaying the same input produces byte-identical lines.
#[derive(Debug, Clone)]
pub struct JsonLineLogger {
    policy: LogRotationPolicy,
    current_level: LogLevel,
    files: VecDeque<LogFile>,
    active: LogFile,
    next_index: u64,
}

impl Default for JsonLineLogger {
    fn default() -> Self {
        Self::new(LogRotationPolicy::default())
    }
}

impl JsonLineLogger {
    pub fn new(policy: LogRotationPolicy) -> Self {
        Self {
            policy,
            current_level: LogLevel::Info,
            files: VecDeque::new(),
            active: LogFile::default(),
            next_index: 0,
        }
    }

    pub fn level(&self) -> LogLevel {
        self.current_level
    }

    pub fn set_level(&mut self, level: LogLevel) {
        self.current_level = level;
    }

    /// Emits one JSON-line entry; the sequence index counts emitted lines only.
    pub fn log(
        &mut self,
        clocktick: u32,
        level: LogLevel,
        module: &str,
        stage: &str,
        message: &str,
    ) -> Result<(), LoggingError> {
        if level < self.current_level {
            return Ok(());
        }
        let record = LogRecord {
            ts: clocktick,
            level: level.as_str(),
            module,
            stage,
            index: self.next_index,
            message,
        };
        let line = serde_json::to_string(&record)?;
        self.next_index = self.next_index.saturating_add(1);
        self.rotate_if_needed(line.len());
        self.active.bytes_written = self.active.bytes_written.saturating_add(line.len());
        self.active.lines.push(line);
        Ok(())
    }

    /// Returns the rotated history followed by the active segment.
    pub fn files(&self) -> impl Iterator<Item = &LogFile> {
        self.files.iter().chain(std::iter::once(&self.active))
    }

    /// Takes every retained line, oldest first, leaving the logger empty.
    pub fn drain_lines(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        for mut file in self.files.drain(..) {
            lines.append(&mut file.lines);
        }
        lines.append(&mut std::mem::take(&mut self.active).lines);
        lines
    }

    fn rotate_if_needed(&mut self, next_line_len: usize) {
        if self.active.bytes_written + next_line_len <= self.policy.max_bytes {
            return;
        }
        if !self.active.lines.is_empty() {
            self.files.push_back(std::mem::take(&mut self.active));
            while self.files.len() > self.policy.max_files {
                self.files.pop_front();
            }
        }
        self.active = LogFile::default();
    }
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to serialize log record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("unknown log level '{0}'")]
    UnknownLevel(String),
}

#[derive(Debug, Serialize)]
struct LogRecord<'a> {
    ts: u32,
    level: &'a str,
    module: &'a str,
    stage: &'a str,
    index: u64,
    message: &'a str,
}
