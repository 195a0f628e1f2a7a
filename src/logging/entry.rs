//! Log entry types
//!
//! Core types for representing captured console lines.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Console level, upper-cased for display
///
/// Unknown console methods keep their own name (`TABLE`, `TRACE`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LogLevel {
    Log,
    Debug,
    Info,
    Warning,
    Error,
    Other(String),
}

impl LogLevel {
    /// Parse a reported console type, case-insensitively
    pub fn parse(kind: &str) -> Self {
        match kind.to_ascii_uppercase().as_str() {
            "LOG" => Self::Log,
            "DEBUG" => Self::Debug,
            "INFO" => Self::Info,
            "WARNING" => Self::Warning,
            "ERROR" => Self::Error,
            _ => Self::Other(kind.to_uppercase()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Log => "LOG",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for LogLevel {
    fn from(kind: String) -> Self {
        Self::parse(&kind)
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.as_str().to_owned()
    }
}

/// One captured console line; immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub text: String,
}

impl LogEntry {
    pub fn new(timestamp: DateTime<Utc>, level: LogLevel, text: impl Into<String>) -> Self {
        Self {
            timestamp,
            level,
            text: text.into(),
        }
    }

    /// `[<ISO-8601 timestamp>] [<LEVEL>] <text>`
    pub fn render(&self) -> String {
        format!(
            "[{}] [{}] {}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.level,
            self.text
        )
    }
}
