//! Centralized error types for the capture engine
//!
//! All capture errors are represented by the `CaptureError` enum.
//! Use `Result<T>` as shorthand for `std::result::Result<T, CaptureError>`.

use std::fmt;
use std::path::PathBuf;

/// All capture errors
#[derive(Debug)]
pub enum CaptureError {
    // === Transport ===
    /// Attaching to a target failed; the session stays detached
    Attach { target: String, reason: String },
    /// Transport-level failure outside of attach (send, detach)
    Transport { message: String },
    /// Failed to open the WebSocket connection to a target
    WebSocketConnect {
        url: String,
        source: Box<tokio_tungstenite::tungstenite::Error>,
    },

    // === Export ===
    /// Writing the export file failed; the watermark is left untouched
    Export {
        name: String,
        source: std::io::Error,
    },

    // === Store ===
    /// Persistent store read/write failed
    Store { key: String, reason: String },

    // === IO ===
    /// File system operation failed
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // === Config ===
    /// Invalid config value
    ConfigValidation { field: &'static str, reason: String },
    /// Config file could not be parsed
    ConfigParse { path: PathBuf, reason: String },

    // === Runtime ===
    /// The engine task is gone (shut down or panicked)
    EngineStopped,
}

impl std::error::Error for CaptureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Export { source, .. } | Self::Io { source, .. } => Some(source),
            Self::WebSocketConnect { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attach { target, reason } => {
                write!(f, "Cannot attach to {}: {}", target, reason)
            }
            Self::Transport { message } => write!(f, "Transport error: {}", message),
            Self::WebSocketConnect { url, source } => {
                write!(f, "Cannot connect to {}: {}", url, source)
            }
            Self::Export { name, source } => write!(f, "Cannot export {}: {}", name, source),
            Self::Store { key, reason } => write!(f, "Store error on '{}': {}", key, reason),
            Self::Io { path, .. } => write!(f, "IO error: {}", path.display()),
            Self::ConfigValidation { field, reason } => {
                write!(f, "Invalid {}: {}", field, reason)
            }
            Self::ConfigParse { path, reason } => {
                write!(f, "Cannot parse config {}: {}", path.display(), reason)
            }
            Self::EngineStopped => write!(f, "Capture engine is not running"),
        }
    }
}

/// Alias for Result with CaptureError
pub type Result<T> = std::result::Result<T, CaptureError>;
