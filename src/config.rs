//! Configuration management
//!
//! Two layers:
//! - `Config`: the tool's TOML config file (endpoint, paths, bounds, seed settings)
//! - `Settings`: the user-facing capture settings persisted in the store

use crate::codec::Limits;
use crate::constants::{
    DEFAULT_DEBUG_HOST, DEFAULT_DEBUG_PORT, DEFAULT_FILENAME, DEFAULT_FLUSH_INTERVAL_SECS,
    DEFAULT_STORE_PATH, MAX_LOG_ENTRIES, MIN_FLUSH_INTERVAL_SECS,
};
use crate::error::{CaptureError, Result};
use crate::export::validate_name;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

// =============================================================================
// Application Configuration
// =============================================================================

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub capture: CaptureConfig,
    pub output: OutputConfig,
    pub limits: LimitsConfig,
    pub defaults: DefaultsConfig,
}

/// Remote-debugging endpoint used to resolve bare target ids
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory export files are written into
    pub directory: PathBuf,
    /// Path of the persistent store (JSON)
    pub store_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_depth: usize,
    pub max_string_len: usize,
    pub max_array_items: usize,
    /// Maximum log entries kept in the buffer
    pub max_entries: usize,
}

/// Seed values for settings when the store holds none
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub filename: String,
    pub interval_seconds: u64,
    pub auto_save: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_DEBUG_HOST.to_string(),
            port: DEFAULT_DEBUG_PORT,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        let limits = Limits::default();
        Self {
            max_depth: limits.max_depth,
            max_string_len: limits.max_string_len,
            max_array_items: limits.max_array_items,
            max_entries: MAX_LOG_ENTRIES,
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            filename: DEFAULT_FILENAME.to_string(),
            interval_seconds: DEFAULT_FLUSH_INTERVAL_SECS,
            auto_save: false,
        }
    }
}

impl LimitsConfig {
    /// Serializer bounds
    pub fn serializer(&self) -> Limits {
        Limits {
            max_depth: self.max_depth,
            max_string_len: self.max_string_len,
            max_array_items: self.max_array_items,
        }
    }
}

impl DefaultsConfig {
    /// Settings for a store that has never been written
    pub fn settings(&self) -> Settings {
        let mut settings = Settings::default();
        settings.apply(&SettingsUpdate {
            filename: Some(self.filename.clone()),
            interval_seconds: Some(self.interval_seconds),
            auto_save_enabled: Some(self.auto_save),
        });
        settings
    }
}

/// Load config from `path`, falling back to defaults
///
/// A missing file is not an error. An unreadable or invalid file is
/// reported and defaults are used.
pub fn load(path: &Path) -> Config {
    if !path.exists() {
        return Config::default();
    }

    match fs::read_to_string(path) {
        Ok(content) => match parse(path, &content) {
            Ok(config) => config,
            Err(e) => {
                warn!("{}, using defaults", e);
                Config::default()
            }
        },
        Err(e) => {
            warn!("Failed to read config {:?}: {}, using defaults", path, e);
            Config::default()
        }
    }
}

fn parse(path: &Path, content: &str) -> Result<Config> {
    toml::from_str(content).map_err(|e| CaptureError::ConfigParse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

// =============================================================================
// Persisted capture settings
// =============================================================================

/// Capture settings, persisted under the `settings` key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub filename: String,
    pub interval_seconds: u64,
    pub auto_save_enabled: bool,
    pub is_capturing: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            filename: DEFAULT_FILENAME.to_string(),
            interval_seconds: DEFAULT_FLUSH_INTERVAL_SECS,
            auto_save_enabled: false,
            is_capturing: false,
        }
    }
}

/// Partial settings change; `None` keeps the current value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub filename: Option<String>,
    pub interval_seconds: Option<u64>,
    pub auto_save_enabled: Option<bool>,
}

impl Settings {
    /// Apply an update
    ///
    /// Empty or invalid filenames and a zero interval are ignored; the
    /// interval is raised to the enforced minimum.
    pub fn apply(&mut self, update: &SettingsUpdate) {
        if let Some(filename) = update.filename.as_deref() {
            match validate_name(filename) {
                Ok(()) => self.filename = filename.to_string(),
                Err(e) if !filename.is_empty() => warn!("Ignoring filename: {}", e),
                Err(_) => {}
            }
        }
        if let Some(secs) = update.interval_seconds.filter(|s| *s > 0) {
            self.interval_seconds = secs.max(MIN_FLUSH_INTERVAL_SECS);
        }
        if let Some(enabled) = update.auto_save_enabled {
            self.auto_save_enabled = enabled;
        }
    }

    /// Bring settings read back from the store within bounds
    ///
    /// A zero interval falls back to the default, any other interval is
    /// raised to the enforced minimum, and an unusable filename is replaced
    /// with the default one.
    pub fn sanitize(&mut self) {
        if self.interval_seconds == 0 {
            warn!("Stored interval is 0, using {}s", DEFAULT_FLUSH_INTERVAL_SECS);
            self.interval_seconds = DEFAULT_FLUSH_INTERVAL_SECS;
        }
        self.interval_seconds = self.interval_seconds.max(MIN_FLUSH_INTERVAL_SECS);
        if let Err(e) = validate_name(&self.filename) {
            warn!("Stored filename rejected: {}", e);
            self.filename = DEFAULT_FILENAME.to_string();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
