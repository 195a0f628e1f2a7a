//! Persistent key-value store
//!
//! Plain read-modify-write semantics with a single writer; no transactions
//! across keys.

use crate::error::{CaptureError, Result};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Key of the persisted log lines
pub const LOGS_KEY: &str = "logs";

/// Key of the persisted settings
pub const SETTINGS_KEY: &str = "settings";

/// Durable key-value storage
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn set(&self, key: &str, value: Value) -> Result<()>;
}

/// Read and decode a typed value
pub fn load<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    match store.get(key)? {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| CaptureError::Store {
                key: key.to_owned(),
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

/// Encode and write a typed value
pub fn save<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let value = serde_json::to_value(value).map_err(|e| CaptureError::Store {
        key: key.to_owned(),
        reason: e.to_string(),
    })?;
    store.set(key, value)
}

// =============================================================================
// In-memory store
// =============================================================================

/// Store that lives only as long as the process
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.values.lock().insert(key.to_owned(), value);
        Ok(())
    }
}

// =============================================================================
// JSON file store
// =============================================================================

/// Store kept as one JSON object on disk
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write leaves the previous content intact.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Map<String, Value>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(CaptureError::Io {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(CaptureError::Store {
                key: "*".to_owned(),
                reason: format!("{} does not hold a JSON object", self.path.display()),
            }),
            Err(e) => Err(CaptureError::Store {
                key: "*".to_owned(),
                reason: format!("{}: {}", self.path.display(), e),
            }),
        }
    }

    fn write_all(&self, map: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| CaptureError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let content = serde_json::to_string(map).map_err(|e| CaptureError::Store {
            key: "*".to_owned(),
            reason: e.to_string(),
        })?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, content).map_err(|e| CaptureError::Io {
            path: tmp.clone(),
            source: e,
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| CaptureError::Io {
            path: self.path.clone(),
            source: e,
        })
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let _guard = self.lock.lock();
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let _guard = self.lock.lock();
        let mut map = self.read_all()?;
        map.insert(key.to_owned(), value);
        self.write_all(&map)
    }
}
