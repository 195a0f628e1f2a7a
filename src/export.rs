//! Export of the log buffer to durable files
//!
//! Every export is a full replacement of the named file; nothing is
//! appended on disk.

use crate::error::{CaptureError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Destination of flushed log content
#[async_trait]
pub trait Exporter: Send + Sync {
    /// Write `content` under `name`, overwriting any previous content
    async fn write(&self, name: &str, content: Bytes) -> Result<()>;
}

/// Writes exports as files inside one output directory
pub struct FileExporter {
    directory: PathBuf,
}

impl FileExporter {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Resolve an export name inside the output directory
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.directory.join(name))
    }
}

#[async_trait]
impl Exporter for FileExporter {
    async fn write(&self, name: &str, content: Bytes) -> Result<()> {
        let path = self.resolve(name)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CaptureError::Export {
                    name: name.to_owned(),
                    source: e,
                })?;
        }

        tokio::fs::write(&path, &content)
            .await
            .map_err(|e| CaptureError::Export {
                name: name.to_owned(),
                source: e,
            })?;

        debug!("Exported {} bytes to {}", content.len(), path.display());
        Ok(())
    }
}

/// Export names are relative paths that stay inside the output directory
pub fn validate_name(name: &str) -> Result<()> {
    let path = Path::new(name);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));

    if name.trim().is_empty() || escapes || path.file_name().is_none() {
        return Err(CaptureError::ConfigValidation {
            field: "filename",
            reason: format!("'{}' must be a relative file path", name),
        });
    }
    Ok(())
}
