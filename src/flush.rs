//! Flush coordination
//!
//! Decides whether the buffer needs exporting and tracks the watermark of
//! the last successful export. Manual and periodic requests follow the same
//! rule; there is no path that exports unchanged content.

use crate::export::Exporter;
use crate::logging::LogBuffer;
use bytes::Bytes;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

/// Result of one flush attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum FlushOutcome {
    /// Exported this many entries
    Flushed(usize),
    /// Nothing captured yet
    SkippedEmpty,
    /// Nothing new since the last successful export
    SkippedNoNewData,
    /// Exporter failed; the watermark is unchanged
    Failed(String),
}

impl fmt::Display for FlushOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flushed(count) => write!(f, "Exported {} entries", count),
            Self::SkippedEmpty => write!(f, "No logs to save"),
            Self::SkippedNoNewData => write!(f, "No new logs since last save"),
            Self::Failed(reason) => write!(f, "Export failed: {}", reason),
        }
    }
}

/// Buffer length at the last successful export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushWatermark(usize);

impl FlushWatermark {
    pub fn get(&self) -> usize {
        self.0
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }

    /// Record a successful export of `len` entries
    fn advance_to(&mut self, len: usize) {
        self.0 = self.0.max(len);
    }

    /// Shift down after the buffer evicted `evicted` entries from the front
    ///
    /// Keeps the watermark pointing at the same entry boundary so a full
    /// buffer that keeps receiving entries still counts as having new data.
    pub fn rebase(&mut self, evicted: usize) {
        self.0 = self.0.saturating_sub(evicted);
    }
}

/// Export the full buffer if it holds anything newer than the watermark
pub async fn maybe_flush<E>(
    buffer: &LogBuffer,
    watermark: &mut FlushWatermark,
    exporter: &E,
    name: &str,
) -> FlushOutcome
where
    E: Exporter + ?Sized,
{
    if buffer.is_empty() {
        debug!("No logs to save");
        return FlushOutcome::SkippedEmpty;
    }

    if buffer.len() <= watermark.get() {
        debug!("No new logs since last save, skipping");
        return FlushOutcome::SkippedNoNewData;
    }

    let snapshot = buffer.snapshot();
    let content = Bytes::from(snapshot.to_text());

    match exporter.write(name, content).await {
        Ok(()) => {
            watermark.advance_to(snapshot.len());
            info!("Saved {} log entries to {}", snapshot.len(), name);
            FlushOutcome::Flushed(snapshot.len())
        }
        Err(e) => {
            warn!("Saving logs to {} failed: {}", name, e);
            FlushOutcome::Failed(e.to_string())
        }
    }
}
