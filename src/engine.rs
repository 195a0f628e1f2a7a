//! Capture engine
//!
//! Single owner of all mutable capture state: the session, the log buffer,
//! the flush watermark and the persisted settings. Every trigger (command,
//! protocol event, tick, external detach) is one `&mut self` call that runs
//! to completion before the next one starts; the runner guarantees that.
//!
//! Store writes after startup run on the blocking pool and are awaited, so
//! they stay ordered without stalling the runtime thread.
//!
//! Lifecycle:
//! - `new` restores settings and logs from the store
//! - `start` resets the watermark for the new session
//! - `teardown` detaches and persists what is left

use crate::codec::{format_params, Limits};
use crate::config::{Settings, SettingsUpdate};
use crate::constants::{CONSOLE_API_CALLED, MAX_LOG_ENTRIES, MIN_FLUSH_INTERVAL_SECS};
use crate::error::Result;
use crate::export::Exporter;
use crate::flush::{maybe_flush, FlushOutcome, FlushWatermark};
use crate::logging::{LogBuffer, LogEntry};
use crate::session::CaptureSession;
use crate::store::{self, KeyValueStore, LOGS_KEY, SETTINGS_KEY};
use crate::transport::{TargetId, Transport, TransportEvent};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Construction parameters of an engine
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Settings used when the store has none yet
    pub defaults: Settings,
    pub limits: Limits,
    pub max_entries: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            defaults: Settings::default(),
            limits: Limits::default(),
            max_entries: MAX_LOG_ENTRIES,
        }
    }
}

/// Read-only view of the engine for presentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    pub is_capturing: bool,
    pub entry_count: usize,
    /// Buffer length at the last successful export
    pub last_export_size: usize,
    pub target: Option<TargetId>,
    pub settings: Settings,
}

pub struct CaptureEngine {
    session: CaptureSession,
    buffer: LogBuffer,
    watermark: FlushWatermark,
    settings: Settings,
    limits: Limits,
    exporter: Arc<dyn Exporter>,
    store: Arc<dyn KeyValueStore>,
    /// Buffer changed since logs were last persisted
    dirty: bool,
}

impl CaptureEngine {
    /// Create an engine, restoring state from `store`
    ///
    /// A capture never survives a restart: the restored `is_capturing` flag
    /// is forced off and written back. Restored settings are brought back
    /// within bounds. Store failures are logged and the engine falls back to
    /// `options`.
    pub fn new(
        transport: Arc<dyn Transport>,
        exporter: Arc<dyn Exporter>,
        store: Arc<dyn KeyValueStore>,
        options: EngineOptions,
    ) -> Self {
        let mut settings = match store::load::<Settings>(store.as_ref(), SETTINGS_KEY) {
            Ok(Some(settings)) => settings,
            Ok(None) => options.defaults.clone(),
            Err(e) => {
                warn!("Could not restore settings, using defaults: {}", e);
                options.defaults.clone()
            }
        };
        settings.sanitize();
        settings.is_capturing = false;

        let restored = match store::load::<Vec<LogEntry>>(store.as_ref(), LOGS_KEY) {
            Ok(logs) => logs,
            Err(e) => {
                warn!("Could not restore logs: {}", e);
                None
            }
        };

        let mut engine = Self {
            session: CaptureSession::new(transport),
            buffer: LogBuffer::new(options.max_entries),
            watermark: FlushWatermark::default(),
            settings,
            limits: options.limits,
            exporter,
            store,
            dirty: false,
        };

        match restored {
            Some(entries) => {
                let dropped = engine.buffer.restore(entries);
                if dropped > 0 {
                    debug!("Dropped {} restored entries over capacity", dropped);
                }
            }
            None => {
                save_logged(
                    engine.store.as_ref(),
                    LOGS_KEY,
                    engine.buffer.snapshot().entries(),
                );
            }
        }
        save_logged(engine.store.as_ref(), SETTINGS_KEY, &engine.settings);
        engine
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn buffer(&self) -> &LogBuffer {
        &self.buffer
    }

    pub fn is_capturing(&self) -> bool {
        self.session.is_capturing()
    }

    /// Period of the auto-save tick, `None` when auto-save is off
    ///
    /// Never shorter than the enforced minimum interval.
    pub fn auto_save_period(&self) -> Option<Duration> {
        let secs = self.settings.interval_seconds.max(MIN_FLUSH_INTERVAL_SECS);
        self.settings
            .auto_save_enabled
            .then(|| Duration::from_secs(secs))
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            is_capturing: self.session.is_capturing(),
            entry_count: self.buffer.len(),
            last_export_size: self.watermark.get(),
            target: self.session.target().cloned(),
            settings: self.settings.clone(),
        }
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Capture `target`, replacing any current session
    pub async fn start(&mut self, target: TargetId) -> Result<()> {
        let result = self.session.start(target).await;
        if result.is_ok() {
            self.watermark.reset();
        }
        self.set_capturing(self.session.is_capturing()).await;
        result
    }

    /// Stop capturing; returns the target that was detached
    pub async fn stop(&mut self) -> Option<TargetId> {
        let target = self.session.stop().await;
        self.set_capturing(false).await;
        self.persist_logs().await;
        target
    }

    /// Export now, subject to the same watermark rule as periodic ticks
    pub async fn request_flush(&mut self) -> FlushOutcome {
        maybe_flush(
            &self.buffer,
            &mut self.watermark,
            self.exporter.as_ref(),
            &self.settings.filename,
        )
        .await
    }

    /// Periodic auto-save tick; ignored while auto-save is off
    pub async fn on_tick(&mut self) -> Option<FlushOutcome> {
        if !self.settings.auto_save_enabled {
            return None;
        }
        Some(self.request_flush().await)
    }

    /// Drop all captured entries
    pub async fn clear(&mut self) {
        self.buffer.clear();
        self.watermark.reset();
        self.persist_logs().await;
    }

    /// Apply a partial settings change and persist it
    pub async fn update_config(&mut self, update: &SettingsUpdate) -> Settings {
        self.settings.apply(update);
        self.persist_settings().await;
        self.settings.clone()
    }

    // =========================================================================
    // Transport events
    // =========================================================================

    /// Route one inbound transport notification
    ///
    /// Anything not from the current attachment is dropped, including
    /// leftovers of an earlier connection to the same target.
    pub async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Event {
                origin,
                connection,
                method,
                params,
            } => {
                if !self.session.admits(&origin, connection) {
                    debug!("Dropping {} from {} ({})", method, origin, connection);
                    return;
                }
                if method != CONSOLE_API_CALLED {
                    return;
                }
                let entry = format_params(&params, &self.limits, Utc::now());
                self.append(entry);
            }
            TransportEvent::Detached {
                origin,
                connection,
                reason,
            } => {
                if self
                    .session
                    .handle_external_detach(&origin, connection, &reason)
                {
                    self.set_capturing(false).await;
                    self.persist_logs().await;
                }
            }
        }
    }

    fn append(&mut self, entry: LogEntry) {
        let evicted = self.buffer.append(entry);
        self.watermark.rebase(evicted);
        self.dirty = true;
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Persist logs if anything was appended since the last write
    pub async fn persist_if_dirty(&mut self) {
        if self.dirty {
            self.persist_logs().await;
        }
    }

    /// Detach and write out the remaining state
    pub async fn teardown(&mut self) {
        self.stop().await;
    }

    async fn set_capturing(&mut self, capturing: bool) {
        self.settings.is_capturing = capturing;
        self.persist_settings().await;
    }

    async fn persist_settings(&self) {
        let settings = self.settings.clone();
        self.write_blocking(move |kv| save_logged(kv, SETTINGS_KEY, &settings))
            .await;
    }

    async fn persist_logs(&mut self) {
        let snapshot = self.buffer.snapshot();
        let written = self
            .write_blocking(move |kv| save_logged(kv, LOGS_KEY, snapshot.entries()))
            .await;
        if written {
            self.dirty = false;
        }
    }

    /// Run one store write on the blocking pool and wait for it
    async fn write_blocking<F>(&self, write: F) -> bool
    where
        F: FnOnce(&dyn KeyValueStore) -> bool + Send + 'static,
    {
        let kv = Arc::clone(&self.store);
        match tokio::task::spawn_blocking(move || write(kv.as_ref())).await {
            Ok(written) => written,
            Err(e) => {
                warn!("Store write task failed: {}", e);
                false
            }
        }
    }
}

/// Write one key; failures are logged, never raised
fn save_logged<T: Serialize + ?Sized>(kv: &dyn KeyValueStore, key: &str, value: &T) -> bool {
    match store::save(kv, key, value) {
        Ok(()) => true,
        Err(e) => {
            warn!("Persisting {} failed: {}", key, e);
            false
        }
    }
}
