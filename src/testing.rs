//! Test doubles shared by unit tests

use crate::error::{CaptureError, Result};
use crate::export::Exporter;
use crate::transport::{ConnectionId, TargetId, Transport};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// Transport call boundaries, in the order they happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    AttachBegin(String),
    AttachEnd(String),
    DetachBegin(String),
    DetachEnd(String),
}

/// Transport that records calls and tracks how many targets are attached
#[derive(Default)]
pub struct MockTransport {
    calls: Mutex<Vec<Call>>,
    attached: Mutex<HashSet<String>>,
    max_attached: AtomicUsize,
    failing: Mutex<HashSet<String>>,
    fail_detach: AtomicBool,
    next_connection: AtomicU64,
    connections: Mutex<HashMap<String, ConnectionId>>,
}

impl MockTransport {
    /// Connection id of the latest successful attach to `target`
    pub fn connection_of(&self, target: &str) -> ConnectionId {
        self.connections
            .lock()
            .get(target)
            .copied()
            .unwrap_or(ConnectionId::new(0))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Highest number of simultaneously attached targets seen
    pub fn max_attached(&self) -> usize {
        self.max_attached.load(Ordering::SeqCst)
    }

    pub fn fail_attach(&self, target: &str) {
        self.failing.lock().insert(target.to_string());
    }

    pub fn fail_detach(&self) {
        self.fail_detach.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn attach(&self, target: &TargetId) -> Result<ConnectionId> {
        let id = target.to_string();
        self.calls.lock().push(Call::AttachBegin(id.clone()));
        tokio::task::yield_now().await;
        self.calls.lock().push(Call::AttachEnd(id.clone()));

        if self.failing.lock().contains(&id) {
            return Err(CaptureError::Attach {
                target: id,
                reason: "target refused".into(),
            });
        }

        let connection = ConnectionId::new(self.next_connection.fetch_add(1, Ordering::SeqCst) + 1);
        self.connections.lock().insert(id.clone(), connection);

        let count = {
            let mut attached = self.attached.lock();
            attached.insert(id);
            attached.len()
        };
        self.max_attached.fetch_max(count, Ordering::SeqCst);
        Ok(connection)
    }

    async fn detach(&self, target: &TargetId) -> Result<()> {
        let id = target.to_string();
        self.calls.lock().push(Call::DetachBegin(id.clone()));
        tokio::task::yield_now().await;
        self.attached.lock().remove(&id);
        self.calls.lock().push(Call::DetachEnd(id));

        if self.fail_detach.load(Ordering::SeqCst) {
            return Err(CaptureError::Transport {
                message: "target already closed".into(),
            });
        }
        Ok(())
    }
}

/// Exporter that keeps every write in memory
#[derive(Default)]
pub struct MockExporter {
    writes: Mutex<Vec<(String, String)>>,
    fail: AtomicBool,
}

impl MockExporter {
    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.writes.lock().len()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Exporter for MockExporter {
    async fn write(&self, name: &str, content: Bytes) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CaptureError::Export {
                name: name.to_owned(),
                source: std::io::Error::other("disk full"),
            });
        }
        self.writes.lock().push((
            name.to_owned(),
            String::from_utf8_lossy(&content).into_owned(),
        ));
        Ok(())
    }
}
