//! Transport abstraction for the remote-debugging connection
//!
//! Separates I/O concerns from capture logic:
//! - **Transport**: attaching to and detaching from a target
//! - **Events**: protocol events and out-of-band detach notices, delivered
//!   on the channel handed to the transport at construction
//!
//! A transport does NOT handle:
//! - Filtering events by target (that's the session's job)
//! - Formatting or storage (that's the engine's job)
//!
//! # Adding a new transport
//!
//! 1. Create `transport/my_transport.rs`
//! 2. Implement the `Transport` trait
//! 3. Add `pub mod my_transport;` here

pub mod cdp;

pub use cdp::CdpTransport;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Opaque identifier of an inspected target
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Identity of one attachment
///
/// Re-attaching to the same target yields a new id, so notifications from
/// an earlier connection can be told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Inbound notification from a transport
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// Protocol event emitted by `origin` over `connection`
    Event {
        origin: TargetId,
        connection: ConnectionId,
        method: String,
        params: Value,
    },
    /// `connection` to `origin` ended without being asked to (e.g. target closed)
    Detached {
        origin: TargetId,
        connection: ConnectionId,
        reason: String,
    },
}

/// Attach/detach primitives of a debugging transport
///
/// Both calls complete asynchronously; the caller decides what to do with
/// the result once it arrives.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Attach to `target` and enable console event delivery
    ///
    /// Every event of the new attachment carries the returned id.
    async fn attach(&self, target: &TargetId) -> Result<ConnectionId>;

    /// Detach from `target`; callers may ignore the error
    async fn detach(&self, target: &TargetId) -> Result<()>;
}
