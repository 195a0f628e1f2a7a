//! Capture session state machine
//!
//! Owns the "attached to at most one target" invariant:
//! - `start` is a composite transition: full detach of the current target,
//!   then attach to the new one
//! - `stop` always ends `Detached`, whatever the transport says
//! - an external detach of the current target ends the session too
//!
//! Events are admitted only from the current attachment: the attached target
//! and the connection id the transport returned for it. A re-attach to the
//! same target gets a new id, so notices from the old connection are dropped.

use crate::error::Result;
use crate::transport::{ConnectionId, TargetId, Transport};
use std::sync::Arc;
use tracing::{info, warn};

/// Session lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Detached,
    Attached {
        target: TargetId,
        connection: ConnectionId,
    },
}

/// The single logical attachment to one target
pub struct CaptureSession {
    transport: Arc<dyn Transport>,
    state: SessionState,
}

impl CaptureSession {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            state: SessionState::Detached,
        }
    }

    // =========================================================================
    // State queries
    // =========================================================================

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Currently attached target
    pub fn target(&self) -> Option<&TargetId> {
        match &self.state {
            SessionState::Attached { target, .. } => Some(target),
            SessionState::Detached => None,
        }
    }

    /// Connection id of the current attachment
    pub fn connection(&self) -> Option<ConnectionId> {
        match &self.state {
            SessionState::Attached { connection, .. } => Some(*connection),
            SessionState::Detached => None,
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.target().is_some()
    }

    /// Whether an event from `origin` over `connection` belongs to this session
    pub fn admits(&self, origin: &TargetId, connection: ConnectionId) -> bool {
        match &self.state {
            SessionState::Attached {
                target,
                connection: current,
            } => target == origin && *current == connection,
            SessionState::Detached => false,
        }
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Attach to `target`, detaching any current target first
    ///
    /// The previous detach completes before the new attach begins. On
    /// attach failure the session stays `Detached`.
    pub async fn start(&mut self, target: TargetId) -> Result<()> {
        self.stop().await;

        match self.transport.attach(&target).await {
            Ok(connection) => {
                info!("Capturing {} ({})", target, connection);
                self.state = SessionState::Attached { target, connection };
                Ok(())
            }
            Err(e) => {
                warn!("Attach to {} failed: {}", target, e);
                Err(e)
            }
        }
    }

    /// Detach from the current target, if any
    ///
    /// Detach errors (e.g. target already gone) are logged and swallowed.
    /// Returns the target that was detached.
    pub async fn stop(&mut self) -> Option<TargetId> {
        let SessionState::Attached { target, .. } =
            std::mem::replace(&mut self.state, SessionState::Detached)
        else {
            return None;
        };

        if let Err(e) = self.transport.detach(&target).await {
            warn!("Detach warning for {}: {}", target, e);
        }
        info!("Detached from {}", target);
        Some(target)
    }

    /// React to a detach the transport reports on its own
    ///
    /// Returns `true` when this ended the current session. Notices for other
    /// targets or older connections, or repeated notices, change nothing.
    pub fn handle_external_detach(
        &mut self,
        origin: &TargetId,
        connection: ConnectionId,
        reason: &str,
    ) -> bool {
        if !self.admits(origin, connection) {
            return false;
        }
        info!("Detached externally from {}: {}", origin, reason);
        self.state = SessionState::Detached;
        true
    }
}
