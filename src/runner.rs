//! Engine runner
//!
//! Runs a `CaptureEngine` as one task and serializes every trigger through
//! it: commands from `EngineHandle`s, transport events, auto-save ticks and
//! log persistence. A trigger's I/O is awaited inside the loop, so a second
//! `start` queues behind the first instead of interleaving with it.
//!
//! Architecture:
//! ```text
//! EngineHandle ──Command──► ┌────────────┐
//! Transport ──TransportEvent──► │ run loop   │ ──► CaptureEngine
//! auto-save / persist timers ──► └────────────┘
//! ```

use crate::config::{Settings, SettingsUpdate};
use crate::constants::{CHANNEL_CAPACITY, PERSIST_INTERVAL_MS, SHUTDOWN_POLL_MS};
use crate::engine::{CaptureEngine, EngineSnapshot};
use crate::error::{CaptureError, Result};
use crate::flush::FlushOutcome;
use crate::transport::{TargetId, TransportEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

/// Request sent to the run loop, each with its reply channel
enum Command {
    Start {
        target: TargetId,
        reply: oneshot::Sender<Result<()>>,
    },
    Stop {
        reply: oneshot::Sender<Option<TargetId>>,
    },
    Flush {
        reply: oneshot::Sender<FlushOutcome>,
    },
    Clear {
        reply: oneshot::Sender<()>,
    },
    UpdateConfig {
        update: SettingsUpdate,
        reply: oneshot::Sender<Settings>,
    },
    Snapshot {
        reply: oneshot::Sender<EngineSnapshot>,
    },
}

/// Cloneable control surface of a running engine
///
/// Every call fails with `CaptureError::EngineStopped` once the run loop
/// has exited.
#[derive(Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<Command>,
}

impl EngineHandle {
    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| CaptureError::EngineStopped)?;
        response.await.map_err(|_| CaptureError::EngineStopped)
    }

    /// Capture `target`, replacing any current session
    pub async fn start(&self, target: TargetId) -> Result<()> {
        self.request(|reply| Command::Start { target, reply }).await?
    }

    pub async fn stop(&self) -> Result<Option<TargetId>> {
        self.request(|reply| Command::Stop { reply }).await
    }

    pub async fn request_flush(&self) -> Result<FlushOutcome> {
        self.request(|reply| Command::Flush { reply }).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.request(|reply| Command::Clear { reply }).await
    }

    /// Apply a partial settings change; returns the effective settings
    pub async fn update_config(&self, update: SettingsUpdate) -> Result<Settings> {
        self.request(|reply| Command::UpdateConfig { update, reply })
            .await
    }

    pub async fn snapshot(&self) -> Result<EngineSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Resolve once no target is attached, checking every `poll`
    ///
    /// Covers both an explicit stop and the target going away on its own.
    pub async fn wait_detached(&self, poll: Duration) -> Result<()> {
        let mut ticker = tokio::time::interval(poll);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if !self.snapshot().await?.is_capturing {
                return Ok(());
            }
        }
    }
}

/// Spawn the run loop for `engine`
///
/// The loop ends when `shutdown` is set or every handle is dropped; the
/// engine is torn down (detached, logs persisted) before the task finishes.
pub fn spawn(
    engine: CaptureEngine,
    events: mpsc::Receiver<TransportEvent>,
    shutdown: Arc<AtomicBool>,
) -> (EngineHandle, JoinHandle<()>) {
    let (commands_tx, commands_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let task = tokio::spawn(run(engine, commands_rx, events, shutdown));
    (
        EngineHandle {
            commands: commands_tx,
        },
        task,
    )
}

async fn run(
    mut engine: CaptureEngine,
    mut commands: mpsc::Receiver<Command>,
    mut events: mpsc::Receiver<TransportEvent>,
    shutdown: Arc<AtomicBool>,
) {
    let mut shutdown_poll = tokio::time::interval(Duration::from_millis(SHUTDOWN_POLL_MS));
    let mut persist = tokio::time::interval(Duration::from_millis(PERSIST_INTERVAL_MS));
    persist.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut auto_save = schedule(engine.auto_save_period());
    let mut events_open = true;

    loop {
        tokio::select! {
            biased;

            _ = shutdown_poll.tick() => {
                if shutdown.load(Ordering::Relaxed) {
                    break;
                }
            }

            command = commands.recv() => {
                let Some(command) = command else {
                    // Every handle is gone
                    break;
                };
                if handle_command(&mut engine, command).await {
                    auto_save = schedule(engine.auto_save_period());
                }
            }

            _ = next_tick(&mut auto_save) => {
                if let Some(outcome) = engine.on_tick().await {
                    debug!("Auto-save: {}", outcome);
                }
            }

            _ = persist.tick() => engine.persist_if_dirty().await,

            event = events.recv(), if events_open => {
                match event {
                    Some(event) => engine.handle_transport_event(event).await,
                    None => {
                        debug!("Transport event channel closed");
                        events_open = false;
                    }
                }
            }
        }
    }

    engine.teardown().await;
    info!("Capture engine stopped");
}

/// Apply one command; returns `true` when the auto-save schedule changed
async fn handle_command(engine: &mut CaptureEngine, command: Command) -> bool {
    // A dropped reply receiver only means the caller stopped waiting
    match command {
        Command::Start { target, reply } => {
            let _ = reply.send(engine.start(target).await);
        }
        Command::Stop { reply } => {
            let _ = reply.send(engine.stop().await);
        }
        Command::Flush { reply } => {
            let _ = reply.send(engine.request_flush().await);
        }
        Command::Clear { reply } => {
            engine.clear().await;
            let _ = reply.send(());
        }
        Command::UpdateConfig { update, reply } => {
            let _ = reply.send(engine.update_config(&update).await);
            return true;
        }
        Command::Snapshot { reply } => {
            let _ = reply.send(engine.snapshot());
        }
    }
    false
}

/// Periodic auto-save timer; the first tick is one full period away
fn schedule(period: Option<Duration>) -> Option<Interval> {
    period.filter(|p| !p.is_zero()).map(|period| {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    })
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
