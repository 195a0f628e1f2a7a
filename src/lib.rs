//! Console Capture
//!
//! Records console output of a remote-debuggable target into a size-capped
//! log and exports it to a file on demand or on a timer.
//!
//! Data flow:
//! ```text
//! Transport ──event──► CaptureSession (origin filter) ──► codec::console ──► LogBuffer
//!                                                                            │
//!                                       manual / periodic flush ──► Exporter ◄┘
//! ```

pub mod cli;
pub mod codec;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod export;
pub mod flush;
pub mod logging;
pub mod protocol;
pub mod runner;
pub mod session;
pub mod store;
pub mod transport;

#[cfg(test)]
mod testing;
