//! Captured log data and tool diagnostics
//!
//! - `LogEntry` / `LogLevel` - one formatted console line
//! - `LogBuffer` - size-capped, in-order storage of captured lines
//! - `init_tracing` - diagnostics of the capture tool itself

pub mod buffer;
pub mod entry;

pub use buffer::{LogBuffer, Snapshot};
pub use entry::{LogEntry, LogLevel};

/// Initialize internal tracing for capture diagnostics
///
/// Call early in main() before any logging occurs.
/// Set `verbose` to true for debug-level output. `RUST_LOG` wins when set.
pub fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_file(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .with(filter)
        .try_init();
}
