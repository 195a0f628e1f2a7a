//! Console Capture - records console output of a remote-debuggable target
//!
//! Usage:
//!   console-capture --target <ID>      Capture until Ctrl-C or the target closes
//!   console-capture --auto-save ...    Also export every --interval seconds
//!   console-capture show               Print persisted log lines
//!   console-capture clear              Drop persisted log lines

use anyhow::{bail, Context, Result};
use clap::Parser;
use console_capture::cli::{Cli, Command};
use console_capture::config::{self, Config};
use console_capture::constants::{CAPTURE_POLL_MS, CHANNEL_CAPACITY};
use console_capture::engine::{CaptureEngine, EngineOptions};
use console_capture::export::FileExporter;
use console_capture::logging::{self, LogEntry};
use console_capture::runner;
use console_capture::store::{self, JsonFileStore, KeyValueStore, MemoryStore, LOGS_KEY};
use console_capture::transport::{CdpTransport, TargetId};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    let mut config = config::load(&cli.config_path());
    cli.apply_to(&mut config);

    let store: Arc<dyn KeyValueStore> = if cli.ephemeral {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(JsonFileStore::new(config.output.store_path.clone()))
    };

    match cli.command {
        Some(Command::Show) => return show_logs(store.as_ref()),
        Some(Command::Clear) => return clear_logs(store.as_ref()),
        None => {}
    }

    let Some(target) = cli.target.clone() else {
        bail!("--target is required to start a capture");
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_capture(&cli, &config, store, TargetId::new(target)))
}

fn show_logs(store: &dyn KeyValueStore) -> Result<()> {
    let entries: Vec<LogEntry> = store::load(store, LOGS_KEY)?.unwrap_or_default();
    let mut stdout = std::io::stdout().lock();
    for entry in &entries {
        writeln!(stdout, "{}", entry.render())?;
    }
    Ok(())
}

fn clear_logs(store: &dyn KeyValueStore) -> Result<()> {
    store::save(store, LOGS_KEY, &Vec::<LogEntry>::new())?;
    eprintln!("Persisted logs cleared");
    Ok(())
}

async fn run_capture(
    cli: &Cli,
    config: &Config,
    store: Arc<dyn KeyValueStore>,
    target: TargetId,
) -> Result<()> {
    let (events_tx, events_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let transport = Arc::new(CdpTransport::new(
        config.capture.host.clone(),
        config.capture.port,
        events_tx,
    ));
    let exporter = Arc::new(FileExporter::new(config.output.directory.clone()));

    let engine = CaptureEngine::new(
        transport,
        exporter,
        store,
        EngineOptions {
            defaults: config.defaults.settings(),
            limits: config.limits.serializer(),
            max_entries: config.limits.max_entries,
        },
    );

    let shutdown = Arc::new(AtomicBool::new(false));
    let (handle, task) = runner::spawn(engine, events_rx, shutdown.clone());

    let settings = handle.update_config(cli.settings_update()).await?;
    info!(
        "Exporting to {} (auto-save: {}, every {}s)",
        settings.filename, settings.auto_save_enabled, settings.interval_seconds
    );

    if let Err(e) = handle.start(target.clone()).await {
        shutdown.store(true, Ordering::SeqCst);
        let _ = task.await;
        return Err(e).with_context(|| format!("Could not capture {}", target));
    }
    eprintln!("Capturing {} (Ctrl-C to stop)", target);

    tokio::select! {
        _ = wait_for_signal() => {}
        ended = handle.wait_detached(Duration::from_millis(CAPTURE_POLL_MS)) => {
            ended?;
            eprintln!("Target {} went away, capture ended", target);
        }
    }

    handle.stop().await?;
    let outcome = handle.request_flush().await?;
    eprintln!("{}", outcome);

    shutdown.store(true, Ordering::SeqCst);
    task.await?;
    Ok(())
}

/// Resolve on SIGINT/SIGTERM (Ctrl-C elsewhere)
async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {},
                    _ = sigint.recv() => {},
                }
                return;
            }
            _ => warn!("Signal handlers unavailable, falling back to Ctrl-C"),
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Waiting for Ctrl-C failed: {}", e);
    }
}
