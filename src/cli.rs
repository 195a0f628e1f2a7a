//! Command-line interface definition using clap
//!
//! Command-line values override the config file; the config file overrides
//! built-in defaults.

use crate::config::{Config, SettingsUpdate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default config file, resolved against the working directory
pub const DEFAULT_CONFIG_PATH: &str = "console-capture.toml";

// =============================================================================
// CLI Definition
// =============================================================================

/// Capture console output of a remote-debuggable target
#[derive(Parser, Debug, Default)]
#[command(name = "console-capture")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (TOML)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Settings and logs store (overrides config)
    #[arg(long, value_name = "FILE", global = true)]
    pub store: Option<PathBuf>,

    /// Keep settings and logs in memory only
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Target id or full ws:// URL to capture
    #[arg(long, value_name = "ID")]
    pub target: Option<String>,

    /// Export file name inside the output directory
    #[arg(long, value_name = "NAME")]
    pub filename: Option<String>,

    /// Auto-save interval in seconds (minimum 5)
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Enable or disable periodic auto-save
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub auto_save: Option<bool>,

    /// Output directory for exports (overrides config)
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Remote debugging host (overrides config)
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Remote debugging port (overrides config)
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Offline operations on the store
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Print persisted log lines
    Show,

    /// Drop persisted log lines
    Clear,
}

impl Cli {
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Fold command-line overrides into `config`
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.capture.host = host.clone();
        }
        if let Some(port) = self.port {
            config.capture.port = port;
        }
        if let Some(dir) = &self.out_dir {
            config.output.directory = dir.clone();
        }
        if let Some(store) = &self.store {
            config.output.store_path = store.clone();
        }
    }

    /// Settings given on the command line; unset values keep what is stored
    pub fn settings_update(&self) -> SettingsUpdate {
        SettingsUpdate {
            filename: self.filename.clone(),
            interval_seconds: self.interval,
            auto_save_enabled: self.auto_save,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_defaults() {
        let cli = Cli::parse_from(["console-capture"]);
        assert!(!cli.verbose);
        assert!(!cli.ephemeral);
        assert!(cli.target.is_none());
        assert!(cli.command.is_none());
        assert_eq!(cli.config_path(), PathBuf::from(DEFAULT_CONFIG_PATH));
        assert_eq!(cli.settings_update(), SettingsUpdate::default());
    }

    #[test]
    fn test_cli_parse_verbose() {
        let cli = Cli::parse_from(["console-capture", "-v"]);
        assert!(cli.verbose);

        let cli = Cli::parse_from(["console-capture", "show", "--verbose"]);
        assert!(cli.verbose);
        assert_eq!(cli.command, Some(Command::Show));
    }

    #[test]
    fn test_cli_auto_save_flag_forms() {
        let cli = Cli::parse_from(["console-capture", "--auto-save"]);
        assert_eq!(cli.auto_save, Some(true));

        let cli = Cli::parse_from(["console-capture", "--auto-save", "false"]);
        assert_eq!(cli.auto_save, Some(false));
    }

    #[test]
    fn test_cli_settings_update() {
        let cli = Cli::parse_from([
            "console-capture",
            "--target",
            "ABC",
            "--filename",
            "run.txt",
            "--interval",
            "10",
        ]);
        assert_eq!(cli.target.as_deref(), Some("ABC"));

        let update = cli.settings_update();
        assert_eq!(update.filename.as_deref(), Some("run.txt"));
        assert_eq!(update.interval_seconds, Some(10));
        assert_eq!(update.auto_save_enabled, None);
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "console-capture",
            "--host",
            "10.0.0.5",
            "--port",
            "9333",
            "--out-dir",
            "exports",
            "--store",
            "state.json",
        ]);
        let mut config = Config::default();
        cli.apply_to(&mut config);

        assert_eq!(config.capture.host, "10.0.0.5");
        assert_eq!(config.capture.port, 9333);
        assert_eq!(config.output.directory, PathBuf::from("exports"));
        assert_eq!(config.output.store_path, PathBuf::from("state.json"));
    }

    #[test]
    fn test_cli_parse_clear() {
        let cli = Cli::parse_from(["console-capture", "--store", "s.json", "clear"]);
        assert_eq!(cli.command, Some(Command::Clear));
        assert_eq!(cli.store, Some(PathBuf::from("s.json")));
    }
}
