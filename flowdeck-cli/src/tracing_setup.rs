//! Tracing setup for the flowdeck CLI
//!
//! Usage:
//!   flowdeck --debug list ...          # Debug logging to stderr
//!   RUST_LOG=flowdeck_core=debug flowdeck
//!
//! While the TUI owns the terminal, logs are appended to a file instead
//! (`~/.flowdeck/flowdeck.log` unless `paths.log_file` says otherwise).

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

/// Tracing configuration options
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    /// Enable debug logging (sets RUST_LOG=debug if not already set)
    pub debug: bool,
    /// Write to this file instead of stderr
    pub log_file: Option<PathBuf>,
}

fn env_filter(debug: bool) -> EnvFilter {
    let default = if debug { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Initialize tracing based on configuration
pub fn init(config: &TracingConfig) -> Result<()> {
    match &config.log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .context(format!("Failed to create log directory {:?}", parent))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .context(format!("Failed to open log file {:?}", path))?;

            tracing_subscriber::fmt()
                .with_env_filter(env_filter(config.debug))
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true)
                .compact()
                .try_init()
                .map_err(|err| anyhow!(err))
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(env_filter(config.debug))
            .with_writer(std::io::stderr)
            .with_target(config.debug)
            .compact()
            .try_init()
            .map_err(|err| anyhow!(err)),
    }
}
