//! One-shot command implementations for the flowdeck CLI

pub mod browse;
pub mod workflow;

pub use browse::{run_categories, run_list, run_stats};
pub use workflow::{run_download, run_show};

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use flowdeck_core::{DeckConfig, HttpApi};

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output (for piping to jq)
    Json,
}

/// API client for the configured base URL
pub fn connect(config: &DeckConfig) -> Result<HttpApi> {
    HttpApi::with_timeout(&config.api.base_url, config.timeout())
        .context("Failed to create API client")
}

/// Where a downloaded workflow lands.
///
/// Only the final path component of `filename` is used, so a server-chosen
/// name cannot escape the target directory.
pub fn download_target(filename: &str, out: Option<&Path>, default_dir: &Path) -> PathBuf {
    let name = Path::new(filename)
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "workflow.json".into());

    match out {
        Some(path) if path.is_dir() => path.join(name),
        Some(path) => path.to_path_buf(),
        None => default_dir.join(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_target_strips_directories() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            download_target("../../etc/passwd", None, dir.path()),
            dir.path().join("passwd")
        );
        assert_eq!(
            download_target("0001_flow.json", Some(dir.path()), Path::new("/unused")),
            dir.path().join("0001_flow.json")
        );
        assert_eq!(
            download_target("0001_flow.json", Some(Path::new("/tmp/custom.json")), dir.path()),
            PathBuf::from("/tmp/custom.json")
        );
    }
}
