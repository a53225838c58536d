use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::filters::{CATEGORY_PAGE_SIZE, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";

/// Environment variable that overrides `api.base_url`
pub const API_URL_ENV: &str = "FLOWDECK_API_URL";

/// Configuration for flowdeck, read from ~/.flowdeck/config.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeckConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub browse: BrowseConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowseConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_category_page_size")]
    pub category_page_size: usize,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Where `download` writes files; defaults to the user's download dir
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

fn default_base_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_category_page_size() -> usize {
    CATEGORY_PAGE_SIZE
}

fn default_debounce_ms() -> u64 {
    300
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
        }
    }
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            category_page_size: default_category_page_size(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl DeckConfig {
    /// Load config from ~/.flowdeck/config.toml, then apply env overrides.
    ///
    /// A missing file is not an error: defaults are used.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit path with no env overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "config not found, using defaults (run: flowdeck config init)");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .context(format!("Failed to read config file: {:?}", path))?;

        let mut config: Self =
            toml::from_str(&content).context("Failed to parse config file (invalid TOML)")?;

        config.expand_variables();
        debug!(path = %path.display(), base_url = %config.api.base_url, "config loaded");
        Ok(config)
    }

    /// ~/.flowdeck
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".flowdeck")
    }

    /// ~/.flowdeck/config.toml
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_ENV).filter(|u| !u.trim().is_empty()) {
            debug!(base_url = %url, "api.base_url overridden from {}", API_URL_ENV);
            self.api.base_url = url;
        }
    }

    /// Expand ${var} references in paths and the base URL
    fn expand_variables(&mut self) {
        let mut vars = HashMap::new();
        vars.insert("HOME".to_string(), env::var("HOME").unwrap_or_default());
        vars.insert(
            "FLOWDECK_HOME".to_string(),
            Self::config_dir().display().to_string(),
        );

        self.api.base_url = Self::expand_string(&self.api.base_url, &vars);
        if let Some(ref dir) = self.paths.download_dir {
            self.paths.download_dir = Some(Self::expand_path(dir, &vars));
        }
        if let Some(ref log) = self.paths.log_file {
            self.paths.log_file = Some(Self::expand_path(log, &vars));
        }
    }

    fn expand_path(path: &Path, vars: &HashMap<String, String>) -> PathBuf {
        PathBuf::from(Self::expand_string(&path.display().to_string(), vars))
    }

    fn expand_string(s: &str, vars: &HashMap<String, String>) -> String {
        let mut result = s.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("${{{}}}", key), value);
        }
        result
    }

    /// Reject values the client cannot work with
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        let url = self.api.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(format!("  ✗ api.base_url: {:?} (must be http:// or https://)", url));
        }
        for (name, size) in [
            ("browse.page_size", self.browse.page_size),
            ("browse.category_page_size", self.browse.category_page_size),
        ] {
            if size == 0 || size > MAX_PAGE_SIZE {
                errors.push(format!("  ✗ {}: {} (must be 1-{})", name, size, MAX_PAGE_SIZE));
            }
        }
        if self.api.timeout_secs == Some(0) {
            errors.push("  ✗ api.timeout_secs: 0 (omit it to disable the timeout)".to_string());
        }

        if !errors.is_empty() {
            anyhow::bail!("Config validation failed:\n{}", errors.join("\n"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.api.timeout_secs.map(Duration::from_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.browse.debounce_ms)
    }

    pub fn download_dir(&self) -> PathBuf {
        self.paths
            .download_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Log file used while the TUI owns the terminal
    pub fn log_path(&self) -> PathBuf {
        self.paths
            .log_file
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("flowdeck.log"))
    }

    /// Save config to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_str =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(path, toml_str).context(format!("Failed to write config file: {:?}", path))?;
        Ok(())
    }
}
