//! Persisted UI preferences (`~/.flowdeck/prefs.toml`)

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{DeckError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub theme: Theme,
}

/// Reads and writes [`Preferences`] at a fixed path
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.flowdeck/prefs.toml`
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".flowdeck/prefs.toml")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load preferences; a missing or unreadable file yields the defaults
    pub fn load(&self) -> Preferences {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no preferences file, using defaults");
                return Preferences::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read preferences");
                return Preferences::default();
            }
        };

        toml::from_str(&content).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "invalid preferences file, using defaults");
            Preferences::default()
        })
    }

    pub fn save(&self, prefs: &Preferences) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| DeckError::io(parent, e))?;
        }
        let content = toml::to_string(prefs)
            .map_err(|e| DeckError::config(format!("failed to serialize preferences: {}", e)))?;
        fs::write(&self.path, content).map_err(|e| DeckError::io(&self.path, e))?;
        debug!(path = %self.path.display(), theme = prefs.theme.as_str(), "preferences saved");
        Ok(())
    }
}

impl Default for PreferenceStore {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_defaults_to_dark() {
        let dir = TempDir::new().unwrap();
        let store = PreferenceStore::new(dir.path().join("prefs.toml"));
        assert_eq!(store.load().theme, Theme::Dark);
    }

    #[test]
    fn test_theme_round_trips_through_file() {
        let dir = TempDir::new().unwrap();
        let store = PreferenceStore::new(dir.path().join("nested/prefs.toml"));
        store
            .save(&Preferences {
                theme: Theme::Light,
            })
            .unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw.trim(), "theme = \"light\"");
        assert_eq!(store.load().theme, Theme::Light);
    }

    #[test]
    fn test_garbage_value_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs.toml");
        fs::write(&path, "theme = \"sepia\"\n").unwrap();
        assert_eq!(PreferenceStore::new(path).load().theme, Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
    }
}
