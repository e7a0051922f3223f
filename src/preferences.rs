use crate::error::StoreError;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted user preferences
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Whether the particle effects are shown at all
    pub effects_enabled: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            effects_enabled: true,
        }
    }
}

impl Preferences {
    /// `<config_dir>/particle-field/preferences.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("particle-field").join("preferences.json"))
    }

    /// Read preferences; a missing or unreadable file yields the defaults
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match Self::load_from_file(path) {
            Ok(prefs) => {
                debug!("preferences loaded from {}", path.display());
                prefs
            }
            Err(StoreError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                Self::default()
            }
            Err(err) => {
                warn!("ignoring preferences at {}: {}", path.display(), err);
                Self::default()
            }
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self, StoreError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write preferences, creating the parent directory if needed
    pub fn save_to_file(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        debug!("preferences saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_defaults_to_enabled() {
        let dir = TempDir::new().unwrap();
        let prefs = Preferences::load(Some(&dir.path().join("none.json")));
        assert!(prefs.effects_enabled);
        assert!(Preferences::load(None).effects_enabled);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("preferences.json");
        let prefs = Preferences {
            effects_enabled: false,
        };
        prefs.save_to_file(&path).unwrap();
        assert_eq!(Preferences::load(Some(&path)), prefs);

        let json = fs::read_to_string(&path).unwrap();
        assert!(json.contains("\"effects_enabled\": false"));
    }

    #[test]
    fn test_corrupt_file_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, "{{").unwrap();
        assert!(Preferences::load_from_file(&path).is_err());
        assert!(Preferences::load(Some(&path)).effects_enabled);
    }
}
