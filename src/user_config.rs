use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{io_err, ManagerError, Result};
use crate::fs_util;

/// Preferences persisted across restarts of the manager itself.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct UserConfig {
    /// File name of the selected daemon config (e.g., "config.json")
    pub selected_config: Option<String>,
}

impl UserConfig {
    pub fn load(path: &Path) -> Result<Self> {
        tracing::trace!(path = %path.display(), "Loading user config");

        if !path.exists() {
            tracing::trace!("Settings file does not exist, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            ManagerError::Toml(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        tracing::trace!(selected = ?config.selected_config, "User config loaded");
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        tracing::trace!(path = %path.display(), "Saving user config");

        let content = toml::to_string_pretty(self)
            .map_err(|e| ManagerError::Toml(format!("Failed to serialize settings: {}", e)))?;
        fs_util::write_atomic(path, content.as_bytes())?;

        tracing::trace!("User config saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = UserConfig::load(&dir.path().join("settings.toml")).unwrap();
        assert_eq!(config, UserConfig::default());
    }

    #[test]
    fn selection_survives_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        let config = UserConfig {
            selected_config: Some("work.json".to_string()),
        };
        config.save(&path).unwrap();

        assert_eq!(UserConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "selected_config = [").unwrap();
        assert!(matches!(UserConfig::load(&path), Err(ManagerError::Toml(_))));
    }
}
