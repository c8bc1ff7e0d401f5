//! Application configuration
//!
//! Handles loading the list of ROMs to place on the SD card from config.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::rom::TranslateMode;

/// Default config file name
pub const CONFIG_FILE: &str = "config.json";

/// Errors that can occur when loading the configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No config.json found in the current or executable directory")]
    NotFound,

    #[error("IO error reading {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Invalid config {0}: {1}")]
    Json(PathBuf, #[source] serde_json::Error),
}

/// Root application configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Root of the GDEMU SD card
    pub destination: PathBuf,
    /// Folder number of the first configured ROM; `01` is normally the menu
    #[serde(default = "default_first_slot")]
    pub first_slot: usize,
    #[serde(default)]
    pub roms: Vec<RomEntry>,
}

/// One ROM to place on the SD card
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RomEntry {
    /// Zip file or directory holding the image, relative to the executable if not absolute
    pub src: PathBuf,
    /// Display name written to name.txt
    pub name: String,
    #[serde(default)]
    pub mode: TranslateMode,
}

fn default_first_slot() -> usize {
    2
}

impl AppConfig {
    /// Load configuration from an explicit path, or search the usual locations
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            let config = Self::load_from_path(path)?;
            log::info!("Loaded config from {}", path.display());
            return Ok(config);
        }

        // Try to load from current directory first
        let local = Path::new(CONFIG_FILE);
        if local.exists() {
            let config = Self::load_from_path(local)?;
            log::info!("Loaded config from ./{}", CONFIG_FILE);
            return Ok(config);
        }

        // Try to load from executable directory
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let config_path = exe_dir.join(CONFIG_FILE);
                if config_path.exists() {
                    let config = Self::load_from_path(&config_path)?;
                    log::info!("Loaded config from {}", config_path.display());
                    return Ok(config);
                }
            }
        }

        Err(ConfigError::NotFound)
    }

    fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Json(path.to_path_buf(), e))
    }

    /// Destination folder for the `index`-th configured ROM (0-based)
    pub fn slot_dir(&self, index: usize) -> PathBuf {
        self.destination.join(format!("{:02}", self.first_slot + index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "destination": "/media/sd",
            "roms": [
                { "src": "roms/Crazy Taxi.zip", "name": "Crazy Taxi" },
                { "src": "/roms/shenmue", "name": "Shenmue", "mode": "force_retranslate" }
            ]
        }"#;

        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.first_slot, 2);
        assert_eq!(config.roms.len(), 2);
        assert_eq!(config.roms[0].mode, TranslateMode::Default);
        assert_eq!(config.roms[1].mode, TranslateMode::ForceRetranslate);
        assert_eq!(config.slot_dir(0), PathBuf::from("/media/sd/02"));
        assert_eq!(config.slot_dir(1), PathBuf::from("/media/sd/03"));
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sd.json");
        fs::write(&path, r#"{ "destination": "/sd", "first_slot": 10 }"#).unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert!(config.roms.is_empty());
        assert_eq!(config.slot_dir(0), PathBuf::from("/sd/10"));
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(AppConfig::load(Some(&missing)), Err(ConfigError::Io(..))));

        let invalid = dir.path().join("invalid.json");
        fs::write(&invalid, "{ not json").unwrap();
        assert!(matches!(AppConfig::load(Some(&invalid)), Err(ConfigError::Json(..))));
    }
}
