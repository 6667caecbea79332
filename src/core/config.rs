//! Configuration module for the media organizer
//!
//! Supports loading configuration from a TOML file. Every section is
//! optional; command-line flags override whatever the file sets.
//!
//! The standard location comes from `dirs::config_dir()`:
//! - Windows: %APPDATA%\media_organizer\config.toml
//! - Linux: ~/.config/media_organizer/config.toml
//! - macOS: ~/Library/Application Support/media_organizer/config.toml

use crate::core::copier::DEFAULT_WORKERS;
use crate::core::extensions::{ExtensionSet, DEFAULT_EXTENSIONS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application name used for config directory
const APP_NAME: &str = "media_organizer";

/// Default config file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Config files checked in the working directory before the standard location
const LOCAL_CONFIG_FILES: &[&str] = &["./config.toml", "./media_organizer.toml"];

/// Standard configuration directory for the application
pub fn get_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME))
}

/// Standard configuration file path
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Organize run settings
    pub organize: OrganizeConfig,

    /// Device settings
    pub device: DeviceConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Organize run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizeConfig {
    /// Recognized extensions, with or without the leading dot
    pub extensions: Vec<String>,

    /// Width of the copy worker pool
    pub workers: usize,

    /// Continue without asking when the destination already exists
    pub assume_yes: bool,
}

/// Device configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Specific device ID to use (optional)
    pub device_id: Option<String>,

    /// Folder inside the device, e.g. "Internal Storage/DCIM"
    pub device_path: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log to file
    pub log_to_file: bool,

    /// Log file path
    pub log_file: PathBuf,
}

impl Default for OrganizeConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            workers: DEFAULT_WORKERS,
            assume_yes: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_to_file: false,
            log_file: PathBuf::from("./media_organizer.log"),
        }
    }
}

impl OrganizeConfig {
    /// The configured extensions, falling back to the defaults when empty
    pub fn extension_set(&self) -> ExtensionSet {
        let set = ExtensionSet::new(&self.extensions);
        if set.is_empty() {
            ExtensionSet::default()
        } else {
            set
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e.to_string()))?;

        Self::from_toml(&content).map_err(|e| match e {
            ConfigError::ParseError(_, msg) => ConfigError::ParseError(path.to_path_buf(), msg),
            other => other,
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(PathBuf::new(), e.to_string()))
    }

    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./config.toml
    /// 2. ./media_organizer.toml
    /// 3. The standard config location
    ///
    /// If no config file is found, returns default configuration.
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::find_config_file() {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// First existing config file in search order
    pub fn find_config_file() -> Option<PathBuf> {
        LOCAL_CONFIG_FILES
            .iter()
            .map(PathBuf::from)
            .chain(get_config_path())
            .find(|path| path.exists())
    }

    /// Save configuration to a TOML file, creating parent folders
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::WriteError(parent.to_path_buf(), e.to_string()))?;
        }
        fs::write(path, content)
            .map_err(|e| ConfigError::WriteError(path.to_path_buf(), e.to_string()))?;

        Ok(())
    }

    /// The effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }

    /// Generate a default config file with comments
    pub fn generate_default_config() -> String {
        include_str!("../../config.example.toml").to_string()
    }
}

/// Configuration error types
#[derive(Debug)]
pub enum ConfigError {
    /// Configuration file was not found at the specified path
    FileNotFound(PathBuf),
    /// Failed to read the configuration file
    ReadError(PathBuf, String),
    /// Failed to parse the configuration file (invalid TOML)
    ParseError(PathBuf, String),
    /// Failed to serialize configuration to TOML
    SerializeError(String),
    /// Failed to write configuration file
    WriteError(PathBuf, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ReadError(path, err) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), err)
            }
            ConfigError::ParseError(path, err) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), err)
            }
            ConfigError::SerializeError(err) => {
                write!(f, "Failed to serialize configuration: {}", err)
            }
            ConfigError::WriteError(path, err) => {
                write!(f, "Failed to write config file '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.organize.workers, 10);
        assert!(!config.organize.assume_yes);
        assert_eq!(config.organize.extension_set(), ExtensionSet::default());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.device.device_id, None);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [organize]
            extensions = ["jpg", "HEIC"]

            [device]
            device_path = "Internal Storage/DCIM"
            "#,
        )
        .unwrap();
        assert_eq!(config.organize.workers, 10);
        assert!(config.organize.extension_set().matches("IMG_1.heic"));
        assert!(!config.organize.extension_set().matches("clip.mov"));
        assert_eq!(config.device.device_path.as_deref(), Some("Internal Storage/DCIM"));
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_empty_extension_list_uses_defaults() {
        let config = Config::from_toml("[organize]\nextensions = []\n").unwrap();
        assert_eq!(config.organize.extension_set().len(), 6);
    }

    #[test]
    fn test_invalid_toml_names_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[organize\nworkers = ").unwrap();
        match Config::load(&path) {
            Err(ConfigError::ParseError(p, _)) => assert_eq!(p, path),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Config::load(dir.path().join("none.toml")),
            Err(ConfigError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/config.toml");
        let mut config = Config::default();
        config.organize.workers = 3;
        config.device.device_id = Some("usb#vid_04da".to_string());
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_example_config_parses() {
        let config = Config::from_toml(&Config::generate_default_config()).unwrap();
        assert_eq!(config.organize, OrganizeConfig::default());
    }
}
