//! Settings file support for scalelog.
//!
//! Settings are loaded from the following sources (highest priority first):
//! 1. Command-line arguments
//! 2. Environment variables (SCALELOG_*)
//! 3. Local settings file (./scalelog.toml)
//! 4. Global settings file (~/.config/scalelog/config.toml)
//!
//! With `--config <PATH>` only that file is read, and it is also where the
//! wizard saves.

use directories::ProjectDirs;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the local settings file.
pub const LOCAL_CONFIG_FILE: &str = "scalelog.toml";

/// Connection settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Serial port the scale is attached to (e.g., "/dev/ttyUSB0" or "COM3").
    pub serial: Option<String>,
}

/// Log settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Acquisition interval as typed by the operator (e.g., "30m").
    pub interval: Option<String>,
    /// File readings are appended to.
    pub file: Option<PathBuf>,
}

/// Main settings structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Connection settings.
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// Log settings.
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Load settings from the global and local files.
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(global_path) = Self::global_config_path() {
            if let Some(global_config) = Self::load_from_file(&global_path) {
                debug!("Loaded global settings from {}", global_path.display());
                config.merge(global_config);
            }
        }

        // Local settings override global ones
        if let Some(local_config) = Self::load_from_file(Path::new(LOCAL_CONFIG_FILE)) {
            debug!("Loaded local settings from {LOCAL_CONFIG_FILE}");
            config.merge(local_config);
        }

        config
    }

    /// Load settings from a specific file path (--config flag).
    pub fn load_from_path(path: &Path) -> Self {
        if let Some(config) = Self::load_from_file(path) {
            debug!("Loaded settings from {}", path.display());
            config
        } else {
            if path.exists() {
                warn!(
                    "Could not load settings from {}, using defaults",
                    path.display()
                );
            }
            Self::default()
        }
    }

    fn load_from_file(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => Some(config),
                Err(e) => {
                    warn!("Failed to parse settings file {}: {}", path.display(), e);
                    None
                },
            },
            Err(e) => {
                warn!("Failed to read settings file {}: {}", path.display(), e);
                None
            },
        }
    }

    /// Get the global settings directory.
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "scalelog").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the global settings file path.
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Merge another config into this one; only fields set in `other` win.
    fn merge(&mut self, other: Self) {
        if other.connection.serial.is_some() {
            self.connection.serial = other.connection.serial;
        }
        if other.log.interval.is_some() {
            self.log.interval = other.log.interval;
        }
        if other.log.file.is_some() {
            self.log.file = other.log.file;
        }
    }

    /// Write these settings to `path` as TOML.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!("Saved settings to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.connection.serial.is_none());
        assert!(config.log.interval.is_none());
        assert!(config.log.file.is_none());
    }

    #[test]
    fn test_config_merge_overrides_set_fields() {
        let mut base = Config::default();
        base.connection.serial = Some("/dev/ttyUSB0".to_string());
        base.log.interval = Some("30m".to_string());

        let mut other = Config::default();
        other.log.interval = Some("4s".to_string());
        other.log.file = Some(PathBuf::from("weights.log"));

        base.merge(other);

        assert_eq!(base.connection.serial.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(base.log.interval.as_deref(), Some("4s"));
        assert_eq!(base.log.file.as_deref(), Some(Path::new("weights.log")));
    }

    #[test]
    fn test_config_merge_does_not_overwrite_with_none() {
        let mut base = Config::default();
        base.connection.serial = Some("COM3".to_string());

        base.merge(Config::default());

        assert_eq!(base.connection.serial.as_deref(), Some("COM3"));
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
[connection]
serial = "/dev/ttyUSB0"

[log]
interval = "30m"
file = "weights.log"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.connection.serial.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(config.log.interval.as_deref(), Some("30m"));
        assert_eq!(config.log.file.as_deref(), Some(Path::new("weights.log")));
    }

    #[test]
    fn test_config_from_partial_toml() {
        let config: Config = toml::from_str("[log]\ninterval = \"2h\"\n").unwrap();
        assert!(config.connection.serial.is_none());
        assert_eq!(config.log.interval.as_deref(), Some("2h"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        let mut config = Config::default();
        config.connection.serial = Some("COM3".to_string());
        config.log.interval = Some("15m".to_string());
        config.log.file = Some(PathBuf::from("out.log"));
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from_path(&path), config);
    }

    #[test]
    fn test_load_from_path_invalid_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[connection\nserial = ").unwrap();

        assert_eq!(Config::load_from_path(&path), Config::default());
    }

    #[test]
    fn test_load_from_path_nonexistent() {
        let config = Config::load_from_path(Path::new("/nonexistent/path/config.toml"));
        assert!(config.connection.serial.is_none());
    }

    #[test]
    fn test_global_config_path_names_app() {
        if let Some(p) = Config::global_config_path() {
            let s = p.to_string_lossy();
            assert!(s.contains("scalelog"));
            assert!(s.ends_with("config.toml"));
        }
    }
}
