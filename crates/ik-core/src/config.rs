//! Translator configuration
//!
//! Stored as TOML under the platform configuration directory, e.g.
//! `~/.config/st-ikbd/config.toml` on Linux.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// HID usage of the key that flips mouse mode on and off (Print Screen)
pub const DEFAULT_MOUSE_TOGGLE_KEY: u8 = 0x46;

/// Boot protocol mouse report length: buttons, x, y, wheel
pub const DEFAULT_MOUSE_REPORT_LEN: usize = 4;

/// Log verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

/// Input translation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Whether mouse emulation starts enabled
    pub mouse_enabled: bool,
    /// HID usage that toggles mouse emulation, 0 disables the hotkey
    pub mouse_toggle_key: u8,
    /// Report buffer length allocated for mice
    pub mouse_report_len: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            mouse_enabled: true,
            mouse_toggle_key: DEFAULT_MOUSE_TOGGLE_KEY,
            mouse_report_len: DEFAULT_MOUSE_REPORT_LEN,
        }
    }
}

/// Debug and logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub log_level: LogLevel,
    pub log_to_file: bool,
    pub log_path: PathBuf,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_to_file: false,
            log_path: PathBuf::from("st-ikbd.log"),
        }
    }
}

/// Top level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub debug: DebugConfig,
}

impl Config {
    /// Location of the configuration file
    pub fn path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join("st-ikbd").join("config.toml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load the configuration file, falling back to defaults if it does not exist
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(&path)?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Write the configuration file, creating its directory if needed
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}
