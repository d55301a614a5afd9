//! Settings file handling

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::hash::digest::{HashAlgorithm, DEFAULT_BUFFER_SIZE};
use crate::hash::error::{HashCalcError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub hashing: HashingSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HashingSettings {
    #[serde(default)]
    pub algorithm: HashAlgorithm,
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

impl Default for HashingSettings {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            buffer_size: default_buffer_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MatchingSettings {
    #[serde(default)]
    pub match_full_path: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Settings {
    /// Load settings from a file, or return defaults if file doesn't exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| HashCalcError::from_io_error(e, "reading settings", Some(path.to_path_buf())))?;

        Self::parse(&contents).map_err(|reason| HashCalcError::Config {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Parse settings from TOML text
    pub fn parse(contents: &str) -> std::result::Result<Self, String> {
        let settings: Settings = toml::from_str(contents).map_err(|e| e.to_string())?;
        if settings.hashing.buffer_size == 0 {
            return Err("hashing.buffer_size must be greater than zero".to_string());
        }
        Ok(settings)
    }

    /// Default settings file location
    pub fn default_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hashcalc");

        config_dir.join("settings.toml")
    }
}
