// SPDX-License-Identifier: GPL-3.0-only

use crate::backends::camera::{CaptureConstraints, Facing};
use crate::constants::{app, decoding, timing};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Persistent settings, stored as JSON in the user's config directory
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera device path to open instead of choosing by facing
    pub camera_path: Option<String>,
    /// Preferred camera facing (back, front, any)
    pub facing: Facing,
    /// Display refresh rate driving the scan loop (Hz)
    pub refresh_rate_hz: u32,
    /// Longest side, in pixels, a frame is downscaled to before decoding
    pub max_decode_dimension: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera_path: None,
            facing: Facing::Back,
            refresh_rate_hz: timing::DEFAULT_REFRESH_RATE_HZ,
            max_decode_dimension: decoding::DEFAULT_MAX_DIMENSION,
        }
    }
}

/// Config file errors
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Config I/O error: {}", e),
            ConfigError::Parse(e) => write!(f, "Invalid config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}

impl Config {
    /// Default config file location
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(app::DIR_NAME).join(app::CONFIG_FILE))
    }

    /// Load from the default location
    ///
    /// Never fails: a missing file gives defaults, an unreadable or malformed
    /// one is logged and also gives defaults.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            debug!("No config directory, using defaults");
            return Self::default();
        };

        match Self::load_from(&path) {
            Ok(Some(config)) => {
                info!(path = %path.display(), "Loaded config");
                config
            }
            Ok(None) => {
                debug!(path = %path.display(), "No config file, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring config file");
                Self::default()
            }
        }
    }

    /// Load from `path`. `Ok(None)` when the file does not exist.
    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }

    /// Write to the default location
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::config_path().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "no config directory")
        })?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Write to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        debug!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Period between scan ticks, with the rate clamped to a sane range
    pub fn refresh_period(&self) -> Duration {
        timing::refresh_period(self.refresh_rate_hz)
    }

    /// Constraints passed to the capture device
    pub fn capture_constraints(&self) -> CaptureConstraints {
        CaptureConstraints {
            facing: self.facing,
            device_path: self.camera_path.clone().filter(|p| !p.is_empty()),
        }
    }
}
