//! Configuration file handling for vision-cam.
//!
//! Loads configuration from `<config dir>/vision-cam/config.toml` or a custom path.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::camera::{LensDirection, ResolutionPreset, DEFAULT_FPS};
use crate::rotation::DeviceOrientation;
use crate::session::{
    OsVersionPolicy, SessionOptions, DEFAULT_MIN_OS_VERSION, DEFAULT_SETTLE_DELAY,
    DEFAULT_STREAM_START_DELAY,
};

/// Configuration file structure.
#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    pub lens: LensDirection,
    pub resolution: ResolutionPreset,
    pub orientation: DeviceOrientation,
    /// Frame rate of the synthetic camera
    pub fps: u32,
    /// Mirror front camera frames
    pub mirror: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            lens: LensDirection::Back,
            resolution: ResolutionPreset::Low,
            orientation: DeviceOrientation::PortraitUp,
            fps: DEFAULT_FPS,
            mirror: true,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    pub stream_start_delay_ms: u64,
    pub settle_delay_ms: u64,
    pub detection_timeout_ms: Option<u64>,
    pub min_os_version: u32,
    pub os_version_policy: OsVersionPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            stream_start_delay_ms: DEFAULT_STREAM_START_DELAY.as_millis() as u64,
            settle_delay_ms: DEFAULT_SETTLE_DELAY.as_millis() as u64,
            detection_timeout_ms: None,
            min_os_version: DEFAULT_MIN_OS_VERSION,
            os_version_policy: OsVersionPolicy::Advisory,
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = resolve_path(path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;
            Self::parse(&content).map_err(|e| ConfigError::Parse { path, source: e })
        } else {
            log::debug!("No config at {}, using defaults", path.display());
            Ok(Config::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Session options described by this configuration.
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            lens_direction: self.camera.lens,
            resolution: self.camera.resolution,
            device_orientation: self.camera.orientation,
            stream_start_delay: Duration::from_millis(self.session.stream_start_delay_ms),
            settle_delay: Duration::from_millis(self.session.settle_delay_ms),
            detection_timeout: self.session.detection_timeout_ms.map(Duration::from_millis),
            min_os_version: self.session.min_os_version,
            os_version_policy: self.session.os_version_policy,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// The file to use: `explicit` when given, otherwise the default location.
pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
    explicit.map(PathBuf::from).unwrap_or_else(default_path)
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("vision-cam").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/vision-cam/config.toml")
        })
}
