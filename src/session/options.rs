//! Tunables for a camera session.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::camera::{LensDirection, ResolutionPreset};
use crate::rotation::DeviceOrientation;

/// Grace period between opening the camera and starting the frame stream. Starting
/// the stream immediately after open leaves a corrupted first preview on some devices.
pub const DEFAULT_STREAM_START_DELAY: Duration = Duration::from_millis(200);

/// Pause before and after a still capture.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(200);

/// Lowest OS version (platform API level) with a usable camera stack.
pub const DEFAULT_MIN_OS_VERSION: u32 = 21;

/// What to do when the device OS is older than the minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsVersionPolicy {
    /// Report `UnsupportedOsVersion` through the error callback and keep initializing
    #[default]
    Advisory,
    /// Abort initialization in the error state
    Fatal,
}

/// Session construction parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    pub lens_direction: LensDirection,
    pub resolution: ResolutionPreset,
    /// Device orientation used to compute the frame rotation at initialization
    pub device_orientation: DeviceOrientation,
    pub stream_start_delay: Duration,
    pub settle_delay: Duration,
    /// Upper bound on one detector call; `None` waits forever
    pub detection_timeout: Option<Duration>,
    pub min_os_version: u32,
    pub os_version_policy: OsVersionPolicy,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            lens_direction: LensDirection::Back,
            resolution: ResolutionPreset::Low,
            device_orientation: DeviceOrientation::PortraitUp,
            stream_start_delay: DEFAULT_STREAM_START_DELAY,
            settle_delay: DEFAULT_SETTLE_DELAY,
            detection_timeout: None,
            min_os_version: DEFAULT_MIN_OS_VERSION,
            os_version_policy: OsVersionPolicy::Advisory,
        }
    }
}

impl SessionOptions {
    /// Options with every fixed delay set to zero, for tests and batch tools.
    pub fn immediate() -> Self {
        Self {
            stream_start_delay: Duration::ZERO,
            settle_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}
