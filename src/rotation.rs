//! Sensor-to-display orientation bookkeeping.
//!
//! Camera sensors are mounted at a fixed angle relative to the device's natural
//! orientation. Detectors want upright images, so every frame is handed over together
//! with the clockwise [`Rotation`] that makes it upright.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::camera::LensDirection;

/// Clockwise rotation needed to make a frame upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
    #[default]
    Rotation0,
    Rotation90,
    Rotation180,
    Rotation270,
}

impl Rotation {
    /// Snap an angle in degrees to the nearest quarter turn.
    ///
    /// Negative and over-range angles wrap around.
    pub fn from_degrees(degrees: i32) -> Self {
        let normalized = degrees.rem_euclid(360);
        match ((normalized + 45) / 90) % 4 {
            0 => Rotation::Rotation0,
            1 => Rotation::Rotation90,
            2 => Rotation::Rotation180,
            _ => Rotation::Rotation270,
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Rotation::Rotation0 => 0,
            Rotation::Rotation90 => 90,
            Rotation::Rotation180 => 180,
            Rotation::Rotation270 => 270,
        }
    }

    /// Whether width and height swap after applying this rotation.
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Rotation::Rotation90 | Rotation::Rotation270)
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// How the user is holding the device, relative to its natural (portrait) orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceOrientation {
    #[default]
    PortraitUp,
    LandscapeLeft,
    PortraitDown,
    LandscapeRight,
}

impl DeviceOrientation {
    pub fn degrees(self) -> i32 {
        match self {
            DeviceOrientation::PortraitUp => 0,
            DeviceOrientation::LandscapeLeft => 90,
            DeviceOrientation::PortraitDown => 180,
            DeviceOrientation::LandscapeRight => 270,
        }
    }
}

/// Rotation to hand to detectors for frames from a camera with the given sensor
/// orientation, while the device is held in `device`.
///
/// Front lenses see the world mirrored, so device rotation adds to the sensor angle;
/// for back and external lenses it subtracts.
pub fn image_rotation(
    sensor_orientation: u32,
    device: DeviceOrientation,
    lens: LensDirection,
) -> Rotation {
    let sensor = (sensor_orientation % 360) as i32;
    let compensated = match lens {
        LensDirection::Front => sensor + device.degrees(),
        LensDirection::Back | LensDirection::External => sensor - device.degrees(),
    };
    Rotation::from_degrees(compensated)
}
