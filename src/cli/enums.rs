//! CLI enum types for lens, resolution and orientation options.

use clap::ValueEnum;

use crate::camera::{LensDirection, ResolutionPreset};
use crate::rotation::DeviceOrientation;

/// Camera lens selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Lens {
    Front,
    #[default]
    Back,
    External,
}

impl From<Lens> for LensDirection {
    fn from(l: Lens) -> Self {
        match l {
            Lens::Front => LensDirection::Front,
            Lens::Back => LensDirection::Back,
            Lens::External => LensDirection::External,
        }
    }
}

/// Capture resolution preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Quality {
    #[default]
    Low,
    Medium,
    High,
    VeryHigh,
    UltraHigh,
    Max,
}

impl From<Quality> for ResolutionPreset {
    fn from(q: Quality) -> Self {
        match q {
            Quality::Low => ResolutionPreset::Low,
            Quality::Medium => ResolutionPreset::Medium,
            Quality::High => ResolutionPreset::High,
            Quality::VeryHigh => ResolutionPreset::VeryHigh,
            Quality::UltraHigh => ResolutionPreset::UltraHigh,
            Quality::Max => ResolutionPreset::Max,
        }
    }
}

/// How the device is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Orientation {
    #[default]
    PortraitUp,
    LandscapeLeft,
    PortraitDown,
    LandscapeRight,
}

impl From<Orientation> for DeviceOrientation {
    fn from(o: Orientation) -> Self {
        match o {
            Orientation::PortraitUp => DeviceOrientation::PortraitUp,
            Orientation::LandscapeLeft => DeviceOrientation::LandscapeLeft,
            Orientation::PortraitDown => DeviceOrientation::PortraitDown,
            Orientation::LandscapeRight => DeviceOrientation::LandscapeRight,
        }
    }
}
