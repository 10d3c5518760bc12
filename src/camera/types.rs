//! Camera types and data structures.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Which way a camera faces relative to the device screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LensDirection {
    /// Selfie camera, same side as the screen
    Front,
    /// Main camera, opposite the screen
    #[default]
    Back,
    /// USB or otherwise detachable camera
    External,
}

impl fmt::Display for LensDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LensDirection::Front => write!(f, "front"),
            LensDirection::Back => write!(f, "back"),
            LensDirection::External => write!(f, "external"),
        }
    }
}

/// Camera resolution in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// Coarse quality tier for the capture pipeline.
///
/// The provider picks the closest format it supports; the dimensions returned by
/// [`ResolutionPreset::nominal`] are what a provider should aim for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPreset {
    /// 320x240 - fast, enough for most detectors
    #[default]
    Low,
    /// 640x480
    Medium,
    /// 1280x720
    High,
    /// 1920x1080
    VeryHigh,
    /// 3840x2160
    UltraHigh,
    /// Whatever the sensor can do
    Max,
}

impl ResolutionPreset {
    /// Nominal dimensions for the preset. `Max` reports the UHD size as a lower bound.
    pub fn nominal(self) -> Resolution {
        let (width, height) = match self {
            ResolutionPreset::Low => (320, 240),
            ResolutionPreset::Medium => (640, 480),
            ResolutionPreset::High => (1280, 720),
            ResolutionPreset::VeryHigh => (1920, 1080),
            ResolutionPreset::UltraHigh | ResolutionPreset::Max => (3840, 2160),
        };
        Resolution { width, height }
    }
}

/// Information about an available camera device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDescription {
    /// Provider-specific identifier used to open the camera
    pub name: String,
    /// Which way the lens faces
    pub lens_direction: LensDirection,
    /// Clockwise angle (0, 90, 180, 270) the sensor image must be rotated to be upright
    /// in the device's natural orientation
    pub sensor_orientation: u32,
}

impl fmt::Display for CameraDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, sensor {}°)",
            self.name, self.lens_direction, self.sensor_orientation
        )
    }
}

/// Pixel format of a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    /// RGB format (3 bytes per pixel)
    Rgb,
    /// 8-bit luminance only
    Gray,
}

/// A captured camera frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw pixel data
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Pixel format
    pub format: FrameFormat,
    /// Timestamp when frame was captured
    pub timestamp: Instant,
}

impl Frame {
    /// Number of bytes per pixel for the frame's format.
    pub fn bytes_per_pixel(&self) -> usize {
        match self.format {
            FrameFormat::Rgb => 3,
            FrameFormat::Gray => 1,
        }
    }

    /// Luminance of the pixel at `(x, y)`, or `None` outside the frame.
    pub fn luma(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.bytes_per_pixel();
        let offset = (y as usize * self.width as usize + x as usize) * bpp;
        let px = self.data.get(offset..offset + bpp)?;
        Some(match self.format {
            FrameFormat::Gray => px[0],
            // Rec. 601 integer approximation
            FrameFormat::Rgb => {
                ((px[0] as u32 * 299 + px[1] as u32 * 587 + px[2] as u32 * 114) / 1000) as u8
            }
        })
    }
}

/// A still image returned by a picture capture.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    /// Encoded or raw image bytes, as produced by the camera handle
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub captured_at: Instant,
}

/// Flash behavior for captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashMode {
    #[default]
    Off,
    Auto,
    Always,
    Torch,
}

/// Focus behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusMode {
    #[default]
    Auto,
    Locked,
}

/// Exposure behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExposureMode {
    #[default]
    Auto,
    Locked,
}

/// A point in normalized preview coordinates, `(0, 0)` top-left to `(1, 1)` bottom-right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Errors reported by camera providers and handles.
#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    /// Failed to query camera devices
    #[error("Failed to query cameras: {0}")]
    QueryFailed(String),

    /// Failed to open camera
    #[error("Failed to open camera: {0}")]
    OpenFailed(String),

    /// Camera permission denied
    #[error("Camera permission denied")]
    PermissionDenied,

    /// Failed to start or stop the frame stream
    #[error("Camera stream error: {0}")]
    StreamFailed(String),

    /// The frame stream is already running
    #[error("Frame stream is already running")]
    AlreadyStreaming,

    /// Still capture failed
    #[error("Failed to capture picture: {0}")]
    CaptureFailed(String),

    /// Starting or stopping a recording failed
    #[error("Video recording error: {0}")]
    RecordingFailed(String),

    /// Stop requested with no recording in progress
    #[error("No video recording in progress")]
    NotRecording,

    /// The handle does not support the requested setting or operation
    #[error("Unsupported camera operation: {0}")]
    Unsupported(String),

    /// The handle has already been disposed
    #[error("Camera handle has been disposed")]
    Disposed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
