//! Camera interfaces and the synthetic camera backend.
//!
//! - Provider/handle interfaces via [`CameraProvider`] and [`CameraHandle`]
//! - Value types such as [`LensDirection`], [`ResolutionPreset`] and [`Frame`]
//! - A hardware-free backend via [`SyntheticCamera`]

mod capture_loop;
mod frame_utils;
mod provider;
mod synthetic;
mod types;

pub use frame_utils::{mirror_horizontal, pattern_square, test_pattern, PATTERN_BACKGROUND};
pub use provider::{CameraHandle, CameraProvider, DeviceInfo, FixedOsVersion, FrameSink};
pub use synthetic::{SyntheticCamera, SyntheticControls, SyntheticHandle, DEFAULT_FPS, MAX_ZOOM};
pub use types::{
    CameraDescription, CameraError, CapturedImage, ExposureMode, FlashMode, FocusMode, Frame,
    FrameFormat, LensDirection, Point, Resolution, ResolutionPreset,
};
