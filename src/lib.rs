//! vision-cam library crate.
//!
//! A camera session that streams frames to a pluggable detector through a
//! single-flight gate, with lifecycle, capture and device-setting control.

pub mod camera;
pub mod cli;
pub mod config;
pub mod detector;
pub mod rotation;
pub mod session;

pub use camera::{CameraHandle, CameraProvider, LensDirection, ResolutionPreset};
pub use detector::{Detector, DetectorError};
pub use rotation::Rotation;
pub use session::{CameraSession, ErrorKind, SessionError, SessionOptions, SessionState};
