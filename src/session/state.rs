//! Session lifecycle states and error classification.

use std::fmt;

use crate::camera::{CameraError, LensDirection};
use crate::detector::DetectorError;
use crate::rotation::Rotation;

/// Lifecycle state of a camera session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Initializing, or not initialized yet
    #[default]
    Loading,
    /// Camera open; frames flow to the detector while streaming
    Ready,
    /// Terminal until the session is re-initialized
    Error,
}

/// Coarse classification of everything that can go wrong in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unknown,
    CannotInitialize,
    UnsupportedOsVersion,
    NoCameraAvailable,
    UnsupportedOperation,
    FrameProcessingFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Unknown => "unknown",
            ErrorKind::CannotInitialize => "cannot-initialize",
            ErrorKind::UnsupportedOsVersion => "unsupported-os-version",
            ErrorKind::NoCameraAvailable => "no-camera-available",
            ErrorKind::UnsupportedOperation => "unsupported-operation",
            ErrorKind::FrameProcessingFailure => "frame-processing-failure",
        };
        f.write_str(name)
    }
}

/// Errors returned by [`CameraSession`](super::CameraSession) operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("No {0} camera available")]
    NoCameraAvailable(LensDirection),

    #[error("OS version {found} is below the required minimum {minimum}")]
    UnsupportedOsVersion { found: u32, minimum: u32 },

    #[error("Cannot initialize camera: {0}")]
    CannotInitialize(#[source] CameraError),

    #[error("Unsupported operation {operation}: {source}")]
    UnsupportedOperation {
        operation: &'static str,
        #[source]
        source: CameraError,
    },

    #[error("Frame processing failed: {0}")]
    FrameProcessing(#[from] DetectorError),

    #[error("Cannot stream while a video recording is in progress")]
    RecordingInProgress,

    #[error("Failed to start frame stream: {0}")]
    Stream(#[source] CameraError),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("No tokio runtime available to process frames")]
    NoRuntime,

    #[error("Camera is not initialized")]
    NotReady,

    #[error("Session has been disposed")]
    Disposed,
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::NoCameraAvailable(_) => ErrorKind::NoCameraAvailable,
            SessionError::UnsupportedOsVersion { .. } => ErrorKind::UnsupportedOsVersion,
            SessionError::CannotInitialize(_) | SessionError::Stream(_) => {
                ErrorKind::CannotInitialize
            }
            SessionError::UnsupportedOperation { .. } | SessionError::RecordingInProgress => {
                ErrorKind::UnsupportedOperation
            }
            SessionError::FrameProcessing(_) => ErrorKind::FrameProcessingFailure,
            SessionError::Camera(_)
            | SessionError::NoRuntime
            | SessionError::NotReady
            | SessionError::Disposed => ErrorKind::Unknown,
        }
    }
}

/// What a hosting UI should draw for the session right now.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionView<T> {
    Loading,
    Error(ErrorKind),
    Ready {
        rotation: Rotation,
        streaming: bool,
        /// Latest detector output, the input for an overlay
        latest: Option<T>,
    },
}

/// Frame gate counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Frames handed to the detector
    pub processed: u64,
    /// Frames discarded because a detection was in flight or the session was not ready
    pub dropped: u64,
    /// Detections that failed or timed out
    pub failed: u64,
}
