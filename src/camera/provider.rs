//! Interfaces a platform camera backend implements.
//!
//! The session never touches hardware itself. A [`CameraProvider`] enumerates and opens
//! cameras, and the [`CameraHandle`] it returns does the streaming, capture and settings
//! work. Frames are pushed into a [`FrameSink`], possibly from a backend capture thread.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::types::{
    CameraDescription, CameraError, CapturedImage, ExposureMode, FlashMode, FocusMode, Point,
    ResolutionPreset,
};

/// Callback receiving every frame the camera produces while streaming.
pub type FrameSink<F> = Arc<dyn Fn(F) + Send + Sync>;

/// Enumerates and opens cameras.
///
/// Every returned future is `Send`, so a session can be driven from a spawned task.
/// Implementations may still write plain `async fn`s as long as they hold nothing
/// `!Send` across an await.
pub trait CameraProvider: Send + Sync {
    type Handle: CameraHandle;

    /// List the cameras currently attached to the device.
    fn available_cameras(
        &self,
    ) -> impl Future<Output = Result<Vec<CameraDescription>, CameraError>> + Send;

    /// Open `camera` at the given resolution tier.
    fn open(
        &self,
        camera: &CameraDescription,
        preset: ResolutionPreset,
        enable_audio: bool,
    ) -> impl Future<Output = Result<Self::Handle, CameraError>> + Send;
}

/// An open camera.
pub trait CameraHandle: Send {
    /// Frame type delivered to the sink and handed to detectors.
    type Frame: Send + 'static;

    /// Begin delivering frames to `sink`.
    fn start_frame_stream(
        &mut self,
        sink: FrameSink<Self::Frame>,
    ) -> impl Future<Output = Result<(), CameraError>> + Send;

    /// Stop delivering frames. Must be safe to call when no stream is running.
    fn stop_frame_stream(&mut self) -> impl Future<Output = Result<(), CameraError>> + Send;

    fn take_picture(&mut self) -> impl Future<Output = Result<CapturedImage, CameraError>> + Send;

    fn start_video_recording(
        &mut self,
        path: &Path,
    ) -> impl Future<Output = Result<(), CameraError>> + Send;

    /// Finish the current recording and return the file it was written to.
    fn stop_video_recording(&mut self)
        -> impl Future<Output = Result<PathBuf, CameraError>> + Send;

    fn set_flash_mode(
        &mut self,
        mode: FlashMode,
    ) -> impl Future<Output = Result<(), CameraError>> + Send;

    fn set_focus_mode(
        &mut self,
        mode: FocusMode,
    ) -> impl Future<Output = Result<(), CameraError>> + Send;

    /// `None` resets to the default focus point.
    fn set_focus_point(
        &mut self,
        point: Option<Point>,
    ) -> impl Future<Output = Result<(), CameraError>> + Send;

    fn set_zoom_level(&mut self, zoom: f64) -> impl Future<Output = Result<(), CameraError>> + Send;

    fn set_exposure_mode(
        &mut self,
        mode: ExposureMode,
    ) -> impl Future<Output = Result<(), CameraError>> + Send;

    /// Returns the offset actually applied by the camera.
    fn set_exposure_offset(
        &mut self,
        offset: f64,
    ) -> impl Future<Output = Result<f64, CameraError>> + Send;

    /// `None` resets to the default metering point.
    fn set_exposure_point(
        &mut self,
        point: Option<Point>,
    ) -> impl Future<Output = Result<(), CameraError>> + Send;

    /// Release the camera. The handle is not used again afterwards.
    fn dispose(&mut self) -> impl Future<Output = Result<(), CameraError>> + Send;
}

/// Device capability query, only meaningful on platforms with a minimum OS requirement.
pub trait DeviceInfo: Send + Sync {
    /// Platform OS version (API level on platforms that have one), or `None` when the
    /// platform does not report one.
    fn os_version(&self) -> Option<u32>;
}

/// A [`DeviceInfo`] reporting a fixed version.
#[derive(Debug, Clone, Copy)]
pub struct FixedOsVersion(pub u32);

impl DeviceInfo for FixedOsVersion {
    fn os_version(&self) -> Option<u32> {
        Some(self.0)
    }
}
