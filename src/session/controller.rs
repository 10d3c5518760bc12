//! Camera session controller.
//!
//! Owns one camera handle, drives the `loading → ready | error` lifecycle, feeds frames
//! through the single-flight gate to the detector, and wraps captures so that
//! streaming is paused around them.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::camera::{
    CameraDescription, CameraError, CameraHandle, CameraProvider, CapturedImage, DeviceInfo,
    ExposureMode, FlashMode, FocusMode, FrameSink, LensDirection, Point, ResolutionPreset,
};
use crate::detector::{Detector, DetectorError};
use crate::rotation::{image_rotation, DeviceOrientation, Rotation};

use super::gate::FrameGate;
use super::lifecycle::{AppLifecycle, LifecycleHub, LifecycleSubscription};
use super::options::{OsVersionPolicy, SessionOptions};
use super::state::{ErrorKind, FrameStats, SessionError, SessionState, SessionView};

/// Frame type produced by a provider's handles.
pub type FrameOf<P> = <<P as CameraProvider>::Handle as CameraHandle>::Frame;

type ResultCallback<T> = Box<dyn Fn(&T) + Send + Sync>;
type ErrorCallback = Box<dyn Fn(&SessionError) + Send + Sync>;
type DisposeCallback = Box<dyn FnOnce() + Send>;

struct Status<T> {
    state: SessionState,
    last_error: Option<ErrorKind>,
    latest: Option<T>,
}

/// State reachable from the frame sink and detection tasks.
struct Shared<T> {
    status: Mutex<Status<T>>,
    gate: FrameGate,
    disposed: AtomicBool,
    /// Bumped whenever the handle is released; detections started under an older
    /// value are discarded
    generation: AtomicU64,
    processed: AtomicU64,
    dropped: AtomicU64,
    failed: AtomicU64,
    on_result: Option<ResultCallback<T>>,
    on_error: Option<ErrorCallback>,
}

impl<T> Shared<T> {
    fn status(&self) -> MutexGuard<'_, Status<T>> {
        // Callbacks never run under this lock.
        self.status.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Mark disposed. Returns whether it already was.
    fn mark_disposed(&self) -> bool {
        self.disposed.swap(true, Ordering::AcqRel)
    }

    fn state(&self) -> SessionState {
        self.status().state
    }

    fn set_state(&self, state: SessionState) {
        if self.is_disposed() {
            return;
        }
        let mut status = self.status();
        status.state = state;
        if state == SessionState::Loading {
            status.last_error = None;
            status.latest = None;
        }
    }

    /// Record and report an error without changing the lifecycle state.
    fn report(&self, error: &SessionError) {
        if self.is_disposed() {
            return;
        }
        self.status().last_error = Some(error.kind());
        if let Some(on_error) = &self.on_error {
            on_error(error);
        }
    }

    /// Enter the error state and report.
    fn fail(&self, error: &SessionError) {
        if self.is_disposed() {
            return;
        }
        self.status().state = SessionState::Error;
        self.report(error);
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Invalidate every detection started so far.
    fn advance_generation(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    fn accepts_frames(&self, generation: u64) -> bool {
        !self.is_disposed()
            && self.generation() == generation
            && self.state() == SessionState::Ready
    }

    fn complete_detection(&self, generation: u64, outcome: Result<T, DetectorError>) {
        if self.is_disposed() {
            log::debug!("Discarding detection result that arrived after dispose");
            return;
        }
        if self.generation() != generation {
            log::debug!("Discarding detection result from a released camera");
            return;
        }
        match outcome {
            Ok(result) => {
                if let Some(on_result) = &self.on_result {
                    on_result(&result);
                }
                self.status().latest = Some(result);
            }
            Err(e) => {
                log::warn!("Detector failed: {}", e);
                self.failed.fetch_add(1, Ordering::Relaxed);
                self.fail(&SessionError::FrameProcessing(e));
            }
        }
    }
}

/// Builder for [`CameraSession`].
pub struct SessionBuilder<P: CameraProvider, T> {
    provider: P,
    detector: Arc<dyn Detector<FrameOf<P>, T>>,
    options: SessionOptions,
    device_info: Option<Arc<dyn DeviceInfo>>,
    lifecycle: Option<LifecycleSubscription>,
    on_result: Option<ResultCallback<T>>,
    on_error: Option<ErrorCallback>,
    on_dispose: Option<DisposeCallback>,
}

impl<P, T> SessionBuilder<P, T>
where
    P: CameraProvider + 'static,
    T: Send + 'static,
{
    pub fn options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn lens_direction(mut self, lens: LensDirection) -> Self {
        self.options.lens_direction = lens;
        self
    }

    pub fn resolution(mut self, preset: ResolutionPreset) -> Self {
        self.options.resolution = preset;
        self
    }

    pub fn device_orientation(mut self, orientation: DeviceOrientation) -> Self {
        self.options.device_orientation = orientation;
        self
    }

    /// Enable the minimum OS version check with the given device query.
    pub fn device_info(mut self, info: Arc<dyn DeviceInfo>) -> Self {
        self.device_info = Some(info);
        self
    }

    /// Subscribe the session to host lifecycle transitions.
    pub fn lifecycle(mut self, hub: &LifecycleHub) -> Self {
        self.lifecycle = Some(hub.subscribe());
        self
    }

    pub fn on_result(mut self, f: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.on_result = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(&SessionError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    pub fn on_dispose(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_dispose = Some(Box::new(f));
        self
    }

    /// Create the session in the `Loading` state. Call
    /// [`CameraSession::initialize`] to open the camera.
    pub fn build(self) -> CameraSession<P, T> {
        CameraSession {
            provider: self.provider,
            detector: self.detector,
            options: self.options,
            device_info: self.device_info,
            lifecycle: self.lifecycle,
            on_dispose: self.on_dispose,
            handle: None,
            camera: None,
            rotation: Rotation::default(),
            streaming: false,
            recording: false,
            suspended: false,
            reinit_on_resume: false,
            shared: Arc::new(Shared {
                status: Mutex::new(Status {
                    state: SessionState::Loading,
                    last_error: None,
                    latest: None,
                }),
                gate: FrameGate::new(),
                disposed: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                processed: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
                failed: AtomicU64::new(0),
                on_result: self.on_result,
                on_error: self.on_error,
            }),
        }
    }
}

/// One camera, one detector, one lifecycle.
///
/// All operations take `&mut self`, so captures, stream control and lifecycle changes
/// are serialized by the owner. Detection runs on spawned tasks and is limited to one
/// call at a time; frames arriving meanwhile are dropped.
pub struct CameraSession<P: CameraProvider, T> {
    provider: P,
    detector: Arc<dyn Detector<FrameOf<P>, T>>,
    options: SessionOptions,
    device_info: Option<Arc<dyn DeviceInfo>>,
    lifecycle: Option<LifecycleSubscription>,
    on_dispose: Option<DisposeCallback>,
    handle: Option<P::Handle>,
    camera: Option<CameraDescription>,
    rotation: Rotation,
    streaming: bool,
    recording: bool,
    suspended: bool,
    /// Streaming was active, or initialization had failed, when the host suspended us
    reinit_on_resume: bool,
    shared: Arc<Shared<T>>,
}

impl<P: CameraProvider, T> std::fmt::Debug for CameraSession<P, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSession")
            .field("options", &self.options)
            .field("camera", &self.camera)
            .field("state", &self.shared.state())
            .field("streaming", &self.streaming)
            .field("recording", &self.recording)
            .finish_non_exhaustive()
    }
}

impl<P, T> CameraSession<P, T>
where
    P: CameraProvider + 'static,
    T: Send + 'static,
{
    pub fn builder(
        provider: P,
        detector: impl Detector<FrameOf<P>, T> + 'static,
    ) -> SessionBuilder<P, T> {
        SessionBuilder {
            provider,
            detector: Arc::new(detector),
            options: SessionOptions::default(),
            device_info: None,
            lifecycle: None,
            on_result: None,
            on_error: None,
            on_dispose: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    pub fn last_error(&self) -> Option<ErrorKind> {
        self.shared.status().last_error
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.is_disposed()
    }

    /// Rotation handed to the detector with every frame.
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// The camera selected by the last successful initialization.
    pub fn camera(&self) -> Option<&CameraDescription> {
        self.camera.as_ref()
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// The open camera handle, if any.
    pub fn handle(&self) -> Option<&P::Handle> {
        self.handle.as_ref()
    }

    pub fn frame_stats(&self) -> FrameStats {
        FrameStats {
            processed: self.shared.processed.load(Ordering::Relaxed),
            dropped: self.shared.dropped.load(Ordering::Relaxed),
            failed: self.shared.failed.load(Ordering::Relaxed),
        }
    }

    /// Whether a detector call is currently running.
    pub fn is_detecting(&self) -> bool {
        self.shared.gate.is_busy()
    }

    /// Latest detector output.
    pub fn latest_result(&self) -> Option<T>
    where
        T: Clone,
    {
        self.shared.status().latest.clone()
    }

    pub fn view(&self) -> SessionView<T>
    where
        T: Clone,
    {
        let status = self.shared.status();
        match status.state {
            SessionState::Loading => SessionView::Loading,
            SessionState::Error => {
                SessionView::Error(status.last_error.unwrap_or(ErrorKind::Unknown))
            }
            SessionState::Ready => SessionView::Ready {
                rotation: self.rotation,
                streaming: self.streaming,
                latest: status.latest.clone(),
            },
        }
    }

    fn ensure_live(&self) -> Result<(), SessionError> {
        if self.is_disposed() {
            Err(SessionError::Disposed)
        } else {
            Ok(())
        }
    }

    fn handle_mut(&mut self) -> Result<&mut P::Handle, SessionError> {
        self.ensure_live()?;
        self.handle.as_mut().ok_or(SessionError::NotReady)
    }

    /// Open the camera and start streaming.
    ///
    /// Any previously open handle is released first, so this is also the
    /// re-initialization path. On failure the session is left in the error state with
    /// no handle.
    pub async fn initialize(&mut self) -> Result<(), SessionError> {
        self.ensure_live()?;
        self.release_handle().await;
        self.shared.set_state(SessionState::Loading);

        if let Err(e) = self.open_camera().await {
            log::error!("Camera initialization failed: {}", e);
            self.shared.fail(&e);
            return Err(e);
        }

        self.shared.set_state(SessionState::Ready);
        log::info!(
            "Camera ready: {} (rotation {})",
            self.camera
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            self.rotation
        );

        tokio::time::sleep(self.options.stream_start_delay).await;

        if let Err(e) = self.start().await {
            log::error!("Failed to start frame stream: {}", e);
            self.shared.fail(&e);
            return Err(e);
        }
        Ok(())
    }

    async fn open_camera(&mut self) -> Result<(), SessionError> {
        let lens = self.options.lens_direction;
        let cameras = self
            .provider
            .available_cameras()
            .await
            .map_err(SessionError::CannotInitialize)?;
        let camera = cameras
            .into_iter()
            .find(|c| c.lens_direction == lens)
            .ok_or(SessionError::NoCameraAvailable(lens))?;

        self.check_os_version()?;

        let handle = self
            .provider
            .open(&camera, self.options.resolution, false)
            .await
            .map_err(SessionError::CannotInitialize)?;

        self.rotation = image_rotation(
            camera.sensor_orientation,
            self.options.device_orientation,
            camera.lens_direction,
        );
        self.handle = Some(handle);
        self.camera = Some(camera);
        Ok(())
    }

    fn check_os_version(&self) -> Result<(), SessionError> {
        let Some(found) = self.device_info.as_ref().and_then(|d| d.os_version()) else {
            return Ok(());
        };
        let minimum = self.options.min_os_version;
        if found >= minimum {
            return Ok(());
        }

        let error = SessionError::UnsupportedOsVersion { found, minimum };
        match self.options.os_version_policy {
            OsVersionPolicy::Fatal => Err(error),
            OsVersionPolicy::Advisory => {
                log::warn!("{}; continuing initialization", error);
                self.shared.report(&error);
                Ok(())
            }
        }
    }

    /// Build the sink that feeds frames through the gate to the detector.
    fn frame_sink(&self) -> Result<FrameSink<FrameOf<P>>, SessionError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| SessionError::NoRuntime)?;
        let shared = Arc::clone(&self.shared);
        let detector = Arc::clone(&self.detector);
        let rotation = self.rotation;
        let timeout = self.options.detection_timeout;
        let generation = shared.generation();

        Ok(Arc::new(move |frame: FrameOf<P>| {
            if !shared.accepts_frames(generation) {
                shared.dropped.fetch_add(1, Ordering::Relaxed);
                return;
            }
            let Some(permit) = shared.gate.try_acquire() else {
                shared.dropped.fetch_add(1, Ordering::Relaxed);
                log::trace!("Detector busy, dropping frame");
                return;
            };
            shared.processed.fetch_add(1, Ordering::Relaxed);

            let shared = Arc::clone(&shared);
            let detection = detector.detect(frame, rotation);
            runtime.spawn(async move {
                let outcome = match timeout {
                    Some(limit) => tokio::time::timeout(limit, detection)
                        .await
                        .unwrap_or(Err(DetectorError::TimedOut(limit))),
                    None => detection.await,
                };
                shared.complete_detection(generation, outcome);
                drop(permit);
            });
        }))
    }

    /// Start feeding frames to the detector. No-op while already streaming.
    pub async fn start(&mut self) -> Result<(), SessionError> {
        self.ensure_live()?;
        if self.streaming {
            return Ok(());
        }
        if self.recording {
            return Err(SessionError::RecordingInProgress);
        }
        let sink = self.frame_sink()?;
        let handle = self.handle_mut()?;
        handle
            .start_frame_stream(sink)
            .await
            .map_err(SessionError::Stream)?;
        self.streaming = true;
        log::debug!("Frame stream started");
        Ok(())
    }

    /// Stop the frame stream. Tolerates an already stopped stream; errors from the
    /// camera are logged and swallowed.
    pub async fn stop(&mut self) {
        if !self.streaming {
            return;
        }
        self.streaming = false;
        if let Some(handle) = self.handle.as_mut() {
            if let Err(e) = handle.stop_frame_stream().await {
                log::warn!("Failed to stop frame stream: {}", e);
            }
        }
        log::debug!("Frame stream stopped");
    }

    /// Stop when streaming, start when stopped.
    pub async fn toggle(&mut self) -> Result<(), SessionError> {
        if self.streaming {
            self.stop().await;
            Ok(())
        } else {
            self.start().await
        }
    }

    /// Restart streaming after a capture; failures are reported, not returned.
    async fn resume_streaming(&mut self) {
        if let Err(e) = self.start().await {
            log::warn!("Failed to resume frame stream: {}", e);
            self.shared.report(&e);
        }
    }

    fn capture_failed(&self, operation: &'static str, source: CameraError) -> SessionError {
        let error = SessionError::UnsupportedOperation { operation, source };
        log::error!("{}", error);
        self.shared.report(&error);
        error
    }

    /// Capture a still image with the stream paused around it.
    ///
    /// Streaming is resumed whether or not the capture succeeds.
    pub async fn take_picture(&mut self) -> Result<CapturedImage, SessionError> {
        self.handle_mut()?;
        self.stop().await;
        tokio::time::sleep(self.options.settle_delay).await;

        let captured = match self.handle.as_mut() {
            Some(handle) => handle.take_picture().await,
            None => return Err(SessionError::NotReady),
        };

        tokio::time::sleep(self.options.settle_delay).await;
        self.resume_streaming().await;

        captured.map_err(|e| self.capture_failed("take_picture", e))
    }

    /// Stop the frame stream and start recording to `path`.
    pub async fn start_video_recording(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<(), SessionError> {
        self.handle_mut()?;
        self.stop().await;

        let result = match self.handle.as_mut() {
            Some(handle) => handle.start_video_recording(path.as_ref()).await,
            None => return Err(SessionError::NotReady),
        };

        match result {
            Ok(()) => {
                self.recording = true;
                log::info!("Video recording started: {}", path.as_ref().display());
                Ok(())
            }
            Err(e) => {
                let error = self.capture_failed("start_video_recording", e);
                self.resume_streaming().await;
                Err(error)
            }
        }
    }

    /// Finish recording and resume the frame stream.
    pub async fn stop_video_recording(&mut self) -> Result<PathBuf, SessionError> {
        let result = self.handle_mut()?.stop_video_recording().await;
        self.recording = false;
        self.resume_streaming().await;

        match result {
            Ok(path) => {
                log::info!("Video recording saved: {}", path.display());
                Ok(path)
            }
            Err(e) => Err(self.capture_failed("stop_video_recording", e)),
        }
    }

    pub async fn set_flash_mode(&mut self, mode: FlashMode) -> Result<(), SessionError> {
        Ok(self.handle_mut()?.set_flash_mode(mode).await?)
    }

    pub async fn set_focus_mode(&mut self, mode: FocusMode) -> Result<(), SessionError> {
        Ok(self.handle_mut()?.set_focus_mode(mode).await?)
    }

    pub async fn set_focus_point(&mut self, point: Option<Point>) -> Result<(), SessionError> {
        Ok(self.handle_mut()?.set_focus_point(point).await?)
    }

    pub async fn set_zoom_level(&mut self, zoom: f64) -> Result<(), SessionError> {
        Ok(self.handle_mut()?.set_zoom_level(zoom).await?)
    }

    pub async fn set_exposure_mode(&mut self, mode: ExposureMode) -> Result<(), SessionError> {
        Ok(self.handle_mut()?.set_exposure_mode(mode).await?)
    }

    /// Returns the offset the camera actually applied.
    pub async fn set_exposure_offset(&mut self, offset: f64) -> Result<f64, SessionError> {
        Ok(self.handle_mut()?.set_exposure_offset(offset).await?)
    }

    pub async fn set_exposure_point(&mut self, point: Option<Point>) -> Result<(), SessionError> {
        Ok(self.handle_mut()?.set_exposure_point(point).await?)
    }

    /// Change the capture resolution, re-initializing if the camera was set up.
    pub async fn set_resolution(&mut self, preset: ResolutionPreset) -> Result<(), SessionError> {
        self.ensure_live()?;
        if self.options.resolution == preset {
            return Ok(());
        }
        self.options.resolution = preset;

        let initialized = self.handle.is_some() || self.state() == SessionState::Error;
        if initialized && !self.suspended {
            log::info!("Resolution changed to {:?}, re-initializing", preset);
            self.initialize().await
        } else {
            Ok(())
        }
    }

    /// Stop streaming and release the handle, if any. Detections still running for
    /// the released handle no longer reach the session.
    async fn release_handle(&mut self) {
        self.stop().await;
        self.recording = false;
        self.shared.advance_generation();
        if let Some(mut handle) = self.handle.take() {
            if let Err(e) = handle.dispose().await {
                log::warn!("Failed to release camera: {}", e);
            }
        }
    }

    /// Apply a host lifecycle transition.
    ///
    /// Suspending releases the camera and leaves the session `Loading`. Resuming
    /// re-initializes it if it was streaming when suspended, or if the last
    /// initialization had failed. A session suspended while stopped stays `Loading`
    /// until [`initialize`](Self::initialize) is called again.
    pub async fn handle_lifecycle_event(
        &mut self,
        event: AppLifecycle,
    ) -> Result<(), SessionError> {
        if self.is_disposed() {
            return Ok(());
        }

        if event.suspends() {
            let failed = self.state() == SessionState::Error;
            if self.suspended || (self.handle.is_none() && !failed) {
                return Ok(());
            }
            log::info!("Host suspended ({:?}), releasing camera", event);
            self.suspended = true;
            self.reinit_on_resume = self.streaming || failed;
            self.release_handle().await;
            if !failed {
                self.shared.set_state(SessionState::Loading);
            }
        } else if event == AppLifecycle::Resumed && self.suspended {
            self.suspended = false;
            if std::mem::take(&mut self.reinit_on_resume) {
                log::info!("Host resumed, re-initializing camera");
                return self.initialize().await;
            }
        }
        Ok(())
    }

    /// Apply every lifecycle transition published since the last call. Returns how
    /// many were applied.
    pub async fn process_lifecycle_events(&mut self) -> Result<usize, SessionError> {
        let mut applied = 0;
        while let Some(event) = self.lifecycle.as_mut().and_then(|s| s.try_next()) {
            self.handle_lifecycle_event(event).await?;
            applied += 1;
        }
        Ok(applied)
    }

    /// Stop streaming, release the camera and notify the dispose hook.
    ///
    /// Idempotent. Detections still in flight complete without touching the session.
    pub async fn dispose(&mut self) {
        if self.shared.mark_disposed() {
            return;
        }
        self.lifecycle = None;
        self.release_handle().await;
        self.camera = None;
        if let Some(on_dispose) = self.on_dispose.take() {
            on_dispose();
        }
        log::info!("Camera session disposed");
    }
}

impl<P: CameraProvider, T> Drop for CameraSession<P, T> {
    fn drop(&mut self) {
        if !self.shared.mark_disposed() {
            if let Some(on_dispose) = self.on_dispose.take() {
                on_dispose();
            }
        }
    }
}
