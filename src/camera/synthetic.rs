//! In-process camera producing generated frames.
//!
//! [`SyntheticCamera`] behaves like a real provider: it lists cameras with lens
//! directions and sensor orientations, opens handles that stream on a background
//! thread, captures stills, and records raw RGB video to disk. It backs the demo binary
//! and lets the session be exercised without hardware.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use super::capture_loop::{run_capture_loop, LoopSettings};
use super::frame_utils::test_pattern;
use super::provider::{CameraHandle, CameraProvider, FrameSink};
use super::types::{
    CameraDescription, CameraError, CapturedImage, ExposureMode, FlashMode, FocusMode, Frame,
    LensDirection, Point, ResolutionPreset,
};

/// Default frame rate of synthetic cameras.
pub const DEFAULT_FPS: u32 = 30;

/// Highest zoom level a synthetic handle accepts.
pub const MAX_ZOOM: f64 = 8.0;

/// Exposure offset range in EV.
pub const EXPOSURE_OFFSET_RANGE: (f64, f64) = (-2.0, 2.0);

/// Provider of generated-frame cameras.
#[derive(Debug, Clone)]
pub struct SyntheticCamera {
    cameras: Vec<CameraDescription>,
    fps: u32,
    mirror_front: bool,
}

impl Default for SyntheticCamera {
    /// One back camera (sensor at 90°) and one front camera (sensor at 270°), the usual
    /// phone layout.
    fn default() -> Self {
        Self::with_cameras(vec![
            CameraDescription {
                name: "synthetic-back".to_string(),
                lens_direction: LensDirection::Back,
                sensor_orientation: 90,
            },
            CameraDescription {
                name: "synthetic-front".to_string(),
                lens_direction: LensDirection::Front,
                sensor_orientation: 270,
            },
        ])
    }
}

impl SyntheticCamera {
    pub fn with_cameras(cameras: Vec<CameraDescription>) -> Self {
        Self {
            cameras,
            fps: DEFAULT_FPS,
            mirror_front: true,
        }
    }

    /// Set the frame rate of handles opened afterwards.
    pub fn fps(mut self, fps: u32) -> Self {
        self.fps = fps.max(1);
        self
    }

    /// Whether front-camera frames are mirrored (selfie view).
    pub fn mirror_front(mut self, mirror: bool) -> Self {
        self.mirror_front = mirror;
        self
    }

    pub fn cameras(&self) -> &[CameraDescription] {
        &self.cameras
    }
}

impl CameraProvider for SyntheticCamera {
    type Handle = SyntheticHandle;

    async fn available_cameras(&self) -> Result<Vec<CameraDescription>, CameraError> {
        Ok(self.cameras.clone())
    }

    async fn open(
        &self,
        camera: &CameraDescription,
        preset: ResolutionPreset,
        enable_audio: bool,
    ) -> Result<Self::Handle, CameraError> {
        if !self.cameras.iter().any(|c| c.name == camera.name) {
            return Err(CameraError::OpenFailed(format!(
                "no camera named '{}'",
                camera.name
            )));
        }

        log::info!(
            "Opening synthetic camera {} at {:?} (audio: {})",
            camera,
            preset,
            enable_audio
        );

        let settings = LoopSettings {
            resolution: preset.nominal(),
            frame_interval: Duration::from_secs(1) / self.fps,
            mirror: self.mirror_front && camera.lens_direction == LensDirection::Front,
        };
        Ok(SyntheticHandle::new(settings))
    }
}

/// Current device settings of a synthetic handle.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticControls {
    pub flash_mode: FlashMode,
    pub focus_mode: FocusMode,
    pub focus_point: Option<Point>,
    pub zoom_level: f64,
    pub exposure_mode: ExposureMode,
    pub exposure_offset: f64,
    pub exposure_point: Option<Point>,
}

impl Default for SyntheticControls {
    fn default() -> Self {
        Self {
            flash_mode: FlashMode::Off,
            focus_mode: FocusMode::Auto,
            focus_point: None,
            zoom_level: 1.0,
            exposure_mode: ExposureMode::Auto,
            exposure_offset: 0.0,
            exposure_point: None,
        }
    }
}

/// A running capture thread plus its stop signal.
struct Worker {
    thread: JoinHandle<()>,
    stop: Arc<AtomicBool>,
}

impl Worker {
    fn spawn(settings: LoopSettings, sink: FrameSink<Frame>, counter: Arc<AtomicU64>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let thread = std::thread::spawn(move || {
            run_capture_loop(settings, sink, thread_stop, counter);
        });
        Self { thread, stop }
    }

    fn signal(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Stop the thread and wait for it on the blocking pool.
    async fn shutdown(self) {
        self.signal();
        let thread = self.thread;
        match tokio::task::spawn_blocking(move || thread.join()).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => log::warn!("Capture thread panicked"),
            Err(e) => log::warn!("Failed to join capture thread: {}", e),
        }
    }
}

/// An active recording: the capture thread writing to `path`.
struct Recording {
    worker: Worker,
    path: PathBuf,
    writer: Arc<Mutex<BufWriter<File>>>,
    write_error: Arc<Mutex<Option<std::io::Error>>>,
}

/// Open synthetic camera.
pub struct SyntheticHandle {
    settings: LoopSettings,
    frame_counter: Arc<AtomicU64>,
    stream: Option<Worker>,
    recording: Option<Recording>,
    controls: SyntheticControls,
    disposed: bool,
}

impl std::fmt::Debug for SyntheticHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntheticHandle")
            .field("settings", &self.settings)
            .field("is_streaming", &self.is_streaming())
            .field("is_recording", &self.is_recording())
            .finish_non_exhaustive()
    }
}

impl SyntheticHandle {
    fn new(settings: LoopSettings) -> Self {
        Self {
            settings,
            frame_counter: Arc::new(AtomicU64::new(0)),
            stream: None,
            recording: None,
            controls: SyntheticControls::default(),
            disposed: false,
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.stream
            .as_ref()
            .is_some_and(|w| !w.thread.is_finished())
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    pub fn controls(&self) -> &SyntheticControls {
        &self.controls
    }

    /// Number of frames generated so far, across streams, recordings and stills.
    pub fn frames_generated(&self) -> u64 {
        self.frame_counter.load(Ordering::Relaxed)
    }

    fn ensure_open(&self) -> Result<(), CameraError> {
        if self.disposed {
            Err(CameraError::Disposed)
        } else {
            Ok(())
        }
    }

    async fn finish_recording(&mut self) -> Result<PathBuf, CameraError> {
        let recording = self.recording.take().ok_or(CameraError::NotRecording)?;
        recording.worker.shutdown().await;

        if let Some(e) = recording
            .write_error
            .lock()
            .map_err(|_| CameraError::RecordingFailed("writer lock poisoned".to_string()))?
            .take()
        {
            return Err(CameraError::RecordingFailed(e.to_string()));
        }

        recording
            .writer
            .lock()
            .map_err(|_| CameraError::RecordingFailed("writer lock poisoned".to_string()))?
            .flush()?;

        Ok(recording.path)
    }
}

impl CameraHandle for SyntheticHandle {
    type Frame = Frame;

    async fn start_frame_stream(&mut self, sink: FrameSink<Frame>) -> Result<(), CameraError> {
        self.ensure_open()?;
        if self.is_streaming() {
            return Err(CameraError::AlreadyStreaming);
        }
        if self.is_recording() {
            return Err(CameraError::StreamFailed(
                "cannot stream while recording".to_string(),
            ));
        }
        self.stream = Some(Worker::spawn(
            self.settings,
            sink,
            Arc::clone(&self.frame_counter),
        ));
        Ok(())
    }

    async fn stop_frame_stream(&mut self) -> Result<(), CameraError> {
        if let Some(worker) = self.stream.take() {
            worker.shutdown().await;
        }
        Ok(())
    }

    async fn take_picture(&mut self) -> Result<CapturedImage, CameraError> {
        self.ensure_open()?;
        if self.is_recording() {
            return Err(CameraError::CaptureFailed(
                "cannot take a picture while recording".to_string(),
            ));
        }
        let index = self.frame_counter.fetch_add(1, Ordering::Relaxed);
        let frame = test_pattern(self.settings.resolution, index);
        Ok(CapturedImage {
            data: frame.data,
            width: frame.width,
            height: frame.height,
            captured_at: Instant::now(),
        })
    }

    async fn start_video_recording(&mut self, path: &Path) -> Result<(), CameraError> {
        self.ensure_open()?;
        if self.is_recording() {
            return Err(CameraError::RecordingFailed(
                "a recording is already in progress".to_string(),
            ));
        }
        if self.is_streaming() {
            return Err(CameraError::RecordingFailed(
                "stop the frame stream before recording".to_string(),
            ));
        }

        let file = File::create(path)
            .map_err(|e| CameraError::RecordingFailed(format!("{}: {}", path.display(), e)))?;
        let writer = Arc::new(Mutex::new(BufWriter::new(file)));
        let write_error = Arc::new(Mutex::new(None));

        let sink_writer = Arc::clone(&writer);
        let sink_error = Arc::clone(&write_error);
        let sink: FrameSink<Frame> = Arc::new(move |frame: Frame| {
            let result = match sink_writer.lock() {
                Ok(mut w) => w.write_all(&frame.data),
                Err(_) => return,
            };
            if let Err(e) = result {
                if let Ok(mut slot) = sink_error.lock() {
                    slot.get_or_insert(e);
                }
            }
        });

        log::info!("Recording raw RGB video to {}", path.display());
        self.recording = Some(Recording {
            worker: Worker::spawn(self.settings, sink, Arc::clone(&self.frame_counter)),
            path: path.to_path_buf(),
            writer,
            write_error,
        });
        Ok(())
    }

    async fn stop_video_recording(&mut self) -> Result<PathBuf, CameraError> {
        self.finish_recording().await
    }

    async fn set_flash_mode(&mut self, mode: FlashMode) -> Result<(), CameraError> {
        self.ensure_open()?;
        self.controls.flash_mode = mode;
        Ok(())
    }

    async fn set_focus_mode(&mut self, mode: FocusMode) -> Result<(), CameraError> {
        self.ensure_open()?;
        self.controls.focus_mode = mode;
        Ok(())
    }

    async fn set_focus_point(&mut self, point: Option<Point>) -> Result<(), CameraError> {
        self.ensure_open()?;
        self.controls.focus_point = point;
        Ok(())
    }

    async fn set_zoom_level(&mut self, zoom: f64) -> Result<(), CameraError> {
        self.ensure_open()?;
        if !(1.0..=MAX_ZOOM).contains(&zoom) {
            return Err(CameraError::Unsupported(format!(
                "zoom level {} outside 1.0-{}",
                zoom, MAX_ZOOM
            )));
        }
        self.controls.zoom_level = zoom;
        Ok(())
    }

    async fn set_exposure_mode(&mut self, mode: ExposureMode) -> Result<(), CameraError> {
        self.ensure_open()?;
        self.controls.exposure_mode = mode;
        Ok(())
    }

    async fn set_exposure_offset(&mut self, offset: f64) -> Result<f64, CameraError> {
        self.ensure_open()?;
        let (min, max) = EXPOSURE_OFFSET_RANGE;
        let applied = offset.clamp(min, max);
        self.controls.exposure_offset = applied;
        Ok(applied)
    }

    async fn set_exposure_point(&mut self, point: Option<Point>) -> Result<(), CameraError> {
        self.ensure_open()?;
        self.controls.exposure_point = point;
        Ok(())
    }

    async fn dispose(&mut self) -> Result<(), CameraError> {
        if let Some(worker) = self.stream.take() {
            worker.shutdown().await;
        }
        if self.recording.is_some() {
            self.finish_recording().await?;
        }
        self.disposed = true;
        Ok(())
    }
}

impl Drop for SyntheticHandle {
    /// Threads are only signalled here; they exit within one sleep slice.
    fn drop(&mut self) {
        if let Some(worker) = &self.stream {
            worker.signal();
        }
        if let Some(recording) = &self.recording {
            recording.worker.signal();
        }
    }
}
