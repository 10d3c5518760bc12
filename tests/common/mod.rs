//! Scripted camera and probe detector shared by the integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures_util::future::{BoxFuture, FutureExt};
use tokio::sync::Semaphore;
use vision_cam::camera::{
    CameraDescription, CameraError, CameraHandle, CameraProvider, CapturedImage, ExposureMode,
    FlashMode, FocusMode, FrameSink, LensDirection, Point, ResolutionPreset,
};
use vision_cam::detector::DetectorError;
use vision_cam::rotation::Rotation;

/// Frame id that makes the probe detector fail.
pub const FAILING_FRAME: u32 = 666;

/// Everything the mock camera was asked to do.
#[derive(Debug, Default)]
pub struct Calls {
    pub opens: usize,
    pub last_preset: Option<ResolutionPreset>,
    pub last_audio: Option<bool>,
    pub stream_starts: usize,
    pub stream_stops: usize,
    pub pictures: usize,
    pub recordings_started: usize,
    pub recordings_stopped: usize,
    pub disposes: usize,
    pub flash: Option<FlashMode>,
    pub focus_mode: Option<FocusMode>,
    pub focus_point: Option<Option<Point>>,
    pub zoom: Option<f64>,
    pub exposure_mode: Option<ExposureMode>,
    pub exposure_offset: Option<f64>,
    pub exposure_point: Option<Option<Point>>,
}

/// A camera whose frames are pushed by the test.
#[derive(Clone)]
pub struct MockCamera {
    cameras: Vec<CameraDescription>,
    pub calls: Arc<Mutex<Calls>>,
    sink: Arc<Mutex<Option<FrameSink<u32>>>>,
    pub fail_open: Arc<AtomicBool>,
    pub fail_picture: Arc<AtomicBool>,
    pub fail_recording: Arc<AtomicBool>,
}

pub fn back_camera() -> CameraDescription {
    CameraDescription {
        name: "mock-back".to_string(),
        lens_direction: LensDirection::Back,
        sensor_orientation: 90,
    }
}

pub fn front_camera() -> CameraDescription {
    CameraDescription {
        name: "mock-front".to_string(),
        lens_direction: LensDirection::Front,
        sensor_orientation: 270,
    }
}

impl MockCamera {
    pub fn new(cameras: Vec<CameraDescription>) -> Self {
        Self {
            cameras,
            calls: Arc::new(Mutex::new(Calls::default())),
            sink: Arc::new(Mutex::new(None)),
            fail_open: Arc::new(AtomicBool::new(false)),
            fail_picture: Arc::new(AtomicBool::new(false)),
            fail_recording: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_both() -> Self {
        Self::new(vec![back_camera(), front_camera()])
    }

    /// Deliver a frame as the camera would. Returns false if no stream is running.
    pub fn push_frame(&self, frame: u32) -> bool {
        let sink = self.sink.lock().unwrap().clone();
        match sink {
            Some(sink) => {
                sink(frame);
                true
            }
            None => false,
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.sink.lock().unwrap().is_some()
    }

    pub fn calls(&self) -> std::sync::MutexGuard<'_, Calls> {
        self.calls.lock().unwrap()
    }
}

impl CameraProvider for MockCamera {
    type Handle = MockHandle;

    async fn available_cameras(&self) -> Result<Vec<CameraDescription>, CameraError> {
        Ok(self.cameras.clone())
    }

    async fn open(
        &self,
        _camera: &CameraDescription,
        preset: ResolutionPreset,
        enable_audio: bool,
    ) -> Result<MockHandle, CameraError> {
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(CameraError::OpenFailed("camera busy".to_string()));
        }
        let mut calls = self.calls.lock().unwrap();
        calls.opens += 1;
        calls.last_preset = Some(preset);
        calls.last_audio = Some(enable_audio);
        Ok(MockHandle {
            camera: self.clone(),
            recording: None,
        })
    }
}

pub struct MockHandle {
    camera: MockCamera,
    recording: Option<PathBuf>,
}

impl CameraHandle for MockHandle {
    type Frame = u32;

    async fn start_frame_stream(&mut self, sink: FrameSink<u32>) -> Result<(), CameraError> {
        let mut slot = self.camera.sink.lock().unwrap();
        if slot.is_some() {
            return Err(CameraError::AlreadyStreaming);
        }
        *slot = Some(sink);
        self.camera.calls().stream_starts += 1;
        Ok(())
    }

    async fn stop_frame_stream(&mut self) -> Result<(), CameraError> {
        *self.camera.sink.lock().unwrap() = None;
        self.camera.calls().stream_stops += 1;
        Ok(())
    }

    async fn take_picture(&mut self) -> Result<CapturedImage, CameraError> {
        self.camera.calls().pictures += 1;
        if self.camera.fail_picture.load(Ordering::SeqCst) {
            return Err(CameraError::CaptureFailed("shutter jammed".to_string()));
        }
        Ok(CapturedImage {
            data: vec![1, 2, 3],
            width: 1,
            height: 1,
            captured_at: Instant::now(),
        })
    }

    async fn start_video_recording(&mut self, path: &Path) -> Result<(), CameraError> {
        if self.camera.fail_recording.load(Ordering::SeqCst) {
            return Err(CameraError::RecordingFailed("encoder missing".to_string()));
        }
        self.camera.calls().recordings_started += 1;
        self.recording = Some(path.to_path_buf());
        Ok(())
    }

    async fn stop_video_recording(&mut self) -> Result<PathBuf, CameraError> {
        let path = self.recording.take().ok_or(CameraError::NotRecording)?;
        self.camera.calls().recordings_stopped += 1;
        Ok(path)
    }

    async fn set_flash_mode(&mut self, mode: FlashMode) -> Result<(), CameraError> {
        self.camera.calls().flash = Some(mode);
        Ok(())
    }

    async fn set_focus_mode(&mut self, mode: FocusMode) -> Result<(), CameraError> {
        self.camera.calls().focus_mode = Some(mode);
        Ok(())
    }

    async fn set_focus_point(&mut self, point: Option<Point>) -> Result<(), CameraError> {
        self.camera.calls().focus_point = Some(point);
        Ok(())
    }

    async fn set_zoom_level(&mut self, zoom: f64) -> Result<(), CameraError> {
        self.camera.calls().zoom = Some(zoom);
        Ok(())
    }

    async fn set_exposure_mode(&mut self, mode: ExposureMode) -> Result<(), CameraError> {
        self.camera.calls().exposure_mode = Some(mode);
        Ok(())
    }

    async fn set_exposure_offset(&mut self, offset: f64) -> Result<f64, CameraError> {
        self.camera.calls().exposure_offset = Some(offset);
        Ok(offset)
    }

    async fn set_exposure_point(&mut self, point: Option<Point>) -> Result<(), CameraError> {
        self.camera.calls().exposure_point = Some(point);
        Ok(())
    }

    async fn dispose(&mut self) -> Result<(), CameraError> {
        *self.camera.sink.lock().unwrap() = None;
        self.camera.calls().disposes += 1;
        Ok(())
    }
}

/// Detector that blocks until the test releases it and records concurrency.
#[derive(Clone)]
pub struct Probe {
    pub calls: Arc<AtomicUsize>,
    pub in_flight: Arc<AtomicUsize>,
    pub max_in_flight: Arc<AtomicUsize>,
    pub rotations: Arc<Mutex<Vec<Rotation>>>,
    release: Arc<Semaphore>,
}

impl Probe {
    pub fn new() -> Self {
        Self {
            calls: Arc::default(),
            in_flight: Arc::default(),
            max_in_flight: Arc::default(),
            rotations: Arc::default(),
            release: Arc::new(Semaphore::new(0)),
        }
    }

    /// Let `n` pending or future detections finish.
    pub fn release(&self, n: usize) {
        self.release.add_permits(n);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// A detector closure echoing the frame id back as the result.
    pub fn detector(
        &self,
    ) -> impl Fn(u32, Rotation) -> BoxFuture<'static, Result<u32, DetectorError>> + Send + Sync + 'static
    {
        let probe = self.clone();
        move |frame: u32, rotation: Rotation| {
            let probe = probe.clone();
            async move {
                probe.calls.fetch_add(1, Ordering::SeqCst);
                probe.rotations.lock().unwrap().push(rotation);
                let now = probe.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                probe.max_in_flight.fetch_max(now, Ordering::SeqCst);

                if let Ok(permit) = probe.release.acquire().await {
                    permit.forget();
                }

                probe.in_flight.fetch_sub(1, Ordering::SeqCst);
                if frame == FAILING_FRAME {
                    Err(DetectorError::Failed("model crashed".to_string()))
                } else {
                    Ok(frame)
                }
            }
            .boxed()
        }
    }
}

/// Poll `condition` until it holds, failing the test after two seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not met within 2s");
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

/// Let spawned tasks run for a moment.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}
