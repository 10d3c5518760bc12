//! Pluggable frame detectors.
//!
//! A detector receives a frame together with the rotation that makes it upright and
//! resolves to a detector-defined result. Any async closure of the right shape is a
//! detector:
//!
//! ```
//! use vision_cam::detector::{Detector, DetectorError};
//! use vision_cam::rotation::Rotation;
//!
//! let count_pixels = |frame: Vec<u8>, _rotation: Rotation| async move {
//!     Ok::<_, DetectorError>(frame.len())
//! };
//! let _boxed: Box<dyn Detector<Vec<u8>, usize>> = Box::new(count_pixels);
//! ```

use futures_util::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::time::Duration;

use crate::camera::Frame;
use crate::rotation::Rotation;

/// Errors a detector can fail with.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DetectorError {
    #[error("Detection failed: {0}")]
    Failed(String),

    #[error("Unsupported frame: {0}")]
    UnsupportedFrame(String),

    #[error("Detection timed out after {0:?}")]
    TimedOut(Duration),
}

/// Runs detection on one frame.
///
/// The returned future must not borrow the detector so it can run on its own task.
pub trait Detector<F, T>: Send + Sync {
    fn detect(&self, frame: F, rotation: Rotation) -> BoxFuture<'static, Result<T, DetectorError>>;
}

impl<F, T, Func, Fut> Detector<F, T> for Func
where
    Func: Fn(F, Rotation) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, DetectorError>> + Send + 'static,
{
    fn detect(&self, frame: F, rotation: Rotation) -> BoxFuture<'static, Result<T, DetectorError>> {
        (self)(frame, rotation).boxed()
    }
}

/// Axis-aligned box in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Output of [`BrightRegionDetector`].
#[derive(Debug, Clone, PartialEq)]
pub struct Detections {
    pub regions: Vec<Region>,
    /// Rotation the frame was delivered with, for mapping regions onto the preview
    pub rotation: Rotation,
    pub frame_width: u32,
    pub frame_height: u32,
}

/// Finds the bounding box of pixels brighter than a threshold.
///
/// Stands in for a real model (faces, barcodes) in the demo binary and in tests; the
/// synthetic camera's bright square is exactly what it finds.
#[derive(Debug, Clone, Copy)]
pub struct BrightRegionDetector {
    /// Minimum luminance counted as bright
    threshold: u8,
    /// Sample every `step`-th pixel in both directions
    step: u32,
}

impl Default for BrightRegionDetector {
    fn default() -> Self {
        Self::new(200)
    }
}

impl BrightRegionDetector {
    pub fn new(threshold: u8) -> Self {
        Self { threshold, step: 2 }
    }

    /// Sample stride; larger is faster but less precise.
    pub fn with_step(mut self, step: u32) -> Self {
        self.step = step.max(1);
        self
    }

    /// Synchronous detection.
    pub fn find(&self, frame: &Frame) -> Option<Region> {
        let expected = frame.width as usize * frame.height as usize * frame.bytes_per_pixel();
        if frame.data.len() < expected {
            return None;
        }

        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for y in (0..frame.height).step_by(self.step as usize) {
            for x in (0..frame.width).step_by(self.step as usize) {
                if frame.luma(x, y).is_some_and(|l| l >= self.threshold) {
                    bounds = Some(match bounds {
                        None => (x, y, x, y),
                        Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                    });
                }
            }
        }

        bounds.map(|(x0, y0, x1, y1)| Region {
            x: x0,
            y: y0,
            width: x1 - x0 + 1,
            height: y1 - y0 + 1,
        })
    }
}

impl Detector<Frame, Detections> for BrightRegionDetector {
    fn detect(
        &self,
        frame: Frame,
        rotation: Rotation,
    ) -> BoxFuture<'static, Result<Detections, DetectorError>> {
        let detector = *self;
        async move {
            let expected =
                frame.width as usize * frame.height as usize * frame.bytes_per_pixel();
            if frame.data.len() < expected {
                return Err(DetectorError::UnsupportedFrame(format!(
                    "{} bytes for a {}x{} frame",
                    frame.data.len(),
                    frame.width,
                    frame.height
                )));
            }

            let (width, height) = (frame.width, frame.height);
            // Pixel scanning is CPU work; keep it off the async workers.
            let region = tokio::task::spawn_blocking(move || detector.find(&frame))
                .await
                .map_err(|e| DetectorError::Failed(format!("detection task failed: {}", e)))?;

            Ok(Detections {
                regions: region.into_iter().collect(),
                rotation,
                frame_width: width,
                frame_height: height,
            })
        }
        .boxed()
    }
}
