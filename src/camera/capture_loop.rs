//! Background capture thread implementation.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::frame_utils::{mirror_horizontal, test_pattern};
use super::provider::FrameSink;
use super::types::{Frame, Resolution};

/// Settings shared by every capture thread a synthetic handle starts.
#[derive(Debug, Clone, Copy)]
pub struct LoopSettings {
    pub resolution: Resolution,
    pub frame_interval: Duration,
    pub mirror: bool,
}

/// Run the capture loop until `stop` is raised.
///
/// `frame_counter` is shared with the owning handle so the pattern keeps moving across
/// stream restarts.
pub fn run_capture_loop(
    settings: LoopSettings,
    sink: FrameSink<Frame>,
    stop: Arc<AtomicBool>,
    frame_counter: Arc<AtomicU64>,
) {
    log::debug!(
        "Capture loop started at {}x{} every {:?}",
        settings.resolution.width,
        settings.resolution.height,
        settings.frame_interval
    );

    while !stop.load(Ordering::Relaxed) {
        let started = Instant::now();
        let index = frame_counter.fetch_add(1, Ordering::Relaxed);

        let mut frame = test_pattern(settings.resolution, index);
        if settings.mirror {
            mirror_horizontal(&mut frame);
        }
        sink(frame);

        // Sleep in short slices so a stop request is honored quickly.
        while !stop.load(Ordering::Relaxed) && started.elapsed() < settings.frame_interval {
            let remaining = settings.frame_interval.saturating_sub(started.elapsed());
            thread::sleep(remaining.min(Duration::from_millis(5)));
        }
    }

    log::debug!("Capture loop stopped");
}
