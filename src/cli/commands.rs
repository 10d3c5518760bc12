//! Subcommand handlers.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use super::args::ConfigAction;
use crate::camera::{CameraProvider, SyntheticCamera};
use crate::config::Config;
use crate::detector::{BrightRegionDetector, Detections};
use crate::session::{CameraSession, SessionOptions};

/// Set when the user presses Ctrl+C.
static CTRLC_RECEIVED: AtomicBool = AtomicBool::new(false);

/// Check if Ctrl+C was received.
pub fn ctrlc_received() -> bool {
    CTRLC_RECEIVED.load(Ordering::SeqCst)
}

/// Set up the Ctrl+C handler.
///
/// This should be called once at program startup.
pub fn setup_ctrlc_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        CTRLC_RECEIVED.store(true, Ordering::SeqCst);
        eprintln!("\nReceived Ctrl+C, shutting down...");
    })
}

/// Synthetic camera configured from the `[camera]` section.
pub fn provider_from_config(config: &Config) -> SyntheticCamera {
    SyntheticCamera::default()
        .fps(config.camera.fps)
        .mirror_front(config.camera.mirror)
}

/// List available cameras and print them to stdout.
pub async fn list_cameras(provider: &SyntheticCamera) -> Result<(), String> {
    let cameras = provider
        .available_cameras()
        .await
        .map_err(|e| format!("Failed to list cameras: {}", e))?;

    if cameras.is_empty() {
        println!("No cameras found.");
    } else {
        println!("Available cameras:");
        for camera in cameras {
            println!("  {}", camera);
        }
        println!();
        println!("Use --lens <front|back|external> to select a camera.");
    }
    Ok(())
}

fn format_detections(d: &Detections) -> String {
    if d.regions.is_empty() {
        return "no bright region".to_string();
    }
    d.regions
        .iter()
        .map(|r| format!("{}x{} at ({}, {})", r.width, r.height, r.x, r.y))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Stream for `duration`, printing every detection.
pub async fn run(
    provider: SyntheticCamera,
    options: SessionOptions,
    duration: Duration,
    threshold: u8,
) -> Result<(), String> {
    let mut session = CameraSession::builder(provider, BrightRegionDetector::new(threshold))
        .options(options)
        .on_result(|d: &Detections| println!("[{}] {}", d.rotation, format_detections(d)))
        .on_error(|e| eprintln!("Camera error ({}): {}", e.kind(), e))
        .on_dispose(|| log::debug!("Session dispose hook called"))
        .build();

    session
        .initialize()
        .await
        .map_err(|e| format!("Failed to initialize camera: {}", e))?;

    let started = Instant::now();
    while started.elapsed() < duration && !ctrlc_received() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    session.stop().await;
    let stats = session.frame_stats();
    session.dispose().await;

    println!();
    println!(
        "Processed {} frames, dropped {}, failed {}",
        stats.processed, stats.dropped, stats.failed
    );
    Ok(())
}

/// Take one picture and write its raw RGB bytes to `output`.
pub async fn snapshot(
    provider: SyntheticCamera,
    options: SessionOptions,
    output: &Path,
) -> Result<(), String> {
    let mut session = CameraSession::builder(provider, BrightRegionDetector::default())
        .options(options)
        .build();

    session
        .initialize()
        .await
        .map_err(|e| format!("Failed to initialize camera: {}", e))?;

    let result = session.take_picture().await;
    session.dispose().await;
    let image = result.map_err(|e| format!("Failed to take picture: {}", e))?;

    tokio::fs::write(output, &image.data)
        .await
        .map_err(|e| format!("Failed to write {}: {}", output.display(), e))?;

    println!(
        "Saved {}x{} RGB picture to {}",
        image.width,
        image.height,
        output.display()
    );
    Ok(())
}

/// Record a clip of `length` to `output`.
pub async fn record(
    provider: SyntheticCamera,
    options: SessionOptions,
    output: &Path,
    length: Duration,
) -> Result<(), String> {
    let mut session = CameraSession::builder(provider, BrightRegionDetector::default())
        .options(options)
        .build();

    session
        .initialize()
        .await
        .map_err(|e| format!("Failed to initialize camera: {}", e))?;

    if let Err(e) = session.start_video_recording(output).await {
        session.dispose().await;
        return Err(format!("Failed to start recording: {}", e));
    }

    println!("Recording for {:?}...", length);
    let started = Instant::now();
    while started.elapsed() < length && !ctrlc_received() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let result = session.stop_video_recording().await;
    session.dispose().await;
    let path = result.map_err(|e| format!("Failed to stop recording: {}", e))?;

    println!("Saved recording to {}", path.display());
    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# vision-cam configuration

[camera]
# Lens: front, back, external
lens = "back"
# Resolution: low, medium, high, very_high, ultra_high, max
resolution = "low"
# Device orientation: portrait_up, landscape_left, portrait_down, landscape_right
orientation = "portrait_up"
# Synthetic camera frame rate
fps = 30
# Mirror front camera frames
mirror = true

[session]
# Grace period between opening the camera and streaming
stream_start_delay_ms = 200
# Pause before and after still captures
settle_delay_ms = 200
# Give up on a detector call after this long (unset = wait forever)
# detection_timeout_ms = 1000
# Minimum OS version and what to do below it: advisory, fatal
min_os_version = 21
os_version_policy = "advisory"
"#;

/// Handle config subcommand actions against the file at `config_path`.
pub fn handle_config_action(
    action: ConfigAction,
    config: &Config,
    config_path: &Path,
) -> Result<(), String> {
    match action {
        ConfigAction::Show => {
            println!("Current configuration:");
            println!("  Lens: {}", config.camera.lens);
            println!("  Resolution: {:?}", config.camera.resolution);
            println!("  Orientation: {:?}", config.camera.orientation);
            println!("  FPS: {}", config.camera.fps);
            println!("  Mirror: {}", if config.camera.mirror { "yes" } else { "no" });
            println!(
                "  Stream start delay: {}ms",
                config.session.stream_start_delay_ms
            );
            println!("  Settle delay: {}ms", config.session.settle_delay_ms);
            match config.session.detection_timeout_ms {
                Some(ms) => println!("  Detection timeout: {}ms", ms),
                None => println!("  Detection timeout: none"),
            }
            println!(
                "  Minimum OS version: {} ({:?})",
                config.session.min_os_version, config.session.os_version_policy
            );
            println!();

            if config_path.exists() {
                println!("Config file: {} (exists)", config_path.display());
            } else {
                println!("Config file: {} (not found)", config_path.display());
            }
            Ok(())
        }
        ConfigAction::Init => {
            if config_path.exists() {
                return Err(format!(
                    "Config file already exists: {}\nUse 'vision-cam config show' to view current settings.",
                    config_path.display()
                ));
            }

            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| format!("Error creating config directory: {}", e))?;
            }

            std::fs::write(config_path, DEFAULT_CONFIG)
                .map_err(|e| format!("Error writing config file: {}", e))?;

            println!("Created config file: {}", config_path.display());
            Ok(())
        }
    }
}
