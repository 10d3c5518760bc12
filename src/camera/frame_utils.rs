//! Frame generation and transformation utilities.

use std::time::Instant;

use super::types::{Frame, FrameFormat, Resolution};

/// Background luminance of generated test frames.
pub const PATTERN_BACKGROUND: u8 = 32;

/// Render a test-pattern RGB frame: a dark field with one bright square that moves
/// left to right as `frame_index` advances.
///
/// The square's side is a quarter of the shorter frame dimension, and it is vertically
/// centered, so detectors have something stable to find.
pub fn test_pattern(resolution: Resolution, frame_index: u64) -> Frame {
    let width = resolution.width as usize;
    let height = resolution.height as usize;
    let mut data = vec![PATTERN_BACKGROUND; width * height * 3];

    let (x0, y0, side) = pattern_square(resolution, frame_index);
    for y in y0..(y0 + side).min(height) {
        let row_start = y * width * 3;
        for x in x0..(x0 + side).min(width) {
            let i = row_start + x * 3;
            data[i..i + 3].copy_from_slice(&[255, 255, 255]);
        }
    }

    Frame {
        data,
        width: resolution.width,
        height: resolution.height,
        format: FrameFormat::Rgb,
        timestamp: Instant::now(),
    }
}

/// Top-left corner and side length of the bright square for `frame_index`.
pub fn pattern_square(resolution: Resolution, frame_index: u64) -> (usize, usize, usize) {
    let width = resolution.width as usize;
    let height = resolution.height as usize;
    let side = (width.min(height) / 4).max(1);
    let travel = width.saturating_sub(side).max(1);
    let x0 = (frame_index as usize * 4) % travel;
    let y0 = (height - side.min(height)) / 2;
    (x0, y0, side)
}

/// Mirror a frame horizontally (flip left-right) for front cameras.
pub fn mirror_horizontal(frame: &mut Frame) {
    let width = frame.width as usize;
    let height = frame.height as usize;
    let bpp = frame.bytes_per_pixel();

    for y in 0..height {
        let row_start = y * width * bpp;
        let row = &mut frame.data[row_start..row_start + width * bpp];

        for x in 0..width / 2 {
            let left = x * bpp;
            let right = (width - 1 - x) * bpp;
            for i in 0..bpp {
                row.swap(left + i, right + i);
            }
        }
    }
}
