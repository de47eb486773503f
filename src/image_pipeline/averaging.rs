//! Exposure averaging module
//!
//! Repeated acquisitions of the same bracket position are averaged pixel by
//! pixel to reduce shot noise.

use tracing::debug;

use crate::image_pipeline::common::error::{HdrError, ParameterError, Result};
use crate::image_pipeline::raw::types::RawFrame;

/// Per-pixel mean of `frames`, accumulated in `f32` and truncated toward zero.
///
/// All frames must share the first frame's dimensions. The result keeps the
/// first frame's bit depth.
pub fn average_frames(frames: &[RawFrame]) -> Result<RawFrame> {
    let first = frames.first().ok_or(ParameterError::EmptyBracket)?;

    let mut sums = vec![0.0f32; first.pixel_count()];
    for frame in frames {
        if frame.dimensions() != first.dimensions() {
            return Err(HdrError::DimensionMismatch {
                expected: first.dimensions(),
                found: frame.dimensions(),
            });
        }
        for (sum, &value) in sums.iter_mut().zip(&frame.data) {
            *sum += f32::from(value);
        }
    }

    let count = frames.len() as f32;
    let data = sums.into_iter().map(|sum| (sum / count) as u16).collect();

    debug!(frames = frames.len(), "Averaged {}x{} frames", first.width, first.height);

    RawFrame::new(first.width, first.height, data, first.bits_per_sample)
}
