//! Raw frame types

use crate::image_pipeline::common::error::{HdrError, Result};

/// A single-channel frame as captured by the sensor
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    /// Width of the frame in pixels
    pub width: usize,
    /// Height of the frame in pixels
    pub height: usize,
    /// Row-major samples; 8-bit sources are widened to u16
    pub data: Vec<u16>,
    /// Bit depth of the source samples (8 or 16)
    pub bits_per_sample: u32,
}

impl RawFrame {
    /// Builds a frame, checking that the sample count matches the dimensions.
    pub fn new(width: usize, height: usize, data: Vec<u16>, bits_per_sample: u32) -> Result<Self> {
        if width == 0 || height == 0 || data.len() != width * height {
            return Err(HdrError::InvalidDimensions(width, height));
        }
        Ok(Self {
            width,
            height,
            data,
            bits_per_sample,
        })
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn pixel_count(&self) -> usize {
        self.data.len()
    }
}
