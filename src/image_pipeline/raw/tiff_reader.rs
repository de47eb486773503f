//! Frame reader implementation using the tiff library.
//!
//! Instrument frames are written as uncompressed or compressed single-channel
//! TIFFs. Both 8-bit and 16-bit grayscale sources are accepted; anything with
//! more than one sample per pixel is rejected since fusion is defined on
//! intensity data only.

use std::io::Cursor;

use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult};
use tracing::debug;

use crate::image_pipeline::common::error::{HdrError, Result};
use crate::image_pipeline::raw::reader::FrameReader;
use crate::image_pipeline::raw::types::RawFrame;

/// Frame reader that decodes grayscale TIFF files.
pub struct TiffFrameReader;

impl FrameReader for TiffFrameReader {
    /// Decodes a TIFF byte buffer into a [`RawFrame`].
    ///
    /// # Errors
    ///
    /// * `DecodeError` - the buffer is not a readable TIFF
    /// * `UnsupportedFormat` - the TIFF is not 8- or 16-bit grayscale
    fn read_frame(&self, data: &[u8]) -> Result<RawFrame> {
        debug!("Decoding TIFF frame, {} bytes", data.len());

        let mut decoder = Decoder::new(Cursor::new(data))
            .map_err(|e| HdrError::DecodeError(e.to_string()))?;

        let (width, height) = decoder
            .dimensions()
            .map_err(|e| HdrError::DecodeError(e.to_string()))?;
        let color_type = decoder
            .colortype()
            .map_err(|e| HdrError::DecodeError(e.to_string()))?;

        let bits_per_sample = match color_type {
            ColorType::Gray(bits @ (8 | 16)) => u32::from(bits),
            other => {
                return Err(HdrError::UnsupportedFormat(format!(
                    "expected 8- or 16-bit grayscale, found {other:?}"
                )));
            }
        };

        let samples: Vec<u16> = match decoder
            .read_image()
            .map_err(|e| HdrError::DecodeError(e.to_string()))?
        {
            DecodingResult::U8(values) => values.into_iter().map(u16::from).collect(),
            DecodingResult::U16(values) => values,
            _ => {
                return Err(HdrError::UnsupportedFormat(
                    "unexpected sample format".to_string(),
                ));
            }
        };

        debug!("Decoded frame: {}x{} @ {} bits", width, height, bits_per_sample);

        RawFrame::new(width as usize, height as usize, samples, bits_per_sample)
    }
}
