use std::io::Write;
use tiff::encoder::{Compression, TiffEncoder, colortype, compression::DeflateLevel};
use tracing::debug;
use crate::image_pipeline::common::error::{HdrError, Result};
use crate::image_pipeline::hdr::types::FusedImage;
use crate::image_pipeline::tiff::types::{OutputConfig, TiffCompression};
use crate::image_pipeline::tiff::writer::TiffWriter;

/// Writes single-channel images, as `Gray8` when the image fits in 8 bits and
/// `Gray16` otherwise.
pub struct StandardTiffWriter;

impl TiffWriter for StandardTiffWriter {
    fn write_tiff(&self, image: &FusedImage, output: &mut dyn Write, config: &OutputConfig) -> Result<()> {
        debug!(
            "Encoding TIFF image: {}x{} @ {} bits",
            image.width, image.height, image.bit_depth
        );

        let mut buffer = Vec::new();

        let compression = match config.compression {
            TiffCompression::None => Compression::Uncompressed,
            TiffCompression::Lzw => Compression::Lzw,
            TiffCompression::DeflateFast => Compression::Deflate(DeflateLevel::Fast),
            TiffCompression::DeflateBalanced => Compression::Deflate(DeflateLevel::Balanced),
            TiffCompression::DeflateBest => Compression::Deflate(DeflateLevel::Best),
        };

        let mut encoder = TiffEncoder::new(std::io::Cursor::new(&mut buffer))
            .map_err(|e| HdrError::EncodeError(e.to_string()))?
            .with_compression(compression);

        if let Some(predictor_val) = config.predictor {
            let predictor = match predictor_val {
                2 => tiff::tags::Predictor::Horizontal,
                _ => tiff::tags::Predictor::None,
            };
            encoder = encoder.with_predictor(predictor);
        }

        let width = image.width as u32;
        let height = image.height as u32;

        if image.bit_depth <= 8 {
            // Values are already clamped to the 8-bit range by quantisation.
            let narrow: Vec<u8> = image.data.iter().map(|&v| v.min(u16::from(u8::MAX)) as u8).collect();
            encoder
                .write_image::<colortype::Gray8>(width, height, &narrow)
                .map_err(|e| HdrError::EncodeError(e.to_string()))?;
        } else {
            encoder
                .write_image::<colortype::Gray16>(width, height, &image.data)
                .map_err(|e| HdrError::EncodeError(e.to_string()))?;
        }

        output.write_all(&buffer)?;

        debug!("TIFF encoding complete");
        Ok(())
    }
}
