use std::io::Write;
use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::hdr::types::FusedImage;
use crate::image_pipeline::tiff::types::OutputConfig;

pub trait TiffWriter {
    fn write_tiff(&self, image: &FusedImage, output: &mut dyn Write, config: &OutputConfig) -> Result<()>;
}
