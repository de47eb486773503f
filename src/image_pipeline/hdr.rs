//! HDR bracket fusion module
//!
//! Fuses exposure brackets into saturation-free images and pairs blank and
//! signal brackets for background subtraction. Everything here works on
//! in-memory frames; file handling lives in `workflows`.

mod fuser;
mod paired;
pub mod types;

#[cfg(test)]
mod tests;

pub use fuser::{Accumulation, BracketFuser};
pub use paired::{PairedHdrProcessor, required_frames, select_brackets};
pub use types::{
    ExposureBracket, ExposureSchedule, FusedImage, FusionConfig, FusionConfigBuilder, FusionReport,
    PairedResult, RadianceEstimate, RESCALE_DIVISOR,
};
