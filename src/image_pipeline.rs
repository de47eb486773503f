//! Image processing pipeline module
//!
//! This module provides HDR bracket fusion and exposure averaging, with
//! separate modules for frame reading, TIFF writing, the fusion core, and
//! run-level orchestration.

pub mod raw;
pub mod tiff;
pub mod hdr;
pub mod averaging;
pub mod workflows;
pub mod common;

pub use common::{
    HdrError,
    ParameterError,
    ParameterKind,
    Result,
};

pub use raw::{
    RawFrame,
    FrameReader,
    TiffFrameReader,
};

pub use self::tiff::{
    TiffCompression,
    OutputConfig,
    OutputConfigBuilder,
    TiffWriter,
    StandardTiffWriter,
};

pub use hdr::{
    BracketFuser,
    ExposureSchedule,
    FusedImage,
    FusionConfig,
    FusionReport,
    PairedHdrProcessor,
    PairedResult,
};

pub use averaging::average_frames;

pub use workflows::{
    AveragingPlan,
    HdrConfig,
    HdrConfigBuilder,
    HdrPipeline,
    ReprocessReport,
};
