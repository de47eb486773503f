//! Run-level workflows
//!
//! File-system orchestration around the fusion core: scanning run folders,
//! loading frames, and writing HDR and averaged images back out.

pub mod config;
mod pipeline;
mod reprocess;
pub mod scan;


pub use config::{AveragingPlan, DEFAULT_FRAME_EXTENSION, HdrConfig, HdrConfigBuilder};
pub use pipeline::{AVERAGE_FOLDER_NAME, BLANK_FILE_NAME, HdrPipeline, SIGNAL_FILE_NAME};
pub use reprocess::{CYCLE_IMAGES_FOLDER_NAME, CycleFailure, IMPROC_FOLDER_NAME, ReprocessReport};
