//! Regeneration of every cycle's HDR images in a run folder.
//!
//! The existing `improc` folder is moved aside to a timestamped backup so old
//! and new images can be compared. Cycles are processed one after another; a
//! failing cycle is logged and recorded, and processing moves on to the next.
//! Outputs already written are never rolled back.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{error, info, instrument};

use crate::image_pipeline::{
    common::error::{HdrError, Result},
    raw::FrameReader,
    tiff::TiffWriter,
    workflows::pipeline::HdrPipeline,
    workflows::scan::{backup_folder_name, list_cycle_folders},
};

pub const IMPROC_FOLDER_NAME: &str = "improc";
pub const CYCLE_IMAGES_FOLDER_NAME: &str = "Images";

#[derive(Debug)]
pub struct CycleFailure {
    pub cycle: String,
    pub error: HdrError,
}

#[derive(Debug, Default)]
pub struct ReprocessReport {
    /// Where the previous `improc` folder was moved, if there was one
    pub backup: Option<PathBuf>,
    /// Cycles whose images were regenerated, in processing order
    pub processed: Vec<String>,
    pub failures: Vec<CycleFailure>,
}

impl ReprocessReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl<R: FrameReader, W: TiffWriter> HdrPipeline<R, W> {
    /// Regenerates blank and signal HDR images for every `NNN - *` cycle in
    /// `run_dir` into `improc/blank` and `improc/signal`.
    ///
    /// Cycle captures always include the leading test bracket, so the
    /// configured `skip_test_bracket` is ignored here.
    #[instrument(skip(self, run_dir), fields(run_dir = %run_dir.as_ref().display()))]
    pub fn reprocess_run_folder<P: AsRef<Path>>(&self, run_dir: P) -> Result<ReprocessReport> {
        let run_dir = run_dir.as_ref();
        if !run_dir.is_dir() {
            return Err(HdrError::PathNotFound(run_dir.to_path_buf()));
        }

        let mut report = ReprocessReport::default();
        let improc = run_dir.join(IMPROC_FOLDER_NAME);
        if improc.exists() {
            let backup = run_dir.join(backup_folder_name(
                IMPROC_FOLDER_NAME,
                &Local::now().naive_local(),
            ));
            fs::rename(&improc, &backup)
                .map_err(|e| HdrError::OutputWriteError(format!("{}: {}", backup.display(), e)))?;
            info!(backup = %backup.display(), "Backed up previous output folder");
            report.backup = Some(backup);
        }

        let blank_dir = improc.join("blank");
        let signal_dir = improc.join("signal");
        for dir in [&improc, &blank_dir, &signal_dir] {
            fs::create_dir(dir)
                .map_err(|e| HdrError::OutputWriteError(format!("{}: {}", dir.display(), e)))?;
        }

        for cycle_dir in list_cycle_folders(run_dir)? {
            let cycle = cycle_dir
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();

            let outcome = self.generate_paired(
                &cycle_dir.join(CYCLE_IMAGES_FOLDER_NAME),
                &signal_dir,
                &blank_dir,
                &format!("{cycle} Signal"),
                &format!("{cycle} Blank"),
                false,
            );

            match outcome {
                Ok(_) => {
                    info!(cycle = %cycle, "Cycle reprocessed");
                    report.processed.push(cycle);
                }
                Err(e) => {
                    error!(cycle = %cycle, "Cycle failed: {}", e);
                    report.failures.push(CycleFailure { cycle, error: e });
                }
            }
        }

        info!(
            processed = report.processed.len(),
            failed = report.failures.len(),
            "Run reprocessing complete"
        );
        Ok(report)
    }
}
