use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use crate::image_pipeline::{
    averaging::average_frames,
    common::error::{HdrError, Result},
    hdr::{BracketFuser, FusedImage, PairedHdrProcessor, PairedResult},
    raw::{FrameReader, RawFrame, TiffFrameReader},
    tiff::{StandardTiffWriter, TiffWriter},
    workflows::config::{AveragingPlan, HdrConfig},
    workflows::scan::{find_acquisition, list_frames},
};

/// Default output names for standalone generation.
pub const SIGNAL_FILE_NAME: &str = "HDR Signal";
pub const BLANK_FILE_NAME: &str = "HDR Blank";
/// Folder created next to the image folder for averaged frames.
pub const AVERAGE_FOLDER_NAME: &str = "Avg_images";

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}

pub struct HdrPipeline<R: FrameReader, W: TiffWriter> {
    reader: R,
    writer: W,
    config: HdrConfig,
}

impl HdrPipeline<TiffFrameReader, StandardTiffWriter> {
    pub fn new(config: HdrConfig) -> Self {
        Self {
            reader: TiffFrameReader,
            writer: StandardTiffWriter,
            config,
        }
    }
}

impl<R: FrameReader, W: TiffWriter> HdrPipeline<R, W> {
    pub fn with_custom(reader: R, writer: W, config: HdrConfig) -> Self {
        Self {
            reader,
            writer,
            config,
        }
    }

    pub fn config(&self) -> &HdrConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: HdrConfig) {
        self.config = config;
    }

    pub(crate) fn output_file(&self, dir: &Path, name: &str) -> PathBuf {
        dir.join(format!("{}.{}", name, self.config.frame_extension))
    }

    pub(crate) fn load_frame(&self, path: &Path) -> Result<RawFrame> {
        let data = fs::read(path)
            .map_err(|e| HdrError::InputReadError(format!("{}: {}", path.display(), e)))?;
        self.reader.read_frame(&data)
    }

    pub(crate) fn load_frames(&self, paths: &[PathBuf]) -> Result<Vec<RawFrame>> {
        paths.iter().map(|path| self.load_frame(path)).collect()
    }

    pub(crate) fn write_image(&self, image: &FusedImage, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| HdrError::OutputWriteError(format!("{}: {}", parent.display(), e)))?;
        }
        let mut output_file = fs::File::create(path)
            .map_err(|e| HdrError::OutputWriteError(format!("{}: {}", path.display(), e)))?;
        self.writer.write_tiff(image, &mut output_file, &self.config.output)?;
        info!(output = %path.display(), "Wrote image");
        Ok(())
    }

    /// Writes every image to a staging file next to its target, then renames
    /// them all into place. If any write fails, the staged files are removed
    /// and no target is touched.
    pub(crate) fn write_images(&self, outputs: &[(&FusedImage, PathBuf)]) -> Result<()> {
        let staged: Vec<PathBuf> = outputs.iter().map(|(_, path)| staging_path(path)).collect();

        let written = outputs
            .iter()
            .zip(&staged)
            .try_for_each(|((image, _), staging)| self.write_image(image, staging));
        if let Err(e) = written {
            for staging in &staged {
                let _ = fs::remove_file(staging);
            }
            return Err(e);
        }

        for ((_, path), staging) in outputs.iter().zip(&staged) {
            fs::rename(staging, path)
                .map_err(|e| HdrError::OutputWriteError(format!("{}: {}", path.display(), e)))?;
        }
        Ok(())
    }

    /// Generates the blank and background-subtracted signal HDR images for
    /// the run in `image_dir`.
    ///
    /// Writes `<blank_dir>/<blank_name>.tif` and `<signal_dir>/<signal_name>.tif`.
    /// All parameter and frame-count checks run before any file is decoded, and
    /// neither file is created unless both images encode successfully.
    pub fn generate_hdr_images<P: AsRef<Path>, Q: AsRef<Path>, S: AsRef<Path>>(
        &self,
        image_dir: P,
        signal_dir: Q,
        blank_dir: S,
        signal_name: &str,
        blank_name: &str,
    ) -> Result<PairedResult> {
        self.generate_paired(
            image_dir.as_ref(),
            signal_dir.as_ref(),
            blank_dir.as_ref(),
            signal_name,
            blank_name,
            self.config.skip_test_bracket,
        )
    }

    /// Standalone mode: writes `HDR Signal` and `HDR Blank` into `image_dir` itself.
    pub fn generate_in_place<P: AsRef<Path>>(&self, image_dir: P) -> Result<PairedResult> {
        let image_dir = image_dir.as_ref();
        self.generate_hdr_images(image_dir, image_dir, image_dir, SIGNAL_FILE_NAME, BLANK_FILE_NAME)
    }

    #[instrument(skip(self, image_dir, signal_dir, blank_dir), fields(image_dir = %image_dir.display()))]
    pub(crate) fn generate_paired(
        &self,
        image_dir: &Path,
        signal_dir: &Path,
        blank_dir: &Path,
        signal_name: &str,
        blank_name: &str,
        skip_test_bracket: bool,
    ) -> Result<PairedResult> {
        if !image_dir.exists() {
            return Err(HdrError::PathNotFound(image_dir.to_path_buf()));
        }

        let processor = PairedHdrProcessor::new(self.config.fusion, skip_test_bracket);
        let paths = list_frames(image_dir, &self.config.frame_extension)?;
        let (blank_paths, signal_paths) = processor.select(&paths, &self.config.schedule)?;

        let (blank, signal) = {
            let _span = tracing::info_span!("load_frames", count = blank_paths.len() * 2).entered();
            (self.load_frames(blank_paths)?, self.load_frames(signal_paths)?)
        };

        let result = processor.process_brackets(&blank, &signal, &self.config.schedule)?;

        {
            let _span = tracing::info_span!("write_outputs").entered();
            self.write_images(&[
                (&result.blank, self.output_file(blank_dir, blank_name)),
                (&result.corrected, self.output_file(signal_dir, signal_name)),
            ])?;
        }

        Ok(result)
    }

    /// Fuses every consecutive group of N frames in `raw_dir` on its own and
    /// writes `Autofocus HDR <k>.tif` files to `output_dir`.
    ///
    /// A trailing group shorter than the schedule is fused with the leading
    /// schedule steps.
    #[instrument(skip(self, raw_dir, output_dir))]
    pub fn generate_autofocus_hdr_images<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        raw_dir: P,
        output_dir: Q,
    ) -> Result<Vec<PathBuf>> {
        let raw_dir = raw_dir.as_ref();
        let output_dir = output_dir.as_ref();
        info!(
            input = %raw_dir.display(),
            output = %output_dir.display(),
            "Generating autofocus HDR images"
        );

        let schedule = &self.config.schedule;
        let fuser = BracketFuser::new(self.config.fusion);
        let paths = list_frames(raw_dir, &self.config.frame_extension)?;

        let mut written = Vec::new();
        for (index, chunk) in paths.chunks(schedule.len()).enumerate() {
            let frames = self.load_frames(chunk)?;
            let image = if chunk.len() < schedule.len() {
                warn!(
                    frames = chunk.len(),
                    expected = schedule.len(),
                    "Trailing autofocus bracket is incomplete"
                );
                fuser.fuse(&frames, &schedule.truncated(chunk.len())?)?
            } else {
                fuser.fuse(&frames, schedule)?
            };

            let path = self.output_file(output_dir, &format!("Autofocus HDR {index}"));
            self.write_image(&image, &path)?;
            written.push(path);
        }

        Ok(written)
    }

    /// Averages repeated acquisitions of every bracket position.
    ///
    /// Writes `Blank_Avg <b>.tif` and `Signal_Avg <b>.tif` into an
    /// `Avg_images` folder next to `image_dir`.
    #[instrument(skip(self, image_dir), fields(brackets = plan.brackets))]
    pub fn average_acquisitions<P: AsRef<Path>>(
        &self,
        image_dir: P,
        plan: &AveragingPlan,
    ) -> Result<Vec<PathBuf>> {
        let image_dir = image_dir.as_ref();
        if !image_dir.is_dir() {
            return Err(HdrError::PathNotFound(image_dir.to_path_buf()));
        }

        let image_dir = fs::canonicalize(image_dir)?;
        let save_dir = image_dir
            .parent()
            .unwrap_or(image_dir.as_path())
            .join(AVERAGE_FOLDER_NAME);

        let mut written = Vec::new();
        for (prefix, acquisitions) in [
            ("Blank_Avg", &plan.blank_acquisitions),
            ("Signal_Avg", &plan.signal_acquisitions),
        ] {
            for bracket in 0..plan.brackets {
                let paths = acquisitions
                    .iter()
                    .map(|&a| find_acquisition(&image_dir, &self.config.frame_extension, a + bracket))
                    .collect::<Result<Vec<_>>>()?;
                let averaged = average_frames(&self.load_frames(&paths)?)?;

                let path = self.output_file(&save_dir, &format!("{prefix} {bracket}"));
                self.write_image(&FusedImage::from(averaged), &path)?;
                written.push(path);
            }
        }

        Ok(written)
    }
}
