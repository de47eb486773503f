//! Run configuration
//!
//! Everything the workflows need is carried explicitly in [`HdrConfig`] and
//! [`AveragingPlan`]; nothing is read from ambient state.

use crate::image_pipeline::common::error::{ParameterError, ParameterKind};
use crate::image_pipeline::common::params::{parse_count, parse_index_list};
use crate::image_pipeline::hdr::types::{ExposureSchedule, FusionConfig};
use crate::image_pipeline::tiff::types::OutputConfig;

/// File extension of instrument frames
pub const DEFAULT_FRAME_EXTENSION: &str = "tif";

/// Configuration for HDR generation workflows
#[derive(Debug, Clone)]
pub struct HdrConfig {
    /// Exposure times and LED intensities of one bracket
    pub schedule: ExposureSchedule,
    /// Saturation threshold and output bit depth
    pub fusion: FusionConfig,
    /// Output TIFF encoding
    pub output: OutputConfig,
    /// True when the run has no leading test bracket, so the blank is the first bracket
    pub skip_test_bracket: bool,
    /// Extension (without dot, case-insensitive) of the frame files to pick up
    pub frame_extension: String,
}

impl Default for HdrConfig {
    fn default() -> Self {
        Self {
            schedule: ExposureSchedule::default(),
            fusion: FusionConfig::default(),
            output: OutputConfig::default(),
            skip_test_bracket: false,
            frame_extension: DEFAULT_FRAME_EXTENSION.to_string(),
        }
    }
}

impl HdrConfig {
    pub fn builder() -> HdrConfigBuilder {
        HdrConfigBuilder::default()
    }
}

/// Builder for HdrConfig
#[derive(Default)]
pub struct HdrConfigBuilder {
    schedule: Option<ExposureSchedule>,
    fusion: Option<FusionConfig>,
    output: Option<OutputConfig>,
    skip_test_bracket: Option<bool>,
    frame_extension: Option<String>,
}

impl HdrConfigBuilder {
    pub fn schedule(mut self, schedule: ExposureSchedule) -> Self {
        self.schedule = Some(schedule);
        self
    }

    pub fn fusion(mut self, fusion: FusionConfig) -> Self {
        self.fusion = Some(fusion);
        self
    }

    pub fn output(mut self, output: OutputConfig) -> Self {
        self.output = Some(output);
        self
    }

    pub fn skip_test_bracket(mut self, skip: bool) -> Self {
        self.skip_test_bracket = Some(skip);
        self
    }

    pub fn frame_extension(mut self, extension: impl Into<String>) -> Self {
        self.frame_extension = Some(extension.into());
        self
    }

    pub fn build(self) -> HdrConfig {
        let default = HdrConfig::default();
        HdrConfig {
            schedule: self.schedule.unwrap_or(default.schedule),
            fusion: self.fusion.unwrap_or(default.fusion),
            output: self.output.unwrap_or(default.output),
            skip_test_bracket: self.skip_test_bracket.unwrap_or(default.skip_test_bracket),
            frame_extension: self.frame_extension.unwrap_or(default.frame_extension),
        }
    }
}

/// Which acquisitions to average for every bracket position.
///
/// For bracket position `b`, the files averaged are those whose names end in
/// `" <a + b>"` for each acquisition index `a`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AveragingPlan {
    pub blank_acquisitions: Vec<usize>,
    pub signal_acquisitions: Vec<usize>,
    pub brackets: usize,
}

impl AveragingPlan {
    pub fn from_csv(blank: &str, signal: &str, brackets: &str) -> Result<Self, ParameterError> {
        Ok(Self {
            blank_acquisitions: parse_index_list(blank, ParameterKind::BlankAcquisitions)?,
            signal_acquisitions: parse_index_list(signal, ParameterKind::SignalAcquisitions)?,
            brackets: parse_count(brackets, ParameterKind::BracketCount)?,
        })
    }
}

impl Default for AveragingPlan {
    fn default() -> Self {
        Self {
            blank_acquisitions: vec![6, 12, 18, 24],
            signal_acquisitions: vec![30, 36, 42, 48],
            brackets: 6,
        }
    }
}
