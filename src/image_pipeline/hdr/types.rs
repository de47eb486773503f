//! Data model for bracket fusion

use crate::image_pipeline::common::error::{HdrError, ParameterError, ParameterKind, Result};
use crate::image_pipeline::common::params::parse_float_list;
use crate::image_pipeline::raw::types::RawFrame;

/// Fixed divisor applied to the radiance accumulator before quantisation.
///
/// Tied to the instrument's 16-bit sensor; changing it changes every output.
pub const RESCALE_DIVISOR: f32 = 256.0;

/// Exposure times are entered in microsecond-scaled units.
const EXPOSURE_UNIT: f64 = 1e-6;

/// Exposure times and LED intensities for one bracket, longest/brightest first.
#[derive(Debug, Clone, PartialEq)]
pub struct ExposureSchedule {
    exposure_times: Vec<f64>,
    led_intensities: Vec<f64>,
}

impl ExposureSchedule {
    /// Validates and builds a schedule.
    ///
    /// Both lists must have the same nonzero length and every entry must be
    /// finite and nonzero, including once the radiometric divisor is narrowed
    /// to `f32`.
    pub fn new(exposure_times: Vec<f64>, led_intensities: Vec<f64>) -> std::result::Result<Self, ParameterError> {
        if exposure_times.len() != led_intensities.len() {
            return Err(ParameterError::MismatchedLength {
                exposures: exposure_times.len(),
                intensities: led_intensities.len(),
            });
        }
        if exposure_times.is_empty() {
            return Err(ParameterError::Empty {
                kind: ParameterKind::ExposureTimes,
            });
        }

        for (kind, values) in [
            (ParameterKind::ExposureTimes, &exposure_times),
            (ParameterKind::LedIntensities, &led_intensities),
        ] {
            if let Some((index, &value)) = values
                .iter()
                .enumerate()
                .find(|&(_, v)| !v.is_finite() || *v == 0.0)
            {
                return Err(ParameterError::NonFinite { kind, index, value });
            }
        }

        let schedule = Self {
            exposure_times,
            led_intensities,
        };
        if let Some(index) = (0..schedule.len()).find(|&i| {
            let divisor = schedule.radiometric_divisor(i);
            !divisor.is_finite() || divisor == 0.0
        }) {
            return Err(ParameterError::NonFinite {
                kind: ParameterKind::ExposureTimes,
                index,
                value: schedule.exposure_times[index],
            });
        }

        Ok(schedule)
    }

    /// Parses both lists from their comma-separated form.
    pub fn from_csv(exposure_times: &str, led_intensities: &str) -> std::result::Result<Self, ParameterError> {
        let exposure_times = parse_float_list(exposure_times, ParameterKind::ExposureTimes)?;
        let led_intensities = parse_float_list(led_intensities, ParameterKind::LedIntensities)?;
        Self::new(exposure_times, led_intensities)
    }

    pub fn len(&self) -> usize {
        self.exposure_times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exposure_times.is_empty()
    }

    /// `exposure_time * led_intensity * 1e-6` for step `index`, as `f32`.
    pub fn radiometric_divisor(&self, index: usize) -> f32 {
        (self.exposure_times[index] * self.led_intensities[index] * EXPOSURE_UNIT) as f32
    }

    /// The first `len` steps of the schedule.
    pub fn truncated(&self, len: usize) -> std::result::Result<Self, ParameterError> {
        let len = len.min(self.len());
        Self::new(
            self.exposure_times[..len].to_vec(),
            self.led_intensities[..len].to_vec(),
        )
    }
}

impl Default for ExposureSchedule {
    /// The instrument's standard six-step bracket.
    fn default() -> Self {
        Self {
            exposure_times: vec![7272.0, 3636.0, 1818.0, 909.0, 455.0, 228.0],
            led_intensities: vec![12.4; 6],
        }
    }
}

/// Frames paired with the schedule they were captured under.
#[derive(Debug, Clone, Copy)]
pub struct ExposureBracket<'a> {
    frames: &'a [RawFrame],
    schedule: &'a ExposureSchedule,
}

impl<'a> ExposureBracket<'a> {
    /// Checks that there is one frame per schedule step and that all frames
    /// share the first frame's dimensions and bit depth.
    pub fn new(frames: &'a [RawFrame], schedule: &'a ExposureSchedule) -> Result<Self> {
        let first = frames.first().ok_or(ParameterError::EmptyBracket)?;
        if frames.len() != schedule.len() {
            return Err(ParameterError::BracketLength {
                frames: frames.len(),
                exposures: schedule.len(),
            }
            .into());
        }
        if let Some(other) = frames.iter().find(|f| f.dimensions() != first.dimensions()) {
            return Err(HdrError::DimensionMismatch {
                expected: first.dimensions(),
                found: other.dimensions(),
            });
        }
        if let Some(other) = frames.iter().find(|f| f.bits_per_sample != first.bits_per_sample) {
            return Err(HdrError::BitDepthMismatch {
                expected: first.bits_per_sample,
                found: other.bits_per_sample,
            });
        }
        Ok(Self { frames, schedule })
    }

    pub fn frames(&self) -> &'a [RawFrame] {
        self.frames
    }

    pub fn schedule(&self) -> &'a ExposureSchedule {
        self.schedule
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn dimensions(&self) -> (usize, usize) {
        self.frames[0].dimensions()
    }

    pub fn bits_per_sample(&self) -> u32 {
        self.frames[0].bits_per_sample
    }
}

/// Parameters of a fusion run.
///
/// Built through [`FusionConfig::builder`] so the bit depths are always in range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionConfig {
    /// `None` derives the threshold from each bracket's own bit depth
    saturation_threshold: Option<u32>,
    target_bit_depth: u32,
}

impl FusionConfig {
    /// Half the representable range of a `bits`-deep source, e.g. 32768 for 16 bits.
    pub fn default_threshold(source_bit_depth: u32) -> u32 {
        ((1u64 << source_bit_depth.min(32)) / 2) as u32
    }

    pub fn builder() -> FusionConfigBuilder {
        FusionConfigBuilder::default()
    }

    /// The configured threshold, if one was fixed up front.
    pub fn saturation_threshold(&self) -> Option<u32> {
        self.saturation_threshold
    }

    /// Threshold applied to frames captured at `source_bit_depth`.
    pub fn threshold_for(&self, source_bit_depth: u32) -> u32 {
        self.saturation_threshold
            .unwrap_or_else(|| Self::default_threshold(source_bit_depth))
    }

    /// Bit depth of the quantised output (1..=16).
    pub fn target_bit_depth(&self) -> u32 {
        self.target_bit_depth
    }

    /// Largest value representable at the target bit depth.
    pub fn max_output_value(&self) -> u16 {
        ((1u32 << self.target_bit_depth.min(16)) - 1) as u16
    }
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            saturation_threshold: None,
            target_bit_depth: 16,
        }
    }
}

/// Builder for FusionConfig
#[derive(Default)]
pub struct FusionConfigBuilder {
    source_bit_depth: Option<u32>,
    saturation_threshold: Option<u32>,
    target_bit_depth: Option<u32>,
}

impl FusionConfigBuilder {
    /// Fixes the threshold to the default for this source depth instead of
    /// reading it from the frames.
    pub fn source_bit_depth(mut self, bits: u32) -> Self {
        self.source_bit_depth = Some(bits);
        self
    }

    /// Overrides any threshold derived from a bit depth.
    pub fn saturation_threshold(mut self, threshold: u32) -> Self {
        self.saturation_threshold = Some(threshold);
        self
    }

    pub fn target_bit_depth(mut self, bits: u32) -> Self {
        self.target_bit_depth = Some(bits);
        self
    }

    pub fn build(self) -> std::result::Result<FusionConfig, ParameterError> {
        let target_bits = self.target_bit_depth.unwrap_or(16);
        for bits in self.source_bit_depth.into_iter().chain([target_bits]) {
            if !(1..=16).contains(&bits) {
                return Err(ParameterError::UnsupportedBitDepth(bits));
            }
        }

        Ok(FusionConfig {
            saturation_threshold: self
                .saturation_threshold
                .or_else(|| self.source_bit_depth.map(FusionConfig::default_threshold)),
            target_bit_depth: target_bits,
        })
    }
}

/// Exposure-normalised per-pixel flux estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct RadianceEstimate {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl RadianceEstimate {
    /// `frame / divisor`, pixel by pixel.
    pub fn from_frame(frame: &RawFrame, divisor: f32) -> Self {
        Self {
            width: frame.width,
            height: frame.height,
            data: frame.data.iter().map(|&v| f32::from(v) / divisor).collect(),
        }
    }

    /// Takes `replacement` wherever `mask_frame` is above `threshold`, `self` elsewhere.
    pub fn select_saturated(&self, replacement: &RadianceEstimate, mask_frame: &RawFrame, threshold: u32) -> Self {
        let data = self
            .data
            .iter()
            .zip(&replacement.data)
            .zip(&mask_frame.data)
            .map(|((&kept, &next), &raw)| if u32::from(raw) > threshold { next } else { kept })
            .collect();
        Self {
            width: self.width,
            height: self.height,
            data,
        }
    }

    /// Pixel-wise `self - other`; negative results are kept.
    pub fn subtract(&self, other: &RadianceEstimate) -> Result<Self> {
        if (self.width, self.height) != (other.width, other.height) {
            return Err(HdrError::DimensionMismatch {
                expected: (self.width, self.height),
                found: (other.width, other.height),
            });
        }
        Ok(Self {
            width: self.width,
            height: self.height,
            data: self.data.iter().zip(&other.data).map(|(a, b)| a - b).collect(),
        })
    }

    /// Rescales by [`RESCALE_DIVISOR`], clamps negatives to zero and rounds
    /// half-to-even into the target integer range.
    pub fn quantize(&self, config: &FusionConfig) -> FusedImage {
        let max_value = f32::from(config.max_output_value());
        let data = self
            .data
            .iter()
            .map(|&v| {
                let scaled = (v / RESCALE_DIVISOR).max(0.0);
                scaled.round_ties_even().min(max_value) as u16
            })
            .collect();
        FusedImage {
            width: self.width,
            height: self.height,
            data,
            bit_depth: config.target_bit_depth(),
        }
    }
}

/// Final quantised single-channel image.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u16>,
    pub bit_depth: u32,
}

impl From<RawFrame> for FusedImage {
    fn from(frame: RawFrame) -> Self {
        Self {
            width: frame.width,
            height: frame.height,
            data: frame.data,
            bit_depth: frame.bits_per_sample,
        }
    }
}

/// Diagnostics gathered while fusing one bracket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FusionReport {
    /// `substitutions[i - 1]` is the number of pixels step `i` replaced
    pub substitutions: Vec<usize>,
    /// Pixels whose final estimate still comes from a saturated frame
    pub unresolved_pixels: usize,
}

/// Outputs of paired blank/signal processing.
#[derive(Debug, Clone, PartialEq)]
pub struct PairedResult {
    pub blank: FusedImage,
    /// Signal bracket fused on its own, without background subtraction
    pub signal: FusedImage,
    /// Signal minus blank, subtracted before quantisation
    pub corrected: FusedImage,
    pub blank_report: FusionReport,
    pub signal_report: FusionReport,
}
