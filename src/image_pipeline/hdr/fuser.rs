//! Progressive saturation replacement.
//!
//! The brightest frame's radiance estimate seeds the accumulator. Each
//! following step swaps in the next, dimmer frame's estimate at every pixel
//! where the *previous raw frame* was above the saturation threshold. The
//! accumulator itself is never inspected, so a pixel saturated at step `i - 1`
//! always takes frame `i`'s value, and chains further if frame `i` is also
//! saturated.

use tracing::{debug, instrument, warn};

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::hdr::types::{
    ExposureBracket, ExposureSchedule, FusedImage, FusionConfig, FusionReport, RadianceEstimate,
};
use crate::image_pipeline::raw::types::RawFrame;

/// Accumulator state before rescaling and quantisation.
#[derive(Debug, Clone)]
pub struct Accumulation {
    pub estimate: RadianceEstimate,
    pub report: FusionReport,
}

#[derive(Debug, Clone, Default)]
pub struct BracketFuser {
    config: FusionConfig,
}

impl BracketFuser {
    pub fn new(config: FusionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Fuses one bracket into a quantised image.
    pub fn fuse(&self, frames: &[RawFrame], schedule: &ExposureSchedule) -> Result<FusedImage> {
        self.fuse_with_report(frames, schedule).map(|(image, _)| image)
    }

    pub fn fuse_with_report(
        &self,
        frames: &[RawFrame],
        schedule: &ExposureSchedule,
    ) -> Result<(FusedImage, FusionReport)> {
        let bracket = ExposureBracket::new(frames, schedule)?;
        let accumulation = self.accumulate(&bracket);
        Ok((accumulation.estimate.quantize(&self.config), accumulation.report))
    }

    /// Runs the replacement chain and returns the unquantised accumulator.
    ///
    /// Without a configured threshold, half the range of the bracket's own
    /// bit depth is used.
    #[instrument(skip_all, fields(frames = bracket.len(), threshold = tracing::field::Empty))]
    pub fn accumulate(&self, bracket: &ExposureBracket<'_>) -> Accumulation {
        let frames = bracket.frames();
        let schedule = bracket.schedule();
        let threshold = self.config.threshold_for(bracket.bits_per_sample());
        tracing::Span::current().record("threshold", threshold);

        let mut estimate = RadianceEstimate::from_frame(&frames[0], schedule.radiometric_divisor(0));
        let mut substitutions = Vec::with_capacity(frames.len().saturating_sub(1));

        for (step, pair) in frames.windows(2).enumerate() {
            let index = step + 1;
            let (previous, current) = (&pair[0], &pair[1]);
            let next = RadianceEstimate::from_frame(current, schedule.radiometric_divisor(index));

            let replaced = count_above(previous, threshold);
            debug!(step = index, replaced, "Replacing saturated pixels");

            estimate = estimate.select_saturated(&next, previous, threshold);
            substitutions.push(replaced);
        }

        let unresolved_pixels = count_unresolved(frames, threshold);
        if unresolved_pixels > 0 {
            warn!(
                unresolved_pixels,
                "Pixels remain saturated in the dimmest usable exposure; keeping its estimate"
            );
        }

        Accumulation {
            estimate,
            report: FusionReport {
                substitutions,
                unresolved_pixels,
            },
        }
    }
}

fn count_above(frame: &RawFrame, threshold: u32) -> usize {
    frame.data.iter().filter(|&&v| u32::from(v) > threshold).count()
}

/// Counts pixels whose value in the accumulator came from a frame that was
/// itself above the threshold.
fn count_unresolved(frames: &[RawFrame], threshold: u32) -> usize {
    (0..frames[0].pixel_count())
        .filter(|&pixel| {
            let source = (1..frames.len())
                .rev()
                .find(|&i| u32::from(frames[i - 1].data[pixel]) > threshold)
                .unwrap_or(0);
            u32::from(frames[source].data[pixel]) > threshold
        })
        .count()
}
