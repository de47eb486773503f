//! Blank/signal pairing over a flat, time-ordered frame list.
//!
//! A run captures back-to-back brackets of N frames each: an optional leading
//! test bracket, the blank bracket, any number of intermediate brackets, and
//! the signal bracket last.

use tracing::{info, instrument};

use crate::image_pipeline::common::error::{HdrError, ParameterError, Result};
use crate::image_pipeline::hdr::fuser::BracketFuser;
use crate::image_pipeline::hdr::types::{ExposureBracket, ExposureSchedule, FusionConfig, PairedResult};
use crate::image_pipeline::raw::types::RawFrame;

/// Minimum number of frames for the given layout: two brackets when the test
/// bracket was skipped during capture, three otherwise.
pub fn required_frames(bracket_len: usize, skip_test_bracket: bool) -> usize {
    let brackets = if skip_test_bracket { 2 } else { 3 };
    brackets * bracket_len
}

/// Splits `items` into its `(blank, signal)` brackets.
///
/// Generic so callers can validate a list of paths before decoding anything.
pub fn select_brackets<T>(items: &[T], bracket_len: usize, skip_test_bracket: bool) -> Result<(&[T], &[T])> {
    if bracket_len == 0 {
        return Err(ParameterError::EmptyBracket.into());
    }

    let required = required_frames(bracket_len, skip_test_bracket);
    if items.len() < required {
        return Err(HdrError::InsufficientImages {
            found: items.len(),
            required,
        });
    }

    let blank_start = if skip_test_bracket { 0 } else { bracket_len };
    let blank = &items[blank_start..blank_start + bracket_len];
    let signal = &items[items.len() - bracket_len..];
    Ok((blank, signal))
}

#[derive(Debug, Clone, Default)]
pub struct PairedHdrProcessor {
    fuser: BracketFuser,
    skip_test_bracket: bool,
}

impl PairedHdrProcessor {
    pub fn new(config: FusionConfig, skip_test_bracket: bool) -> Self {
        Self {
            fuser: BracketFuser::new(config),
            skip_test_bracket,
        }
    }

    /// Picks the blank and signal brackets out of `frames`.
    pub fn select<'a, T>(&self, frames: &'a [T], schedule: &ExposureSchedule) -> Result<(&'a [T], &'a [T])> {
        select_brackets(frames, schedule.len(), self.skip_test_bracket)
    }

    /// Selects both brackets from the full run and fuses them.
    pub fn process(&self, frames: &[RawFrame], schedule: &ExposureSchedule) -> Result<PairedResult> {
        let (blank, signal) = self.select(frames, schedule)?;
        self.process_brackets(blank, signal, schedule)
    }

    /// Fuses an already-selected blank and signal bracket.
    ///
    /// The blank is subtracted from the signal in the accumulator domain,
    /// before rescaling, so negative differences are caught by the clamp.
    #[instrument(skip_all, fields(bracket_len = schedule.len()))]
    pub fn process_brackets(
        &self,
        blank: &[RawFrame],
        signal: &[RawFrame],
        schedule: &ExposureSchedule,
    ) -> Result<PairedResult> {
        let blank_bracket = ExposureBracket::new(blank, schedule)?;
        let signal_bracket = ExposureBracket::new(signal, schedule)?;

        let blank_acc = {
            let _span = tracing::info_span!("fuse_blank").entered();
            self.fuser.accumulate(&blank_bracket)
        };
        let signal_acc = {
            let _span = tracing::info_span!("fuse_signal").entered();
            self.fuser.accumulate(&signal_bracket)
        };

        let difference = signal_acc.estimate.subtract(&blank_acc.estimate)?;

        let config = self.fuser.config();
        let result = PairedResult {
            blank: blank_acc.estimate.quantize(config),
            signal: signal_acc.estimate.quantize(config),
            corrected: difference.quantize(config),
            blank_report: blank_acc.report,
            signal_report: signal_acc.report,
        };

        info!(
            width = result.corrected.width,
            height = result.corrected.height,
            "Paired HDR processing complete"
        );
        Ok(result)
    }
}
