use crate::image_pipeline::common::error::{HdrError, ParameterError};
use crate::image_pipeline::hdr::{
    BracketFuser, ExposureBracket, ExposureSchedule, FusionConfig, PairedHdrProcessor, select_brackets,
};
use crate::image_pipeline::raw::types::RawFrame;

fn frame(width: usize, height: usize, data: Vec<u16>) -> RawFrame {
    RawFrame::new(width, height, data, 16).unwrap()
}

fn uniform(value: u16) -> RawFrame {
    frame(2, 2, vec![value; 4])
}

/// Divisors of exactly 0.25, 0.125 and 0.0625, so radiances are 4v, 8v and 16v.
fn power_of_two_schedule(len: usize) -> ExposureSchedule {
    let times = [250_000.0, 125_000.0, 62_500.0];
    ExposureSchedule::new(times[..len].to_vec(), vec![1.0; len]).unwrap()
}

#[test]
fn test_single_frame_is_normalized_and_rounded_half_to_even() {
    let fuser = BracketFuser::default();
    let schedule = power_of_two_schedule(1);
    // 4v / 256 = v / 64: 1.0, 1.5, 2.5, 0.5
    let input = frame(2, 2, vec![64, 96, 160, 32]);

    let (image, report) = fuser.fuse_with_report(&[input], &schedule).unwrap();

    assert_eq!(image.data, vec![1, 2, 2, 0]);
    assert_eq!(image.bit_depth, 16);
    assert!(report.substitutions.is_empty());
    assert_eq!(report.unresolved_pixels, 0);
}

#[test]
fn test_saturated_pixels_chain_to_dimmer_frames() {
    let fuser = BracketFuser::default();
    let schedule = power_of_two_schedule(3);
    let frames = vec![
        frame(2, 2, vec![100, 40_000, 40_000, 40_000]),
        frame(2, 2, vec![50, 20_000, 40_000, 40_000]),
        frame(2, 2, vec![25, 10_000, 20_000, 40_000]),
    ];

    let (image, report) = fuser.fuse_with_report(&frames, &schedule).unwrap();

    // px0 from frame 0 (400), px1 from frame 1 (160000), px2 and px3 from frame 2.
    assert_eq!(image.data, vec![2, 625, 1250, 2500]);
    assert_eq!(report.substitutions, vec![3, 2]);
    assert_eq!(report.unresolved_pixels, 1);
}

#[test]
fn test_unsaturated_pixels_never_look_ahead() {
    let fuser = BracketFuser::default();
    let schedule = power_of_two_schedule(3);
    let base = vec![
        frame(2, 2, vec![100, 40_000, 200, 300]),
        frame(2, 2, vec![50, 20_000, 100, 150]),
        frame(2, 2, vec![25, 10_000, 50, 75]),
    ];
    let mut perturbed = base.clone();
    perturbed[2] = frame(2, 2, vec![9_999, 9_999, 9_999, 9_999]);

    let expected = fuser.fuse(&base, &schedule).unwrap();
    let actual = fuser.fuse(&perturbed, &schedule).unwrap();

    assert_eq!(expected, actual);
}

#[test]
fn test_threshold_is_strict() {
    let fuser = BracketFuser::default();
    let schedule = power_of_two_schedule(2);
    let frames = vec![frame(1, 2, vec![32_768, 32_769]), frame(1, 2, vec![64, 64])];

    let image = fuser.fuse(&frames, &schedule).unwrap();

    // 32768 * 4 / 256 = 512 is kept; 32769 is replaced by 64 * 8 / 256 = 2.
    assert_eq!(image.data, vec![512, 2]);
}

#[test]
fn test_fusion_is_deterministic() {
    let fuser = BracketFuser::default();
    let schedule = ExposureSchedule::default();
    let frames: Vec<RawFrame> = (0..6u16)
        .map(|i| frame(2, 2, vec![60_000 >> i, 1_000 >> i, 33_000 >> i, 12_345 >> i]))
        .collect();

    let first = fuser.fuse(&frames, &schedule).unwrap();
    let second = fuser.fuse(&frames, &schedule).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_output_is_clamped_to_target_range() {
    let schedule = ExposureSchedule::new(vec![1.0], vec![1.0]).unwrap();
    let input = uniform(u16::MAX);

    let wide = BracketFuser::default().fuse(&[input.clone()], &schedule).unwrap();
    assert!(wide.data.iter().all(|&v| v == u16::MAX));

    let config = FusionConfig::builder().target_bit_depth(8).build().unwrap();
    let narrow = BracketFuser::new(config).fuse(&[input], &schedule).unwrap();
    assert_eq!(narrow.bit_depth, 8);
    assert!(narrow.data.iter().all(|&v| v == 255));
}

#[test]
fn test_fuse_rejects_mismatched_frame_dimensions() {
    let schedule = power_of_two_schedule(2);
    let frames = vec![uniform(10), frame(4, 1, vec![10; 4])];

    let result = BracketFuser::default().fuse(&frames, &schedule);

    assert!(matches!(result, Err(HdrError::DimensionMismatch { .. })));
}

#[test]
fn test_fuse_rejects_frame_count_not_matching_schedule() {
    let schedule = power_of_two_schedule(3);
    let result = BracketFuser::default().fuse(&[uniform(1), uniform(1)], &schedule);

    assert!(matches!(
        result,
        Err(HdrError::InvalidParameter(ParameterError::BracketLength { frames: 2, exposures: 3 }))
    ));
}

#[test]
fn test_schedule_validation() {
    let mismatched = ExposureSchedule::new(vec![7272.0, 3636.0], vec![12.4]).unwrap_err();
    assert_eq!(
        mismatched,
        ParameterError::MismatchedLength {
            exposures: 2,
            intensities: 1
        }
    );
    assert!(matches!(
        HdrError::from(mismatched),
        HdrError::InvalidParameter(ParameterError::MismatchedLength { .. })
    ));

    assert!(matches!(
        ExposureSchedule::new(vec![7272.0, 0.0], vec![12.4, 12.4]),
        Err(ParameterError::NonFinite { index: 1, .. })
    ));
    assert!(matches!(
        ExposureSchedule::new(vec![7272.0], vec![f64::NAN]),
        Err(ParameterError::NonFinite { index: 0, .. })
    ));
    assert!(ExposureSchedule::new(vec![], vec![]).is_err());
}

#[test]
fn test_schedule_from_csv_matches_default() {
    let parsed = ExposureSchedule::from_csv(
        "7272, 3636, 1818, 909, 455, 228",
        "12.4, 12.4, 12.4, 12.4, 12.4, 12.4",
    )
    .unwrap();
    assert_eq!(parsed, ExposureSchedule::default());
}

#[test]
fn test_fusion_config_builder() {
    let default = FusionConfig::builder().build().unwrap();
    assert_eq!(default, FusionConfig::default());
    assert_eq!(default.saturation_threshold(), None);
    assert_eq!(default.threshold_for(16), 32_768);
    assert_eq!(default.threshold_for(8), 128);

    let twelve_bit = FusionConfig::builder().source_bit_depth(12).build().unwrap();
    assert_eq!(twelve_bit.saturation_threshold(), Some(2_048));
    assert_eq!(twelve_bit.threshold_for(16), 2_048);

    let explicit = FusionConfig::builder()
        .source_bit_depth(12)
        .saturation_threshold(4_000)
        .build()
        .unwrap();
    assert_eq!(explicit.threshold_for(8), 4_000);

    assert_eq!(
        FusionConfig::builder().target_bit_depth(17).build(),
        Err(ParameterError::UnsupportedBitDepth(17))
    );
    assert_eq!(
        FusionConfig::builder().source_bit_depth(0).build(),
        Err(ParameterError::UnsupportedBitDepth(0))
    );
}

#[test]
fn test_max_output_value_covers_target_range() {
    let sixteen = FusionConfig::default();
    assert_eq!(sixteen.max_output_value(), u16::MAX);

    let one = FusionConfig::builder().target_bit_depth(1).build().unwrap();
    assert_eq!(one.max_output_value(), 1);
}

#[test]
fn test_eight_bit_bracket_uses_its_own_threshold() {
    let fuser = BracketFuser::default();
    let schedule = power_of_two_schedule(2);
    let frames = vec![
        RawFrame::new(1, 1, vec![255], 8).unwrap(),
        RawFrame::new(1, 1, vec![100], 8).unwrap(),
    ];

    let (image, report) = fuser.fuse_with_report(&frames, &schedule).unwrap();

    // 255 > 128, so the pixel takes 8 * 100 / 256 = 3.125 from the dimmer frame.
    assert_eq!(image.data, vec![3]);
    assert_eq!(report.substitutions, vec![1]);
    assert_eq!(report.unresolved_pixels, 0);
}

#[test]
fn test_fixed_source_depth_overrides_frame_depth() {
    let config = FusionConfig::builder().source_bit_depth(16).build().unwrap();
    let fuser = BracketFuser::new(config);
    let schedule = power_of_two_schedule(2);
    let frames = vec![
        RawFrame::new(1, 1, vec![255], 8).unwrap(),
        RawFrame::new(1, 1, vec![100], 8).unwrap(),
    ];

    let image = fuser.fuse(&frames, &schedule).unwrap();

    // 4 * 255 / 256 = 3.98, kept from the brighter frame.
    assert_eq!(image.data, vec![4]);
}

#[test]
fn test_mixed_bit_depths_are_rejected() {
    let schedule = power_of_two_schedule(2);
    let frames = vec![
        RawFrame::new(1, 1, vec![255], 8).unwrap(),
        RawFrame::new(1, 1, vec![100], 16).unwrap(),
    ];

    let result = ExposureBracket::new(&frames, &schedule);

    assert!(matches!(
        result,
        Err(HdrError::BitDepthMismatch { expected: 8, found: 16 })
    ));
}

#[test]
fn test_select_brackets_layouts() {
    let items: Vec<usize> = (0..15).collect();

    let (blank, signal) = select_brackets(&items, 3, true).unwrap();
    assert_eq!(blank, &[0, 1, 2]);
    assert_eq!(signal, &[12, 13, 14]);

    let (blank, signal) = select_brackets(&items, 3, false).unwrap();
    assert_eq!(blank, &[3, 4, 5]);
    assert_eq!(signal, &[12, 13, 14]);
}

#[test]
fn test_insufficient_images() {
    let items = vec![(); 10];
    let result = select_brackets(&items, 6, false);
    assert!(matches!(
        result,
        Err(HdrError::InsufficientImages { found: 10, required: 18 })
    ));
}

#[test]
fn test_paired_subtracts_before_rescale() {
    let schedule = power_of_two_schedule(1);
    let processor = PairedHdrProcessor::new(FusionConfig::default(), true);
    // blank 32 -> 128 -> 0.5; signal 96 -> 384 -> 1.5
    let frames = vec![uniform(32), uniform(96)];

    let result = processor.process(&frames, &schedule).unwrap();

    assert_eq!(result.blank.data, vec![0; 4]);
    assert_eq!(result.signal.data, vec![2; 4]);
    // (384 - 128) / 256 = 1, while 2 - 0 would give 2.
    assert_eq!(result.corrected.data, vec![1; 4]);
}

#[test]
fn test_paired_clamps_negative_difference() {
    let schedule = power_of_two_schedule(1);
    let processor = PairedHdrProcessor::new(FusionConfig::default(), true);
    let frames = vec![uniform(1_000), uniform(200)];

    let result = processor.process(&frames, &schedule).unwrap();

    assert_eq!(result.corrected.data, vec![0; 4]);
    assert_eq!(result.blank.data, vec![16; 4]);
}

#[test]
fn test_paired_ignores_test_and_intermediate_brackets() {
    let schedule = power_of_two_schedule(1);
    let processor = PairedHdrProcessor::new(FusionConfig::default(), false);
    // test, blank, two intermediates, signal
    let frames = vec![uniform(9_000), uniform(64), uniform(7_000), uniform(8_000), uniform(192)];

    let result = processor.process(&frames, &schedule).unwrap();

    assert_eq!(result.blank.data, vec![1; 4]);
    assert_eq!(result.signal.data, vec![3; 4]);
    assert_eq!(result.corrected.data, vec![2; 4]);
}

fn synthetic_bracket(base: impl Fn(usize) -> u32) -> Vec<RawFrame> {
    (0..6)
        .map(|step| {
            let data = (0..16)
                .map(|pixel| (base(pixel) << (5 - step)).min(u32::from(u16::MAX)) as u16)
                .collect();
            frame(4, 4, data)
        })
        .collect()
}

#[test]
fn test_twelve_frame_run_without_test_bracket() {
    let schedule = ExposureSchedule::default();
    let processor = PairedHdrProcessor::new(FusionConfig::default(), true);
    let fuser = BracketFuser::default();

    let mut frames = synthetic_bracket(|pixel| 50 + pixel as u32 * 10);
    frames.extend(synthetic_bracket(|pixel| 100 + pixel as u32 * 1_000));

    let result = processor.process(&frames, &schedule).unwrap();

    assert_eq!(result.blank, fuser.fuse(&frames[0..6], &schedule).unwrap());
    assert_eq!(result.signal, fuser.fuse(&frames[6..12], &schedule).unwrap());

    let blank_acc = fuser.accumulate(&ExposureBracket::new(&frames[0..6], &schedule).unwrap());
    let signal_acc = fuser.accumulate(&ExposureBracket::new(&frames[6..12], &schedule).unwrap());
    let expected = signal_acc
        .estimate
        .subtract(&blank_acc.estimate)
        .unwrap()
        .quantize(fuser.config());
    assert_eq!(result.corrected, expected);

    assert!(
        result
            .corrected
            .data
            .iter()
            .zip(&result.signal.data)
            .all(|(corrected, signal)| corrected <= signal)
    );
    assert!(result.signal_report.substitutions.iter().sum::<usize>() > 0);
}

#[test]
fn test_paired_rejects_short_run_before_fusing() {
    let schedule = ExposureSchedule::default();
    let processor = PairedHdrProcessor::new(FusionConfig::default(), false);
    let frames = vec![uniform(1); 10];

    let result = processor.process(&frames, &schedule);

    assert!(matches!(
        result,
        Err(HdrError::InsufficientImages { found: 10, required: 18 })
    ));
}
