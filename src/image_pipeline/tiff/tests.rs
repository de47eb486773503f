use std::io::Cursor;

use tiff::encoder::{TiffEncoder, colortype};

use crate::image_pipeline::common::error::HdrError;
use crate::image_pipeline::hdr::FusedImage;
use crate::image_pipeline::raw::{FrameReader, TiffFrameReader};
use crate::image_pipeline::tiff::{OutputConfig, StandardTiffWriter, TiffCompression, TiffWriter};

fn encode(image: &FusedImage, config: &OutputConfig) -> Vec<u8> {
    let mut bytes = Vec::new();
    StandardTiffWriter.write_tiff(image, &mut bytes, config).unwrap();
    bytes
}

#[test]
fn test_eight_bit_image_reads_back_as_eight_bit_frame() {
    let image = FusedImage {
        width: 3,
        height: 2,
        data: vec![0, 1, 127, 128, 254, 255],
        bit_depth: 8,
    };

    let bytes = encode(&image, &OutputConfig::default());
    let frame = TiffFrameReader.read_frame(&bytes).unwrap();

    assert_eq!(frame.dimensions(), (3, 2));
    assert_eq!(frame.bits_per_sample, 8);
    assert_eq!(frame.data, image.data);
}

#[test]
fn test_compressed_sixteen_bit_round_trip() {
    let image = FusedImage {
        width: 2,
        height: 2,
        data: vec![0, 256, 40_000, u16::MAX],
        bit_depth: 16,
    };
    let config = OutputConfig::builder()
        .compression(TiffCompression::DeflateBalanced)
        .build();

    let frame = TiffFrameReader.read_frame(&encode(&image, &config)).unwrap();

    assert_eq!(frame.bits_per_sample, 16);
    assert_eq!(frame.data, image.data);
}

#[test]
fn test_colour_tiff_is_rejected() {
    let mut bytes = Vec::new();
    TiffEncoder::new(Cursor::new(&mut bytes))
        .unwrap()
        .write_image::<colortype::RGB8>(1, 1, &[10, 20, 30])
        .unwrap();

    let result = TiffFrameReader.read_frame(&bytes);

    assert!(matches!(result, Err(HdrError::UnsupportedFormat(_))));
}

#[test]
fn test_garbage_bytes_fail_to_decode() {
    let result = TiffFrameReader.read_frame(b"not a tiff");

    assert!(matches!(result, Err(HdrError::DecodeError(_))));
}
