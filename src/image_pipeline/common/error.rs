use std::path::PathBuf;

use thiserror::Error;

/// Which user-supplied list or value a parameter error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    ExposureTimes,
    LedIntensities,
    BlankAcquisitions,
    SignalAcquisitions,
    BracketCount,
}

impl std::fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ParameterKind::ExposureTimes => "Exposure Lengths (ms)",
            ParameterKind::LedIntensities => "LED Intensities (mA)",
            ParameterKind::BlankAcquisitions => "Blank acquisitions",
            ParameterKind::SignalAcquisitions => "Signal acquisitions",
            ParameterKind::BracketCount => "Number of brackets",
        };
        f.write_str(label)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("{kind} is invalid: '{value}' is not a number. It must be a comma-separated list of numbers.")]
    NotNumeric { kind: ParameterKind, value: String },

    #[error("{kind} is empty. It must be a comma-separated list of numbers.")]
    Empty { kind: ParameterKind },

    #[error("{kind} entry {index} must be finite and nonzero, got {value}")]
    NonFinite {
        kind: ParameterKind,
        index: usize,
        value: f64,
    },

    #[error(
        "The length of Exposure Lengths (ms) ({exposures}) does not match the length of LED Intensities (mA) ({intensities})."
    )]
    MismatchedLength { exposures: usize, intensities: usize },

    #[error("Unsupported bit depth {0}; expected a value between 1 and 16")]
    UnsupportedBitDepth(u32),

    #[error("A bracket needs at least one frame")]
    EmptyBracket,

    #[error("Bracket has {frames} frames but the exposure schedule has {exposures} entries")]
    BracketLength { frames: usize, exposures: usize },
}

#[derive(Error, Debug)]
pub enum HdrError {
    #[error(transparent)]
    InvalidParameter(#[from] ParameterError),

    #[error("The selected image folder path could not be found: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("There are not enough images to generate HDR images: found {found}, need at least {required}")]
    InsufficientImages { found: usize, required: usize },

    #[error("Failed to read input file: {0}")]
    InputReadError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("Failed to decode TIFF image: {0}")]
    DecodeError(String),

    #[error("Failed to encode TIFF image: {0}")]
    EncodeError(String),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Frame dimensions differ: expected {expected:?}, found {found:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Frame bit depths differ: expected {expected}, found {found}")]
    BitDepthMismatch { expected: u32, found: u32 },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HdrError>;
