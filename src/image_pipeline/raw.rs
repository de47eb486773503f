//! Raw frame reading module
//!
//! This module turns encoded sensor frames into single-channel sample grids.

mod reader;
mod tiff_reader;
pub mod types;

pub use reader::FrameReader;
pub use tiff_reader::TiffFrameReader;
pub use types::RawFrame;
