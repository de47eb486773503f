//! Common utilities module
//!
//! Error types and parameter parsing shared across the image pipeline.

pub mod error;
pub mod params;

pub use error::{HdrError, ParameterError, ParameterKind, Result};
pub use params::{parse_count, parse_float_list, parse_index_list};
