//! Parsing of the comma-separated parameter lists accepted at the boundary.
//!
//! All whitespace is stripped before splitting, so `"7272, 3636,1818"` and
//! `"7272,3636,1818"` parse identically.

use std::str::FromStr;

use crate::image_pipeline::common::error::{ParameterError, ParameterKind};

fn parse_list<T: FromStr>(csv: &str, kind: ParameterKind) -> Result<Vec<T>, ParameterError> {
    let compact: String = csv.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(ParameterError::Empty { kind });
    }

    compact
        .split(',')
        .map(|item| {
            item.parse::<T>().map_err(|_| ParameterError::NotNumeric {
                kind,
                value: item.to_string(),
            })
        })
        .collect()
}

/// Parses a list such as exposure times or LED intensities.
pub fn parse_float_list(csv: &str, kind: ParameterKind) -> Result<Vec<f64>, ParameterError> {
    parse_list(csv, kind)
}

/// Parses a list of non-negative integers, e.g. acquisition suffixes.
pub fn parse_index_list(csv: &str, kind: ParameterKind) -> Result<Vec<usize>, ParameterError> {
    parse_list(csv, kind)
}

/// Parses a single non-negative integer.
pub fn parse_count(text: &str, kind: ParameterKind) -> Result<usize, ParameterError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ParameterError::Empty { kind });
    }
    trimmed.parse().map_err(|_| ParameterError::NotNumeric {
        kind,
        value: trimmed.to_string(),
    })
}
