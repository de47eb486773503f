//! Directory scanning and naming conventions for instrument runs.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::debug;

use crate::image_pipeline::common::error::{HdrError, Result};

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

fn read_dir_checked(dir: &Path) -> Result<fs::ReadDir> {
    if !dir.is_dir() {
        return Err(HdrError::PathNotFound(dir.to_path_buf()));
    }
    fs::read_dir(dir).map_err(|e| HdrError::InputReadError(format!("{}: {}", dir.display(), e)))
}

/// Frame files in `dir`, oldest first by modification time.
///
/// Files with identical timestamps are ordered by name.
pub fn list_frames(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut frames = Vec::new();
    for entry in read_dir_checked(dir)? {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, extension) {
            let modified = fs::metadata(&path)?.modified()?;
            frames.push((modified, path));
        }
    }

    frames.sort();
    debug!(dir = %dir.display(), count = frames.len(), "Found frames");
    Ok(frames.into_iter().map(|(_, path)| path).collect())
}

/// True for names like `"001 - Cycle"`: three digits followed by `" - "`.
pub fn is_cycle_folder_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() >= 6 && bytes[..3].iter().all(u8::is_ascii_digit) && &bytes[3..6] == b" - "
}

/// Cycle sub-folders of a run folder, in name order.
pub fn list_cycle_folders(run_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut cycles = Vec::new();
    for entry in read_dir_checked(run_dir)? {
        let path = entry?.path();
        let is_cycle = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(is_cycle_folder_name);
        if path.is_dir() && is_cycle {
            cycles.push(path);
        }
    }
    cycles.sort();
    Ok(cycles)
}

/// Finds the frame whose name ends in `" <index>.<extension>"`.
///
/// When several files match, the first by name wins.
pub fn find_acquisition(dir: &Path, extension: &str, index: usize) -> Result<PathBuf> {
    let suffix = format!(" {index}");
    let mut matches = Vec::new();
    for entry in read_dir_checked(dir)? {
        let path = entry?.path();
        let stem_matches = path
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|s| s.ends_with(&suffix));
        if path.is_file() && has_extension(&path, extension) && stem_matches {
            matches.push(path);
        }
    }

    matches.sort();
    matches.into_iter().next().ok_or_else(|| {
        HdrError::InputReadError(format!(
            "{}: no file matching '*{}.{}'",
            dir.display(),
            suffix,
            extension
        ))
    })
}

/// `"<name> backup - YYYY-MM-DD HHMMSS"`
pub fn backup_folder_name(name: &str, timestamp: &NaiveDateTime) -> String {
    format!("{} backup - {}", name, timestamp.format("%Y-%m-%d %H%M%S"))
}
