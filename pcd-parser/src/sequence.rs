//! Discovery and ordering of per-frame point cloud files.
//!
//! A capture folder holds one file per frame, named `<anything>_<digits>.<ext>`.
//! Frames are ordered by the numeric suffix, not lexicographically, so
//! `a_2.ply` comes before `a_10.ply`.

use std::path::{Path, PathBuf};

use glob::{glob, Pattern};
use regex::Regex;

use crate::{error::ParseError, parsers::Extension};

fn suffix_pattern(extension: Extension) -> Regex {
    let pattern = format!(r"_(\d+)\.{}$", regex::escape(extension.as_str()));
    // the pattern is built from a fixed template and an escaped literal
    Regex::new(&pattern).unwrap_or_else(|e| unreachable!("invalid frame pattern {pattern}: {e}"))
}

/// Numeric frame index encoded as `_<digits>.<ext>` at the end of the file name.
///
/// Returns `None` when the digits do not fit in a `u64`; ordering in
/// [`sorted_frame_files`] still places such files by their full value.
pub fn frame_index(path: &Path, extension: Extension) -> Option<u64> {
    frame_digits(&suffix_pattern(extension), path)?.parse().ok()
}

fn frame_digits<'a>(pattern: &Regex, path: &'a Path) -> Option<&'a str> {
    let file_name = path.file_name()?.to_str()?;
    Some(pattern.captures(file_name)?.get(1)?.as_str())
}

/// Orders digit strings by numeric value without a width limit.
fn frame_key(pattern: &Regex, path: &Path) -> Option<(usize, String)> {
    let digits = frame_digits(pattern, path)?.trim_start_matches('0');
    Some((digits.len(), digits.to_string()))
}

/// Lists the frame files of `folder` in frame order.
///
/// Files without a parseable index sort first and keep their listing order.
/// An empty folder is not an error: a warning is logged and an empty list
/// is returned.
pub fn sorted_frame_files(folder: &Path, extension: Extension) -> Result<Vec<PathBuf>, ParseError> {
    if !folder.is_dir() {
        return Err(ParseError::NotADirectory(folder.to_path_buf()));
    }

    let folder_str = folder.to_string_lossy();
    let pattern = format!(
        "{}/*.{}",
        Pattern::escape(folder_str.trim_end_matches('/')),
        extension
    );
    let mut files = Vec::new();
    for entry in glob(&pattern)? {
        let path = entry?;
        if path.is_file() {
            files.push(path);
        }
    }

    if files.is_empty() {
        log::warn!("No {} files found in folder: {}", extension, folder.display());
        return Ok(files);
    }

    let suffix = suffix_pattern(extension);
    // stable: unindexed files (None) stay in listing order ahead of indexed ones
    files.sort_by_key(|path| frame_key(&suffix, path));
    Ok(files)
}
