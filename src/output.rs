//! Input and output path handling.
//!
//! Paths given on the command line are interpreted relative to a base
//! directory (the working directory for the CLI) and may use either
//! separator style.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::FlipbookError;

const OUTPUT_EXTENSION: &str = "mp4";

/// Replace every backslash with a forward slash.
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Resolve a user-supplied input name against `base_dir`.
///
/// # Errors
///
/// Returns [`FlipbookError::FileNotFound`] if the resolved path does not
/// exist.
pub fn resolve_input_path(filename: &str, base_dir: &Path) -> Result<PathBuf, FlipbookError> {
    let path = base_dir.join(normalize_separators(filename));
    if !path.exists() {
        return Err(FlipbookError::FileNotFound(path));
    }
    Ok(path)
}

/// Pick an output name for `input` that does not collide with an existing
/// file under `base_dir`.
///
/// The final extension of the input is dropped (a name without one is kept
/// whole) and `.mp4` appended. When that file already exists, `1`, `2`, ...
/// is appended to the stem until a free name is found. The returned path is
/// relative, like `input`.
pub fn derive_output_path(input: &str, base_dir: &Path) -> PathBuf {
    let input = normalize_separators(input);
    let stem = strip_extension(&input);

    let mut candidate = format!("{stem}.{OUTPUT_EXTENSION}");
    let mut suffix = 0u32;
    while base_dir.join(&candidate).exists() {
        suffix += 1;
        candidate = format!("{stem}{suffix}.{OUTPUT_EXTENSION}");
    }
    log::debug!("Derived output path {candidate}");
    PathBuf::from(candidate)
}

/// Create the directory that will hold `output` if it is missing.
///
/// Only the immediate parent is created; a missing grandparent is an error.
///
/// # Errors
///
/// Returns [`FlipbookError::IoError`] if the directory cannot be created.
pub fn ensure_output_directory(output: &Path, base_dir: &Path) -> Result<(), FlipbookError> {
    let target = base_dir.join(output);
    let Some(parent) = target.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() || parent.exists() {
        return Ok(());
    }
    log::debug!("Creating output directory {}", parent.display());
    fs::create_dir(parent)?;
    Ok(())
}

/// Drop everything from the last `.` of the final path segment.
fn strip_extension(name: &str) -> &str {
    let segment_start = name.rfind('/').map_or(0, |slash| slash + 1);
    match name[segment_start..].rfind('.') {
        Some(dot) => &name[..segment_start + dot],
        None => name,
    }
}
