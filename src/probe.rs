//! Source probing and partial-mode detection.
//!
//! [`SourceProbe`] opens a private source handle, reads the canvas size and
//! frame count, runs [`detect_partial_mode`] over it and drops the handle
//! again before any decoding starts. Detection walks frame metadata in order,
//! so it must never run on a handle that a decode worker is using.

use crate::error::FlipbookError;
use crate::metadata::SourceMetadata;
use crate::source::{AnimatedImage, AnimationSource, FileSource, OpenSource, SourceFormat};

/// Returns `true` if any frame's update region is smaller than the canvas.
///
/// Stops at the first partial frame. Frames without region metadata count
/// as full frames, so a source with no region metadata at all is never
/// partial.
pub fn detect_partial_mode<S: AnimationSource + ?Sized>(
    source: &mut S,
) -> Result<bool, FlipbookError> {
    let canvas = source.canvas_size();
    for index in 0..source.frame_count() {
        if let Some(region) = source.update_region(index)? {
            if !region.covers(canvas) {
                log::debug!(
                    "Frame {} updates {}x{} of a {}x{} canvas; source is partial",
                    index,
                    region.width,
                    region.height,
                    canvas.0,
                    canvas.1
                );
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Lightweight source probe.
///
/// # Example
///
/// ```no_run
/// use flipbook::{FileSource, SourceProbe};
///
/// let metadata = SourceProbe::probe(&FileSource::new("input.gif"))?;
/// println!(
///     "{}x{}, {} frames, partial: {}",
///     metadata.width, metadata.height, metadata.frame_count, metadata.is_partial
/// );
/// # Ok::<(), flipbook::FlipbookError>(())
/// ```
pub struct SourceProbe;

impl SourceProbe {
    /// Open a private handle from `opener` and describe the source.
    ///
    /// # Errors
    ///
    /// Returns [`FlipbookError::NoFrames`] for a source without frames, and
    /// any error the opener or the frame metadata reads produce.
    pub fn probe<O: OpenSource>(opener: &O) -> Result<SourceMetadata, FlipbookError> {
        let mut source = opener.open()?;
        Self::describe(&mut source, None)
    }

    /// Probe a file, also reporting its container format.
    pub fn probe_file(opener: &FileSource) -> Result<SourceMetadata, FlipbookError> {
        let mut source: AnimatedImage = opener.open()?;
        let format = source.format();
        Self::describe(&mut source, Some(format))
    }

    fn describe<S: AnimationSource>(
        source: &mut S,
        format: Option<SourceFormat>,
    ) -> Result<SourceMetadata, FlipbookError> {
        let frame_count = source.frame_count();
        if frame_count == 0 {
            return Err(FlipbookError::NoFrames);
        }
        let (width, height) = source.canvas_size();
        let is_partial = detect_partial_mode(source)?;

        log::debug!(
            "Probed source: {}x{}, {} frames, partial={}",
            width,
            height,
            frame_count,
            is_partial
        );

        Ok(SourceMetadata {
            format,
            width,
            height,
            frame_count,
            is_partial,
        })
    }
}
