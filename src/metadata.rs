//! Source metadata.
//!
//! [`SourceMetadata`] is the probe result that the rest of the pipeline is
//! sized from: canvas dimensions, frame count, and whether frames must be
//! composited before encoding.

use crate::source::SourceFormat;

/// What the pipeline needs to know about a source before decoding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceMetadata {
    /// Container format, when the source came from a file.
    pub format: Option<SourceFormat>,
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Number of frames.
    pub frame_count: usize,
    /// Whether any frame updates only part of the canvas.
    pub is_partial: bool,
}

impl SourceMetadata {
    /// Canvas size as `(width, height)`.
    pub fn canvas_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
