//! Frame ranges and decoded frame records.
//!
//! A [`FrameRange`] is the slice of the index space handed to one decode
//! worker. A [`DecodedFrame`] is what the worker hands back: pixels tagged
//! with the frame's original index and duration. Pixels are either
//! [`FramePixels::Finished`] (ready for the encoder) or
//! [`FramePixels::Pending`] (a partial update that still has to be
//! composited onto the previous output frame).

use std::ops::Range;

use image::RgbaImage;

use crate::error::FlipbookError;

/// Half-open interval `[start, end)` of frame indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRange {
    /// First index in the range.
    pub start: usize,
    /// One past the last index in the range.
    pub end: usize,
}

impl FrameRange {
    /// Create a range, rejecting `start > end`.
    pub fn new(start: usize, end: usize) -> Result<Self, FlipbookError> {
        if start > end {
            return Err(FlipbookError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Number of frames in the range.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the range contains no frames.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The indices in the range, in order.
    pub fn indices(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Split `[0, total_frames)` into contiguous ranges for at most
/// `max_workers` workers.
///
/// Every range holds `ceil(total_frames / max_workers)` frames except the
/// last, which ends at `total_frames`. No range is empty, so the number of
/// ranges can be smaller than `max_workers` when frames are scarce.
pub fn split_frame_ranges(total_frames: usize, max_workers: usize) -> Vec<FrameRange> {
    if total_frames == 0 {
        return Vec::new();
    }
    let bound = max_workers.max(1);
    let chunk_size = total_frames.div_ceil(bound);
    let workers = total_frames.div_ceil(chunk_size);

    (0..workers)
        .map(|worker| FrameRange {
            start: chunk_size * worker,
            end: if worker + 1 < workers {
                chunk_size * (worker + 1)
            } else {
                total_frames
            },
        })
        .collect()
}

/// Pixel data of a decoded frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FramePixels {
    /// A partial update pasted onto a blank canvas, awaiting compositing.
    Pending(RgbaImage),
    /// A complete raster ready for the encoder.
    Finished(RgbaImage),
}

impl FramePixels {
    /// Borrow the underlying raster regardless of state.
    pub fn image(&self) -> &RgbaImage {
        match self {
            FramePixels::Pending(image) | FramePixels::Finished(image) => image,
        }
    }

    /// Take the underlying raster regardless of state.
    pub fn into_image(self) -> RgbaImage {
        match self {
            FramePixels::Pending(image) | FramePixels::Finished(image) => image,
        }
    }

    /// Whether the frame still needs compositing.
    pub fn is_pending(&self) -> bool {
        matches!(self, FramePixels::Pending(_))
    }
}

/// One decoded frame tagged with where it belongs.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    /// The frame's pixels.
    pub pixels: FramePixels,
    /// Original frame index in the source.
    pub index: usize,
    /// Display duration in milliseconds.
    pub duration_ms: u32,
}

/// Flatten per-worker record lists and restore presentation order.
///
/// Workers finish in any order; sorting on the original index makes the
/// result independent of completion order.
pub fn merge_decoded_chunks(chunks: Vec<Vec<DecodedFrame>>) -> Vec<DecodedFrame> {
    let mut frames: Vec<DecodedFrame> = chunks.into_iter().flatten().collect();
    frames.sort_by_key(|frame| frame.index);
    frames
}
