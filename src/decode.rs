//! Chunk decoding.
//!
//! [`decode_chunk`] is the unit of work of one decode worker: it opens its
//! own source, decodes every frame of its [`FrameRange`] and normalizes each
//! one onto a blank RGBA canvas of the target size.

use image::{RgbaImage, imageops};

use crate::error::FlipbookError;
use crate::frame::{DecodedFrame, FrameRange, FramePixels};
use crate::progress::ProgressTracker;
use crate::source::{AnimationSource, OpenSource};

/// Decode `range` from a fresh source handle.
///
/// Each frame is pasted at the origin of a blank `canvas_size` raster, so
/// every record has the same dimensions whatever the source frame declared.
/// In partial mode the records are [`FramePixels::Pending`]; otherwise they
/// are [`FramePixels::Finished`].
///
/// # Errors
///
/// Returns [`FlipbookError::FrameOutOfRange`] if `range` extends past the
/// source's frame count. The first frame that fails to decode aborts the
/// whole chunk.
pub fn decode_chunk<O: OpenSource>(
    opener: &O,
    range: FrameRange,
    canvas_size: (u32, u32),
    is_partial: bool,
) -> Result<Vec<DecodedFrame>, FlipbookError> {
    decode_chunk_with_progress(opener, range, canvas_size, is_partial, None)
}

pub(crate) fn decode_chunk_with_progress<O: OpenSource>(
    opener: &O,
    range: FrameRange,
    canvas_size: (u32, u32),
    is_partial: bool,
    tracker: Option<&ProgressTracker>,
) -> Result<Vec<DecodedFrame>, FlipbookError> {
    let mut source = opener.open()?;
    let total_frames = source.frame_count();
    if range.end > total_frames {
        return Err(FlipbookError::FrameOutOfRange {
            frame_index: range.end.saturating_sub(1),
            total_frames,
        });
    }

    log::debug!(
        "Decoding frames {}..{} (partial={})",
        range.start,
        range.end,
        is_partial
    );

    let mut frames = Vec::with_capacity(range.len());
    for index in range.indices() {
        let info = source.frame_info(index)?;
        let decoded = source.decode_frame(index)?;

        let mut canvas = RgbaImage::new(canvas_size.0, canvas_size.1);
        imageops::replace(&mut canvas, &decoded, 0, 0);

        let pixels = if is_partial {
            FramePixels::Pending(canvas)
        } else {
            FramePixels::Finished(canvas)
        };
        frames.push(DecodedFrame {
            pixels,
            index,
            duration_ms: info.duration_ms,
        });

        if let Some(tracker) = tracker {
            tracker.advance(Some(index));
        }
    }

    Ok(frames)
}
