//! GIF decoding with raw frame regions.
//!
//! GIF frames may cover only a sub-rectangle of the logical screen, which
//! makes GIF the typical partial-mode source. [`GifSource`] keeps every frame
//! in its LZW-compressed form (reading those is cheap) together with its
//! offset, size and delay, and only decompresses the frames that are asked
//! for. A worker decoding frames 40..60 therefore never touches the pixel
//! data of frames 0..40.

use std::borrow::Cow;
use std::io::Cursor;
use std::sync::Arc;

use ::gif::streaming_decoder::FrameDecoder;
use ::gif::{ColorOutput, DecodeOptions, Frame};
use image::{RgbaImage, imageops};

use crate::error::FlipbookError;
use crate::source::{AnimationSource, FrameInfo, FrameRegion};

/// GIF delays are stored in hundredths of a second.
const GIF_DELAY_UNIT_MS: u32 = 10;

/// A GIF opened for random frame access.
pub struct GifSource {
    width: u32,
    height: u32,
    /// Frames with `buffer` still holding LZW data.
    frames: Vec<Frame<'static>>,
    decoder: FrameDecoder,
}

impl GifSource {
    /// Read the GIF header and every frame descriptor from memory.
    pub fn from_bytes(bytes: Arc<[u8]>) -> Result<Self, FlipbookError> {
        let mut options = DecodeOptions::new();
        options.skip_frame_decoding(true);

        let mut reader = options.read_info(Cursor::new(bytes))?;
        let width = u32::from(reader.width());
        let height = u32::from(reader.height());
        let global_palette = reader.global_palette().map(<[u8]>::to_vec);

        let mut frames = Vec::new();
        while let Some(frame) = reader.read_next_frame()? {
            frames.push(frame.clone());
        }

        let mut frame_options = DecodeOptions::new();
        frame_options.set_color_output(ColorOutput::RGBA);
        let mut decoder = FrameDecoder::new(frame_options);
        if let Some(palette) = global_palette {
            decoder.set_global_palette(palette);
        }

        log::debug!(
            "GIF header: {}x{} with {} frames",
            width,
            height,
            frames.len()
        );

        Ok(Self {
            width,
            height,
            frames,
            decoder,
        })
    }

    fn frame(&self, index: usize) -> Result<&Frame<'static>, FlipbookError> {
        self.frames
            .get(index)
            .ok_or(FlipbookError::FrameOutOfRange {
                frame_index: index,
                total_frames: self.frames.len(),
            })
    }
}

impl AnimationSource for GifSource {
    fn canvas_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn frame_info(&mut self, index: usize) -> Result<FrameInfo, FlipbookError> {
        let frame = self.frame(index)?;
        Ok(FrameInfo {
            duration_ms: u32::from(frame.delay) * GIF_DELAY_UNIT_MS,
            region: Some(FrameRegion {
                left: u32::from(frame.left),
                top: u32::from(frame.top),
                width: u32::from(frame.width),
                height: u32::from(frame.height),
            }),
        })
    }

    fn decode_frame(&mut self, index: usize) -> Result<RgbaImage, FlipbookError> {
        // Decode a copy; the stored frame stays LZW-encoded so it can be
        // decoded again after a backwards seek.
        let mut frame = self.frame(index)?.clone();
        self.decoder
            .decode_lzw_encoded_frame(&mut frame)
            .map_err(|error| FlipbookError::FrameDecodeError {
                frame_index: index,
                reason: error.to_string(),
            })?;

        let pixels = match frame.buffer {
            Cow::Owned(pixels) => pixels,
            Cow::Borrowed(pixels) => pixels.to_vec(),
        };
        let patch = RgbaImage::from_raw(u32::from(frame.width), u32::from(frame.height), pixels)
            .ok_or_else(|| FlipbookError::FrameDecodeError {
                frame_index: index,
                reason: "decoded buffer does not match the frame size".to_string(),
            })?;

        let mut canvas = RgbaImage::new(self.width, self.height);
        imageops::replace(
            &mut canvas,
            &patch,
            i64::from(frame.left),
            i64::from(frame.top),
        );
        Ok(canvas)
    }
}
