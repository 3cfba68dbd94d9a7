//! Animated WebP and APNG decoding through the `image` crate.
//!
//! The `image` animation decoders hand out frames that are already
//! composited onto the full canvas, so every frame of a
//! [`CompositedSource`] reports a full-canvas update region. The decoders
//! are forward-only: seeking ahead skips frames, seeking backwards reopens
//! the in-memory stream.
//!
//! Frame counts are read from the container chunks (one `ANMF` chunk per
//! WebP frame, the `acTL` chunk for APNG) so that opening a source does not
//! decode any pixels.

use std::io::Cursor;
use std::sync::Arc;

use image::codecs::png::PngDecoder;
use image::codecs::webp::WebPDecoder;
use image::{AnimationDecoder, Frames, ImageDecoder, RgbaImage};

use crate::error::FlipbookError;
use crate::source::{AnimationSource, FrameInfo, FrameRegion, SourceFormat};

type Stream = Cursor<Arc<[u8]>>;

/// An animated WebP or APNG opened for sequential frame access.
pub struct CompositedSource {
    bytes: Arc<[u8]>,
    format: SourceFormat,
    width: u32,
    height: u32,
    frame_count: usize,
    frames: Frames<'static>,
    /// Index of the next frame `frames` will yield.
    position: usize,
    /// The most recently decoded frame, kept so that `frame_info` followed
    /// by `decode_frame` on the same index decodes only once.
    current: Option<(usize, u32, RgbaImage)>,
}

impl CompositedSource {
    /// Open an animated WebP or APNG from memory.
    pub fn from_bytes(bytes: Arc<[u8]>, format: SourceFormat) -> Result<Self, FlipbookError> {
        let frame_count = match format {
            SourceFormat::WebP => count_webp_frames(&bytes),
            SourceFormat::Apng => count_apng_frames(&bytes),
            SourceFormat::Gif => {
                return Err(FlipbookError::UnsupportedFormat(
                    "GIF is read by GifSource".to_string(),
                ));
            }
        };
        if frame_count == 0 {
            return Err(FlipbookError::UnsupportedFormat(format!(
                "{} file is not animated",
                format.name()
            )));
        }

        let (frames, (width, height)) = open_frames(&bytes, format)?;

        log::debug!(
            "{} header: {}x{} with {} frames",
            format.name(),
            width,
            height,
            frame_count
        );

        Ok(Self {
            bytes,
            format,
            width,
            height,
            frame_count,
            frames,
            position: 0,
            current: None,
        })
    }

    /// Which container this source reads.
    pub fn format(&self) -> SourceFormat {
        self.format
    }

    fn load(&mut self, index: usize) -> Result<(), FlipbookError> {
        if matches!(self.current, Some((current, _, _)) if current == index) {
            return Ok(());
        }
        if index >= self.frame_count {
            return Err(FlipbookError::FrameOutOfRange {
                frame_index: index,
                total_frames: self.frame_count,
            });
        }
        if index < self.position {
            let (frames, _) = open_frames(&self.bytes, self.format)?;
            self.frames = frames;
            self.position = 0;
        }

        while self.position <= index {
            let position = self.position;
            let frame = self
                .frames
                .next()
                .ok_or(FlipbookError::FrameOutOfRange {
                    frame_index: position,
                    total_frames: position,
                })?
                .map_err(|error| FlipbookError::FrameDecodeError {
                    frame_index: position,
                    reason: error.to_string(),
                })?;
            self.position += 1;

            if position == index {
                let (numerator, denominator) = frame.delay().numer_denom_ms();
                let duration_ms = numerator / denominator.max(1);
                self.current = Some((index, duration_ms, frame.into_buffer()));
            }
        }
        Ok(())
    }
}

impl AnimationSource for CompositedSource {
    fn canvas_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn frame_count(&self) -> usize {
        self.frame_count
    }

    fn frame_info(&mut self, index: usize) -> Result<FrameInfo, FlipbookError> {
        self.load(index)?;
        let duration_ms = self
            .current
            .as_ref()
            .map(|(_, duration_ms, _)| *duration_ms)
            .unwrap_or_default();
        Ok(FrameInfo {
            duration_ms,
            region: Some(FrameRegion::full(self.width, self.height)),
        })
    }

    fn update_region(&mut self, index: usize) -> Result<Option<FrameRegion>, FlipbookError> {
        if index >= self.frame_count {
            return Err(FlipbookError::FrameOutOfRange {
                frame_index: index,
                total_frames: self.frame_count,
            });
        }
        Ok(Some(FrameRegion::full(self.width, self.height)))
    }

    fn decode_frame(&mut self, index: usize) -> Result<RgbaImage, FlipbookError> {
        self.load(index)?;
        match &self.current {
            Some((_, _, image)) => Ok(image.clone()),
            None => Err(FlipbookError::FrameDecodeError {
                frame_index: index,
                reason: "frame was not decoded".to_string(),
            }),
        }
    }
}

fn open_frames(
    bytes: &Arc<[u8]>,
    format: SourceFormat,
) -> Result<(Frames<'static>, (u32, u32)), FlipbookError> {
    let stream: Stream = Cursor::new(Arc::clone(bytes));
    match format {
        SourceFormat::WebP => {
            let decoder = WebPDecoder::new(stream)?;
            let dimensions = decoder.dimensions();
            Ok((decoder.into_frames(), dimensions))
        }
        SourceFormat::Apng => {
            let decoder = PngDecoder::new(stream)?;
            let dimensions = decoder.dimensions();
            Ok((decoder.apng()?.into_frames(), dimensions))
        }
        SourceFormat::Gif => Err(FlipbookError::UnsupportedFormat(
            "GIF is read by GifSource".to_string(),
        )),
    }
}

/// Count `ANMF` chunks in a RIFF/WebP container.
pub(crate) fn count_webp_frames(bytes: &[u8]) -> usize {
    // "RIFF" <size> "WEBP", then chunks of fourcc + little-endian size,
    // padded to an even length.
    let mut position: usize = 12;
    let mut frames = 0;
    while position.saturating_add(8) <= bytes.len() {
        let fourcc = &bytes[position..position + 4];
        let size = u32::from_le_bytes([
            bytes[position + 4],
            bytes[position + 5],
            bytes[position + 6],
            bytes[position + 7],
        ]) as usize;
        if fourcc == b"ANMF" {
            frames += 1;
        }
        position = position
            .saturating_add(8)
            .saturating_add(size)
            .saturating_add(size & 1);
    }
    frames
}

/// Read the frame count from the `acTL` chunk of a PNG, or 0 if absent.
pub(crate) fn count_apng_frames(bytes: &[u8]) -> usize {
    // 8-byte signature, then chunks of big-endian length + type + data + CRC.
    let mut position: usize = 8;
    while position.saturating_add(12) <= bytes.len() {
        let length = u32::from_be_bytes([
            bytes[position],
            bytes[position + 1],
            bytes[position + 2],
            bytes[position + 3],
        ]) as usize;
        let kind = &bytes[position + 4..position + 8];
        if kind == b"acTL" {
            return u32::from_be_bytes([
                bytes[position + 8],
                bytes[position + 9],
                bytes[position + 10],
                bytes[position + 11],
            ]) as usize;
        }
        if kind == b"IDAT" {
            break;
        }
        position = position.saturating_add(12).saturating_add(length);
    }
    0
}
