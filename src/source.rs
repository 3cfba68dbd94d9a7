//! Animated image sources.
//!
//! [`AnimationSource`] is the decoder seam: it reports the canvas size, the
//! frame count, per-frame timing and update regions, and decodes single
//! frames to RGBA. [`OpenSource`] is the factory each decode worker uses to
//! get its own independent source, so no decoder state is ever shared
//! between threads.
//!
//! [`FileSource`] opens files from disk and picks the decoder from the
//! file's magic bytes: GIF goes through [`GifSource`](crate::gif::GifSource),
//! animated WebP and APNG through
//! [`CompositedSource`](crate::composited::CompositedSource).

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{ImageFormat, RgbaImage};

use crate::composited::CompositedSource;
use crate::error::FlipbookError;
use crate::gif::GifSource;

/// Rectangle of a frame that was actually updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRegion {
    /// Horizontal offset from the canvas origin.
    pub left: u32,
    /// Vertical offset from the canvas origin.
    pub top: u32,
    /// Region width in pixels.
    pub width: u32,
    /// Region height in pixels.
    pub height: u32,
}

impl FrameRegion {
    /// A region covering a whole canvas of the given size.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            left: 0,
            top: 0,
            width,
            height,
        }
    }

    /// Whether the region's dimensions equal the canvas dimensions.
    pub fn covers(&self, canvas: (u32, u32)) -> bool {
        (self.width, self.height) == canvas
    }
}

/// Timing and layout metadata for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    /// How long the frame is displayed, in milliseconds.
    pub duration_ms: u32,
    /// The updated rectangle, if the format records one.
    pub region: Option<FrameRegion>,
}

/// A decoder for one multi-frame image.
///
/// Frames are addressed by index; implementations seek internally. A source
/// is owned by exactly one step of the pipeline at a time.
pub trait AnimationSource {
    /// Canvas size as `(width, height)`.
    fn canvas_size(&self) -> (u32, u32);

    /// Number of frames in the animation.
    fn frame_count(&self) -> usize;

    /// Duration and update region of the frame at `index`.
    fn frame_info(&mut self, index: usize) -> Result<FrameInfo, FlipbookError>;

    /// Update region of the frame at `index`.
    ///
    /// Defaults to the region reported by [`frame_info`](Self::frame_info);
    /// sources that know their regions without decoding override it.
    fn update_region(&mut self, index: usize) -> Result<Option<FrameRegion>, FlipbookError> {
        Ok(self.frame_info(index)?.region)
    }

    /// Decode the frame at `index` to RGBA.
    ///
    /// The returned raster is positioned relative to the canvas origin;
    /// pixels outside the frame's update region are transparent.
    fn decode_frame(&mut self, index: usize) -> Result<RgbaImage, FlipbookError>;
}

/// Opens a fresh, independent [`AnimationSource`].
///
/// The dispatcher calls [`open`](OpenSource::open) once per worker.
pub trait OpenSource: Send + Sync {
    /// The concrete source type produced.
    type Source: AnimationSource;

    /// Open a new source handle.
    fn open(&self) -> Result<Self::Source, FlipbookError>;
}

/// Container formats `flipbook` can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// GIF89a, including frames that update only a sub-rectangle.
    Gif,
    /// Animated WebP.
    WebP,
    /// Animated PNG.
    Apng,
}

impl SourceFormat {
    /// Detect the format from the leading bytes of a file.
    pub fn detect(bytes: &[u8]) -> Result<Self, FlipbookError> {
        match image::guess_format(bytes) {
            Ok(ImageFormat::Gif) => Ok(SourceFormat::Gif),
            Ok(ImageFormat::WebP) => Ok(SourceFormat::WebP),
            Ok(ImageFormat::Png) => Ok(SourceFormat::Apng),
            Ok(other) => Err(FlipbookError::UnsupportedFormat(format!(
                "{other:?} images are not animated containers"
            ))),
            Err(error) => Err(FlipbookError::UnsupportedFormat(error.to_string())),
        }
    }

    /// Short lowercase name, as printed by the CLI.
    pub fn name(self) -> &'static str {
        match self {
            SourceFormat::Gif => "gif",
            SourceFormat::WebP => "webp",
            SourceFormat::Apng => "apng",
        }
    }
}

/// A decoder chosen at open time from the file's contents.
pub enum AnimatedImage {
    /// A GIF with raw, uncomposited frames.
    Gif(GifSource),
    /// A WebP or APNG whose frames arrive already composited.
    Composited(CompositedSource),
}

impl AnimatedImage {
    /// Open an in-memory image, detecting its format.
    pub fn from_bytes(bytes: Arc<[u8]>) -> Result<Self, FlipbookError> {
        match SourceFormat::detect(&bytes)? {
            SourceFormat::Gif => Ok(AnimatedImage::Gif(GifSource::from_bytes(bytes)?)),
            format => Ok(AnimatedImage::Composited(CompositedSource::from_bytes(
                bytes, format,
            )?)),
        }
    }

    /// Which container this image was read from.
    pub fn format(&self) -> SourceFormat {
        match self {
            AnimatedImage::Gif(_) => SourceFormat::Gif,
            AnimatedImage::Composited(source) => source.format(),
        }
    }
}

impl AnimationSource for AnimatedImage {
    fn canvas_size(&self) -> (u32, u32) {
        match self {
            AnimatedImage::Gif(source) => source.canvas_size(),
            AnimatedImage::Composited(source) => source.canvas_size(),
        }
    }

    fn frame_count(&self) -> usize {
        match self {
            AnimatedImage::Gif(source) => source.frame_count(),
            AnimatedImage::Composited(source) => source.frame_count(),
        }
    }

    fn frame_info(&mut self, index: usize) -> Result<FrameInfo, FlipbookError> {
        match self {
            AnimatedImage::Gif(source) => source.frame_info(index),
            AnimatedImage::Composited(source) => source.frame_info(index),
        }
    }

    fn update_region(&mut self, index: usize) -> Result<Option<FrameRegion>, FlipbookError> {
        match self {
            AnimatedImage::Gif(source) => source.update_region(index),
            AnimatedImage::Composited(source) => source.update_region(index),
        }
    }

    fn decode_frame(&mut self, index: usize) -> Result<RgbaImage, FlipbookError> {
        match self {
            AnimatedImage::Gif(source) => source.decode_frame(index),
            AnimatedImage::Composited(source) => source.decode_frame(index),
        }
    }
}

/// Opens an animated image file from disk, once per caller.
///
/// # Example
///
/// ```no_run
/// use flipbook::{AnimationSource, FileSource, OpenSource};
///
/// let source = FileSource::new("input.gif").open()?;
/// println!("{} frames, canvas {:?}", source.frame_count(), source.canvas_size());
/// # Ok::<(), flipbook::FlipbookError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Create an opener for the file at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The path this opener reads.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OpenSource for FileSource {
    type Source = AnimatedImage;

    fn open(&self) -> Result<AnimatedImage, FlipbookError> {
        log::debug!("Opening animated image: {}", self.path.display());

        if !self.path.exists() {
            return Err(FlipbookError::FileNotFound(self.path.clone()));
        }

        let bytes = fs::read(&self.path).map_err(|error| FlipbookError::FileOpen {
            path: self.path.clone(),
            reason: error.to_string(),
        })?;

        AnimatedImage::from_bytes(Arc::from(bytes)).map_err(|error| match error {
            FlipbookError::GifError(inner) => FlipbookError::FileOpen {
                path: self.path.clone(),
                reason: inner.to_string(),
            },
            FlipbookError::ImageError(inner) => FlipbookError::FileOpen {
                path: self.path.clone(),
                reason: inner.to_string(),
            },
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_formats_from_magic_bytes() {
        assert_eq!(SourceFormat::detect(b"GIF89a\x01\x00").unwrap(), SourceFormat::Gif);
        assert_eq!(
            SourceFormat::detect(b"RIFF\x00\x00\x00\x00WEBPVP8X").unwrap(),
            SourceFormat::WebP,
        );
        assert_eq!(
            SourceFormat::detect(b"\x89PNG\r\n\x1a\n\x00\x00").unwrap(),
            SourceFormat::Apng,
        );
        assert!(SourceFormat::detect(b"not an image at all").is_err());
    }

    #[test]
    fn region_covers_canvas() {
        assert!(FrameRegion::full(10, 10).covers((10, 10)));
        let patch = FrameRegion {
            left: 0,
            top: 0,
            width: 2,
            height: 2,
        };
        assert!(!patch.covers((10, 10)));
    }

    #[test]
    fn missing_file_is_reported() {
        let result = FileSource::new("this_file_does_not_exist.gif").open();
        assert!(matches!(result, Err(FlipbookError::FileNotFound(_))));
    }
}
