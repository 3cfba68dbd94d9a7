//! Error types for the `flipbook` crate.
//!
//! This module defines [`FlipbookError`], the unified error type returned by
//! all fallible operations in the crate. Errors carry context such as file
//! paths, frame indices and the configured timeout so the CLI can print them
//! directly.

use std::{io::Error as IoError, path::PathBuf, time::Duration};

use gif::DecodingError as GifDecodingError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `flipbook` operations.
///
/// Every public function that can fail returns `Result<T, FlipbookError>`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FlipbookError {
    /// The input file does not exist.
    #[error("Can't find file {0}")]
    FileNotFound(PathBuf),

    /// The source could not be opened or its header could not be read.
    #[error("Failed to open animated image at {path}: {reason}")]
    FileOpen {
        /// Path that was being opened.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file is not an animated GIF, WebP or APNG.
    #[error("Unsupported source format: {0}")]
    UnsupportedFormat(String),

    /// A single frame could not be decoded.
    #[error("Failed to decode frame {frame_index}: {reason}")]
    FrameDecodeError {
        /// Index of the frame that failed.
        frame_index: usize,
        /// Upstream decoder message.
        reason: String,
    },

    /// The requested frame index exceeds the total frame count.
    #[error("Frame {frame_index} is out of range (source has {total_frames} frames)")]
    FrameOutOfRange {
        /// The frame index that was requested.
        frame_index: usize,
        /// The number of frames in the source.
        total_frames: usize,
    },

    /// A frame range whose start lies after its end.
    #[error("Invalid frame range: start ({start}) must not exceed end ({end})")]
    InvalidRange {
        /// First index of the range.
        start: usize,
        /// One past the last index of the range.
        end: usize,
    },

    /// The source, or a list of durations, contained no frames.
    #[error("Source contains no frames")]
    NoFrames,

    /// Frame durations cannot produce a usable frame rate.
    #[error("Invalid frame timing: {0}")]
    InvalidFrameTiming(String),

    /// Gathering a worker result took longer than the configured timeout.
    #[error(
        "Processing timed out after {} seconds. Try a higher --timeout value",
        .timeout.as_secs_f64()
    )]
    DecodeTimeout {
        /// The timeout that expired.
        timeout: Duration,
    },

    /// A decode worker died without reporting a result.
    #[error("Decode worker failed: {0}")]
    WorkerFailed(String),

    /// The decode thread pool could not be created.
    #[error("Failed to build worker pool: {0}")]
    ThreadPoolError(String),

    /// Video encoding failed (codec or encoder setup).
    #[error("Video encoding error: {0}")]
    VideoEncodeError(String),

    /// Writing the output container failed.
    #[error("Video write error: {0}")]
    VideoWriteError(String),

    /// An error originating from the FFmpeg libraries.
    #[cfg(feature = "encode")]
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// An error from the `gif` decoder.
    #[error("GIF decoding error: {0}")]
    GifError(#[from] GifDecodingError),
}

#[cfg(feature = "encode")]
impl From<ffmpeg_next::Error> for FlipbookError {
    fn from(error: ffmpeg_next::Error) -> Self {
        FlipbookError::FfmpegError(error.to_string())
    }
}
