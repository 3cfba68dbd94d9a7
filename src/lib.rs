//! # flipbook
//!
//! Convert animated images (GIF, WebP, APNG) into video files.
//!
//! `flipbook` decodes the frames of an animated image in parallel, rebuilds
//! full frames for sources that only store changed regions, derives a
//! constant frame rate from the per-frame durations and hands the result to
//! a video encoder powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! ## Quick Start
//!
//! ### Decode an Animation
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use flipbook::{ConvertOptions, FileSource, process_animation};
//!
//! let processed = process_animation(
//!     Arc::new(FileSource::new("input.webp")),
//!     &ConvertOptions::new(),
//! )?;
//! processed.frames[0].save("first_frame.png")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ### Inspect a Source
//!
//! ```no_run
//! use flipbook::{FileSource, SourceProbe};
//!
//! let metadata = SourceProbe::probe_file(&FileSource::new("input.gif"))?;
//! println!("{}x{} with {} frames", metadata.width, metadata.height, metadata.frame_count);
//! # Ok::<(), flipbook::FlipbookError>(())
//! ```
//!
//! ## Pipeline
//!
//! - **Probe**: canvas size, frame count and partial mode, read on a private
//!   handle ([`SourceProbe`], [`detect_partial_mode`])
//! - **Parallel decode**: contiguous frame ranges on a bounded rayon pool,
//!   one source handle per worker, with a per-result timeout
//!   ([`decode_parallel`], [`decode_chunk`])
//! - **Rate estimation**: `1000 / mean duration` ([`estimate_frame_rate`])
//! - **Compositing**: partial updates pasted over the previous frame
//!   ([`composite_progressive`])
//! - **Encoding**: any [`VideoSink`]; `VideoEncoder` with the `encode`
//!   feature
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `encode` | `VideoEncoder` and FFmpeg log control; required by the `flipbook` binary |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! The `encode` feature needs the FFmpeg development libraries installed on
//! the system. Decoding and compositing are pure Rust.

pub mod composite;
pub mod composited;
pub mod config;
pub mod convert;
pub mod decode;
#[cfg(feature = "encode")]
pub mod encode;
pub mod error;
#[cfg(feature = "encode")]
pub mod ffmpeg;
pub mod frame;
pub mod frame_rate;
pub mod gif;
pub mod metadata;
pub mod output;
pub mod parallel;
pub mod probe;
pub mod progress;
pub mod source;

pub use composite::composite_progressive;
pub use composited::CompositedSource;
pub use config::{ConvertOptions, DEFAULT_TIMEOUT, MAX_WORKERS, default_worker_bound};
pub use convert::{
    ConversionSummary, ProcessedAnimation, VideoSink, convert, process_animation, write_animation,
};
pub use decode::decode_chunk;
#[cfg(feature = "encode")]
pub use encode::{EncoderOptions, VideoCodec, VideoEncoder};
pub use error::FlipbookError;
#[cfg(feature = "encode")]
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use frame::{DecodedFrame, FramePixels, FrameRange, merge_decoded_chunks, split_frame_ranges};
pub use frame_rate::{
    FrameTiming, MAX_RATE_TERM, analyze_frame_timing, estimate_frame_rate, rational_frame_rate,
};
pub use crate::gif::GifSource;
pub use metadata::SourceMetadata;
pub use output::{
    derive_output_path, ensure_output_directory, normalize_separators, resolve_input_path,
};
pub use parallel::{DispatchOptions, decode_parallel};
pub use probe::{SourceProbe, detect_partial_mode};
pub use progress::{OperationType, ProgressCallback, ProgressInfo};
pub use source::{
    AnimatedImage, AnimationSource, FileSource, FrameInfo, FrameRegion, OpenSource, SourceFormat,
};
