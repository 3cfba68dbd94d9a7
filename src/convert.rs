//! The conversion pipeline.
//!
//! [`process_animation`] turns an animated image into an ordered sequence of
//! full-canvas RGBA frames plus a frame rate:
//!
//! 1. probe the source on a private handle (canvas size, frame count,
//!    partial mode),
//! 2. decode all frames in parallel,
//! 3. estimate the frame rate from the decoded durations,
//! 4. composite partial updates onto the running canvas.
//!
//! [`write_animation`] hands the processed frames to a [`VideoSink`], and
//! [`convert`] chains the two. Nothing is written unless processing
//! succeeds.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use flipbook::{ConvertOptions, FileSource, process_animation};
//!
//! let processed = process_animation(Arc::new(FileSource::new("input.webp")), &ConvertOptions::new())?;
//! println!("{} frames at {:.2} fps", processed.frames.len(), processed.frames_per_second);
//! # Ok::<(), flipbook::FlipbookError>(())
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use image::RgbaImage;
use serde_json::{Value, json};

use crate::composite::composite_with_progress;
use crate::config::ConvertOptions;
use crate::error::FlipbookError;
use crate::frame_rate::{FrameTiming, analyze_frame_timing};
use crate::metadata::SourceMetadata;
use crate::output::ensure_output_directory;
use crate::parallel::{DispatchOptions, decode_parallel};
use crate::probe::SourceProbe;
use crate::progress::{OperationType, ProgressTracker};
use crate::source::OpenSource;

/// Destination for a finished frame sequence.
///
/// [`VideoEncoder`](crate::encode::VideoEncoder) is the FFmpeg-backed
/// implementation; tests substitute recorders.
pub trait VideoSink {
    /// Write `frames` to `path` as a constant-rate video.
    fn write(
        &self,
        path: &Path,
        frames: &[RgbaImage],
        frames_per_second: f64,
    ) -> Result<(), FlipbookError>;
}

/// Result of [`process_animation`].
#[derive(Debug, Clone)]
pub struct ProcessedAnimation {
    /// Full-canvas frames in presentation order.
    pub frames: Vec<RgbaImage>,
    /// Constant output rate, `1000 / mean duration`.
    pub frames_per_second: f64,
    /// Statistics over the source frame durations.
    pub timing: FrameTiming,
    /// What the probe found out about the source.
    pub metadata: SourceMetadata,
    /// Wall-clock time spent probing, decoding and compositing.
    pub elapsed: Duration,
}

impl ProcessedAnimation {
    /// Whether frames had to be composited.
    pub fn is_partial(&self) -> bool {
        self.metadata.is_partial
    }

    /// Canvas size as `(width, height)`.
    pub fn canvas_size(&self) -> (u32, u32) {
        self.metadata.canvas_size()
    }
}

/// What [`convert`] wrote.
#[derive(Debug, Clone)]
pub struct ConversionSummary {
    /// Where the video was written.
    pub output: PathBuf,
    /// Number of frames handed to the sink.
    pub frames: usize,
    /// Rate the video was written at.
    pub frames_per_second: f64,
    /// Source frame timing.
    pub timing: FrameTiming,
    /// Probe result.
    pub metadata: SourceMetadata,
    /// Time spent in [`process_animation`].
    pub processing_time: Duration,
    /// Time spent in the sink.
    pub encoding_time: Duration,
}

impl ConversionSummary {
    /// JSON view for machine-readable CLI output.
    pub fn to_json(&self) -> Value {
        json!({
            "output": self.output.display().to_string(),
            "format": self.metadata.format.map(|format| format.name()),
            "width": self.metadata.width,
            "height": self.metadata.height,
            "frames": self.frames,
            "partial": self.metadata.is_partial,
            "fps": self.frames_per_second,
            "timing": self.timing.to_json(),
            "processing_seconds": self.processing_time.as_secs_f64(),
            "encoding_seconds": self.encoding_time.as_secs_f64(),
        })
    }
}

/// Decode, time and composite every frame of the source `opener` opens.
///
/// # Errors
///
/// - [`FlipbookError::NoFrames`] if the source has no frames.
/// - [`FlipbookError::DecodeTimeout`] if a worker result takes longer than
///   the configured timeout.
/// - [`FlipbookError::InvalidFrameTiming`] if every frame has a zero
///   duration.
/// - Any error raised while opening or decoding the source.
pub fn process_animation<O>(
    opener: Arc<O>,
    options: &ConvertOptions,
) -> Result<ProcessedAnimation, FlipbookError>
where
    O: OpenSource + 'static,
{
    let start = Instant::now();

    let metadata = SourceProbe::probe(opener.as_ref())?;

    let mut dispatch = DispatchOptions::new(
        options.timeout,
        options.max_workers,
        metadata.canvas_size(),
        metadata.is_partial,
    );
    dispatch.progress = Some((Arc::clone(&options.progress), options.batch_size));

    let decoded = decode_parallel(opener, metadata.frame_count, &dispatch)?;

    let durations: Vec<u32> = decoded.iter().map(|frame| frame.duration_ms).collect();
    let timing = analyze_frame_timing(&durations)?;
    let frames_per_second = timing.frames_per_second();

    let decoded = if metadata.is_partial {
        let tracker = ProgressTracker::new(
            Arc::clone(&options.progress),
            OperationType::Compositing,
            Some(decoded.len() as u64),
            options.batch_size,
        );
        composite_with_progress(decoded, metadata.canvas_size(), Some(&tracker))
    } else {
        decoded
    };

    let frames: Vec<RgbaImage> = decoded
        .into_iter()
        .map(|frame| frame.pixels.into_image())
        .collect();

    let elapsed = start.elapsed();
    log::debug!(
        "Processed {} frames in {:.2}s ({:.2} fps)",
        frames.len(),
        elapsed.as_secs_f64(),
        frames_per_second
    );

    Ok(ProcessedAnimation {
        frames,
        frames_per_second,
        timing,
        metadata,
        elapsed,
    })
}

/// Process the source and write it to `output` through `sink`.
///
/// Equivalent to [`process_animation`] followed by [`write_animation`].
/// When processing fails the sink is never called, so no output file is
/// created.
///
/// # Errors
///
/// Any error from [`process_animation`] or [`write_animation`].
pub fn convert<O, S>(
    opener: Arc<O>,
    output: &Path,
    sink: &S,
    options: &ConvertOptions,
) -> Result<ConversionSummary, FlipbookError>
where
    O: OpenSource + 'static,
    S: VideoSink + ?Sized,
{
    let processed = process_animation(opener, options)?;
    write_animation(processed, output, sink)
}

/// Hand an already processed animation to `sink`, writing `output`.
///
/// The parent directory of `output` is created (one level) if missing.
///
/// # Errors
///
/// Any error from creating the output directory or from the sink.
pub fn write_animation<S>(
    processed: ProcessedAnimation,
    output: &Path,
    sink: &S,
) -> Result<ConversionSummary, FlipbookError>
where
    S: VideoSink + ?Sized,
{
    ensure_output_directory(output, Path::new(""))?;

    let encode_start = Instant::now();
    sink.write(output, &processed.frames, processed.frames_per_second)?;
    let encoding_time = encode_start.elapsed();

    Ok(ConversionSummary {
        output: output.to_path_buf(),
        frames: processed.frames.len(),
        frames_per_second: processed.frames_per_second,
        timing: processed.timing,
        metadata: processed.metadata,
        processing_time: processed.elapsed,
        encoding_time,
    })
}
