//! Video encoder: write a frame sequence into a video file.
//!
//! [`VideoEncoder`] is the FFmpeg-backed [`VideoSink`]. It encodes RGBA
//! frames at a constant rate into the container implied by the output file
//! extension (MP4 for the CLI).
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use flipbook::{
//!     ConvertOptions, EncoderOptions, FileSource, VideoCodec, VideoEncoder, convert,
//! };
//!
//! let encoder = VideoEncoder::new(EncoderOptions::new().with_codec(VideoCodec::H265));
//! convert(
//!     Arc::new(FileSource::new("input.webp")),
//!     Path::new("output.mp4"),
//!     &encoder,
//!     &ConvertOptions::new(),
//! )?;
//! # Ok::<(), flipbook::FlipbookError>(())
//! ```

use std::path::Path;

use ffmpeg_next::codec::Id;
use ffmpeg_next::codec::context::Context as CodecContext;
use ffmpeg_next::codec::encoder::video::Encoder as OpenedVideoEncoder;
use ffmpeg_next::codec::threading::Config as ThreadingConfig;
use ffmpeg_next::format::context::Output;
use ffmpeg_next::format::{Flags as FormatFlags, Pixel};
use ffmpeg_next::frame::Video as VideoFrame;
use ffmpeg_next::software::scaling::{Context as ScalingContext, Flags as ScalingFlags};
use ffmpeg_next::{Packet, Rational};
use image::RgbaImage;

use crate::config::default_worker_bound;
use crate::convert::VideoSink;
use crate::error::FlipbookError;
use crate::frame_rate::{MAX_RATE_TERM, rational_frame_rate};

/// Supported output video codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoCodec {
    /// H.264 / AVC.
    #[default]
    H264,
    /// H.265 / HEVC.
    H265,
    /// MPEG-4 Part 2.
    Mpeg4,
}

impl VideoCodec {
    fn to_codec_id(self) -> Id {
        match self {
            VideoCodec::H264 => Id::H264,
            VideoCodec::H265 => Id::HEVC,
            VideoCodec::Mpeg4 => Id::MPEG4,
        }
    }

    /// Short lowercase name, as accepted by the CLI.
    pub fn name(self) -> &'static str {
        match self {
            VideoCodec::H264 => "h264",
            VideoCodec::H265 => "h265",
            VideoCodec::Mpeg4 => "mpeg4",
        }
    }
}

/// Options for [`VideoEncoder`].
#[derive(Debug, Clone)]
pub struct EncoderOptions {
    /// Output codec. Default is H.264.
    pub codec: VideoCodec,
    /// Encoder thread count hint.
    pub threads: usize,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl EncoderOptions {
    /// H.264 with the host-derived worker bound as thread hint.
    pub fn new() -> Self {
        Self {
            codec: VideoCodec::H264,
            threads: default_worker_bound(),
        }
    }

    /// Set the codec.
    #[must_use]
    pub fn with_codec(mut self, codec: VideoCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Set the encoder thread hint. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }
}

/// Encodes a sequence of RGBA frames into a video file.
pub struct VideoEncoder {
    config: EncoderOptions,
}

impl VideoEncoder {
    /// Create a new video encoder with the given options.
    pub fn new(config: EncoderOptions) -> Self {
        Self { config }
    }

    /// The options this encoder was built with.
    pub fn options(&self) -> &EncoderOptions {
        &self.config
    }
}

impl VideoSink for VideoEncoder {
    /// Encode `frames` at `frames_per_second` into `path`.
    ///
    /// Frames are converted to YUV420P. Odd canvas dimensions are rounded up
    /// to the next even value.
    ///
    /// # Errors
    ///
    /// - [`FlipbookError::VideoWriteError`] on muxing or I/O failure, or if
    ///   `frames` is empty.
    /// - [`FlipbookError::VideoEncodeError`] if the codec is unavailable or
    ///   rejects a frame.
    fn write(
        &self,
        path: &Path,
        frames: &[RgbaImage],
        frames_per_second: f64,
    ) -> Result<(), FlipbookError> {
        log::info!(
            "Writing {} frames to {:?} (codec={:?}, fps={:.3}, threads={})",
            frames.len(),
            path,
            self.config.codec,
            frames_per_second,
            self.config.threads,
        );
        let Some(first) = frames.first() else {
            return Err(FlipbookError::VideoWriteError(
                "no frames to write".to_string(),
            ));
        };
        let Some((rate_numerator, rate_denominator)) =
            rational_frame_rate(frames_per_second, MAX_RATE_TERM)
        else {
            return Err(FlipbookError::VideoEncodeError(format!(
                "unusable frame rate {frames_per_second}"
            )));
        };

        ffmpeg_next::init()?;

        let (source_width, source_height) = first.dimensions();
        let width = even(source_width);
        let height = even(source_height);

        let frame_rate = Rational::new(rate_numerator as i32, rate_denominator as i32);
        let time_base = frame_rate.invert();

        let codec_id = self.config.codec.to_codec_id();

        let mut output = ffmpeg_next::format::output(path)
            .map_err(|e| FlipbookError::VideoWriteError(format!("cannot open output: {e}")))?;

        let needs_global_header = output.format().flags().contains(FormatFlags::GLOBAL_HEADER);

        let encoder_codec = ffmpeg_next::encoder::find(codec_id).ok_or_else(|| {
            FlipbookError::VideoEncodeError(format!("codec {codec_id:?} not available"))
        })?;

        let mut stream = output
            .add_stream(encoder_codec)
            .map_err(|e| FlipbookError::VideoWriteError(format!("cannot add stream: {e}")))?;
        let stream_index = stream.index();

        let mut encoder = CodecContext::from_parameters(stream.parameters())
            .map_err(|e| {
                FlipbookError::VideoEncodeError(format!("cannot create codec context: {e}"))
            })?
            .encoder()
            .video()
            .map_err(|e| {
                FlipbookError::VideoEncodeError(format!("cannot open video encoder: {e}"))
            })?;

        encoder.set_width(width);
        encoder.set_height(height);
        encoder.set_format(Pixel::YUV420P);
        encoder.set_time_base(time_base);
        encoder.set_frame_rate(Some(frame_rate));
        encoder.set_threading(ThreadingConfig::count(self.config.threads));

        if needs_global_header {
            unsafe {
                (*encoder.as_mut_ptr()).flags |=
                    ffmpeg_sys_next::AV_CODEC_FLAG_GLOBAL_HEADER as i32;
            }
        }

        let mut encoder = encoder
            .open_as(encoder_codec)
            .map_err(|e| FlipbookError::VideoEncodeError(format!("cannot open encoder: {e}")))?;

        stream.set_parameters(&encoder);

        output
            .write_header()
            .map_err(|e| FlipbookError::VideoWriteError(format!("cannot write header: {e}")))?;

        let stream_time_base = output
            .stream(stream_index)
            .map(|stream| stream.time_base())
            .ok_or_else(|| FlipbookError::VideoWriteError("output stream vanished".to_string()))?;

        let mut scaler = ScalingContext::get(
            Pixel::RGBA,
            source_width,
            source_height,
            Pixel::YUV420P,
            width,
            height,
            ScalingFlags::BILINEAR,
        )
        .map_err(|e| FlipbookError::VideoWriteError(format!("cannot create scaler: {e}")))?;

        let mut packets = PacketWriter {
            stream_index,
            time_base,
            stream_time_base,
        };

        for (frame_index, image) in frames.iter().enumerate() {
            if image.dimensions() != (source_width, source_height) {
                return Err(FlipbookError::VideoEncodeError(format!(
                    "frame {frame_index} is {}x{}, expected {}x{}",
                    image.width(),
                    image.height(),
                    source_width,
                    source_height
                )));
            }

            let source_frame = rgba_to_video_frame(image);
            let mut scaled = VideoFrame::empty();
            scaler
                .run(&source_frame, &mut scaled)
                .map_err(|e| FlipbookError::VideoWriteError(format!("scaling failed: {e}")))?;
            scaled.set_pts(Some(frame_index as i64));

            encoder.send_frame(&scaled).map_err(|e| {
                FlipbookError::VideoEncodeError(format!("send_frame failed: {e}"))
            })?;
            packets.drain(&mut encoder, &mut output)?;
        }

        encoder
            .send_eof()
            .map_err(|e| FlipbookError::VideoEncodeError(format!("send_eof failed: {e}")))?;
        packets.drain(&mut encoder, &mut output)?;

        output
            .write_trailer()
            .map_err(|e| FlipbookError::VideoWriteError(format!("cannot write trailer: {e}")))?;

        log::info!("Finished writing {:?}", path);
        Ok(())
    }
}

struct PacketWriter {
    stream_index: usize,
    time_base: Rational,
    stream_time_base: Rational,
}

impl PacketWriter {
    /// Move every packet the encoder has ready into the container.
    fn drain(
        &mut self,
        encoder: &mut OpenedVideoEncoder,
        output: &mut Output,
    ) -> Result<(), FlipbookError> {
        let mut packet = Packet::empty();
        while encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(self.stream_index);
            packet.rescale_ts(self.time_base, self.stream_time_base);
            packet
                .write_interleaved(output)
                .map_err(|e| FlipbookError::VideoWriteError(format!("write packet failed: {e}")))?;
        }
        Ok(())
    }
}

/// Copy a tightly packed RGBA image into an FFmpeg frame, honouring the
/// frame's row stride.
fn rgba_to_video_frame(image: &RgbaImage) -> VideoFrame {
    let (width, height) = image.dimensions();
    let mut frame = VideoFrame::new(Pixel::RGBA, width, height);
    let stride = frame.stride(0);
    let row_len = width as usize * 4;
    let bytes = image.as_raw();
    let data = frame.data_mut(0);
    for y in 0..height as usize {
        let source_start = y * row_len;
        let dest_start = y * stride;
        data[dest_start..dest_start + row_len]
            .copy_from_slice(&bytes[source_start..source_start + row_len]);
    }
    frame
}

/// Round up to the next even value; YUV420P needs even dimensions.
fn even(value: u32) -> u32 {
    value + (value & 1)
}
