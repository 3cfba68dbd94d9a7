//! Parallel frame decoding.
//!
//! This module provides [`decode_parallel`], which splits the frame index
//! space into contiguous ranges and decodes them on a bounded rayon thread
//! pool. Each worker opens its own source through the [`OpenSource`]
//! factory, so there is no shared mutable decoder state and no locking.
//!
//! Results travel back over a channel. The controlling thread waits for each
//! one with the configured timeout; when a wait expires the whole decode
//! fails with [`FlipbookError::DecodeTimeout`]. Workers still running at
//! that point are not interrupted; they finish on their own and their
//! results are dropped along with the pool.

use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use rayon::ThreadPoolBuilder;

use crate::decode::decode_chunk_with_progress;
use crate::error::FlipbookError;
use crate::frame::{DecodedFrame, FrameRange, merge_decoded_chunks, split_frame_ranges};
use crate::progress::{OperationType, ProgressCallback, ProgressTracker};
use crate::source::OpenSource;

/// Settings for one parallel decode.
#[derive(Clone)]
pub struct DispatchOptions {
    /// How long to wait for each worker result.
    pub timeout: Duration,
    /// Upper bound on concurrent workers.
    pub max_workers: usize,
    /// Target canvas size for every decoded frame.
    pub canvas_size: (u32, u32),
    /// Whether records should be left pending for compositing.
    pub is_partial: bool,
    pub(crate) progress: Option<(Arc<dyn ProgressCallback>, u64)>,
}

impl DispatchOptions {
    /// Options with no progress reporting.
    pub fn new(
        timeout: Duration,
        max_workers: usize,
        canvas_size: (u32, u32),
        is_partial: bool,
    ) -> Self {
        Self {
            timeout,
            max_workers,
            canvas_size,
            is_partial,
            progress: None,
        }
    }
}

/// Decode `total_frames` frames across a bounded worker pool.
///
/// Returns one record per frame, sorted by original index.
///
/// # Errors
///
/// - [`FlipbookError::DecodeTimeout`] if any single wait for a worker
///   result exceeds `options.timeout`.
/// - The first worker error received; remaining results are discarded.
/// - [`FlipbookError::WorkerFailed`] if a worker panicked.
pub fn decode_parallel<O>(
    opener: Arc<O>,
    total_frames: usize,
    options: &DispatchOptions,
) -> Result<Vec<DecodedFrame>, FlipbookError>
where
    O: OpenSource + 'static,
{
    let ranges = split_frame_ranges(total_frames, options.max_workers);
    if ranges.is_empty() {
        return Err(FlipbookError::NoFrames);
    }

    log::debug!(
        "Dispatching {} frames to {} workers (bound={}, timeout={:?})",
        total_frames,
        ranges.len(),
        options.max_workers,
        options.timeout
    );

    let pool = ThreadPoolBuilder::new()
        .num_threads(ranges.len())
        .thread_name(|index| format!("flipbook-decode-{index}"))
        .panic_handler(|_| log::warn!("Decode worker panicked"))
        .build()
        .map_err(|error| FlipbookError::ThreadPoolError(error.to_string()))?;

    let tracker = options.progress.as_ref().map(|(callback, batch_size)| {
        Arc::new(ProgressTracker::new(
            Arc::clone(callback),
            OperationType::FrameDecoding,
            Some(total_frames as u64),
            *batch_size,
        ))
    });

    let (sender, receiver) = mpsc::channel::<Result<Vec<DecodedFrame>, FlipbookError>>();
    for range in ranges.iter().copied() {
        let sender = sender.clone();
        let opener = Arc::clone(&opener);
        let tracker = tracker.clone();
        let canvas_size = options.canvas_size;
        let is_partial = options.is_partial;
        pool.spawn(move || {
            let result = decode_chunk_with_progress(
                opener.as_ref(),
                range,
                canvas_size,
                is_partial,
                tracker.as_deref(),
            );
            // The receiver is gone after a timeout; nothing left to report to.
            let _ = sender.send(result);
        });
    }
    drop(sender);

    let chunks = gather(&receiver, &ranges, options.timeout)?;

    if let Some(tracker) = &tracker {
        tracker.finish();
    }

    Ok(merge_decoded_chunks(chunks))
}

fn gather(
    receiver: &mpsc::Receiver<Result<Vec<DecodedFrame>, FlipbookError>>,
    ranges: &[FrameRange],
    timeout: Duration,
) -> Result<Vec<Vec<DecodedFrame>>, FlipbookError> {
    let mut chunks = Vec::with_capacity(ranges.len());
    for _ in ranges {
        match receiver.recv_timeout(timeout) {
            Ok(Ok(chunk)) => chunks.push(chunk),
            Ok(Err(error)) => {
                log::warn!("Decode worker failed: {error}");
                return Err(error);
            }
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "Timed out after {:?} with {} of {} chunks decoded",
                    timeout,
                    chunks.len(),
                    ranges.len()
                );
                return Err(FlipbookError::DecodeTimeout { timeout });
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(FlipbookError::WorkerFailed(format!(
                    "{} of {} workers exited without a result",
                    ranges.len() - chunks.len(),
                    ranges.len()
                )));
            }
        }
    }
    Ok(chunks)
}
