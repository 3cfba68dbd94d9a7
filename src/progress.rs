//! Progress reporting.
//!
//! This module provides [`ProgressCallback`] for monitoring conversion
//! progress and [`ProgressInfo`] for detailed progress snapshots. Decode
//! workers report into one shared tracker, so callbacks may fire from several
//! threads at once.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use flipbook::{ConvertOptions, FileSource, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("[{:?}] {pct:.1}% complete", info.operation);
//!         }
//!     }
//! }
//!
//! let options = ConvertOptions::new().with_progress(Arc::new(PrintProgress));
//! let animation = flipbook::process_animation(Arc::new(FileSource::new("input.webp")), &options)?;
//! # Ok::<(), flipbook::FlipbookError>(())
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use std::time::{Duration, Instant};

/// The kind of work currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Decoding frames across the worker pool.
    FrameDecoding,
    /// Compositing partial frames onto the running canvas.
    Compositing,
}

/// A snapshot of conversion progress.
///
/// Delivered to [`ProgressCallback::on_progress`] at a cadence controlled
/// by [`ConvertOptions::with_batch_size`](crate::ConvertOptions::with_batch_size).
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What kind of work is being performed.
    pub operation: OperationType,
    /// How many frames have been processed so far.
    pub current: u64,
    /// Total frames expected, if known ahead of time.
    pub total: Option<u64>,
    /// Completion percentage (0.0 to 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time elapsed since the operation started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub estimated_remaining: Option<Duration>,
    /// The frame index that was just processed.
    pub current_frame: Option<usize>,
}

/// Trait for receiving progress updates during a conversion.
///
/// Implementations must be [`Send`] and [`Sync`] because callbacks are
/// invoked from decode worker threads.
pub trait ProgressCallback: Send + Sync {
    /// Called at regular intervals during an operation.
    fn on_progress(&self, info: &ProgressInfo);
}

/// A no-op implementation that discards all progress notifications.
///
/// This is the default when no callback is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Internal helper that tracks progress timing and emits callbacks.
///
/// Shared between workers behind an [`Arc`]; the counter is atomic so
/// `advance` only needs `&self`.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    total: Option<u64>,
    current: AtomicU64,
    batch_size: u64,
    start_time: Instant,
}

impl ProgressTracker {
    /// Create a new tracker.
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        total: Option<u64>,
        batch_size: u64,
    ) -> Self {
        Self {
            callback,
            operation,
            total,
            current: AtomicU64::new(0),
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
        }
    }

    /// Record one completed frame and fire the callback if the batch
    /// threshold is reached.
    pub(crate) fn advance(&self, frame_index: Option<usize>) {
        let current = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        if current % self.batch_size == 0 {
            self.report(current, frame_index);
        }
    }

    /// Unconditionally emit a final progress report.
    pub(crate) fn finish(&self) {
        self.report(self.current.load(Ordering::Acquire), None);
    }

    fn report(&self, current: u64, frame_index: Option<usize>) {
        let elapsed = self.start_time.elapsed();

        let percentage = self
            .total
            .filter(|&t| t > 0)
            .map(|t| (current as f32 / t as f32) * 100.0);

        let estimated_remaining = if current > 0 {
            self.total.map(|t| {
                let remaining = t.saturating_sub(current);
                let per_item = elapsed / current as u32;
                per_item * remaining as u32
            })
        } else {
            None
        };

        let info = ProgressInfo {
            operation: self.operation,
            current,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
            current_frame: frame_index,
        };

        self.callback.on_progress(&info);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<u64>>,
    }

    impl ProgressCallback for Recorder {
        fn on_progress(&self, info: &ProgressInfo) {
            self.seen.lock().unwrap().push(info.current);
        }
    }

    #[test]
    fn tracker_reports_every_batch() {
        let recorder = Arc::new(Recorder::default());
        let tracker = ProgressTracker::new(
            recorder.clone(),
            OperationType::FrameDecoding,
            Some(6),
            2,
        );
        for index in 0..6 {
            tracker.advance(Some(index));
        }
        tracker.finish();
        assert_eq!(*recorder.seen.lock().unwrap(), vec![2, 4, 6, 6]);
    }

    #[test]
    fn tracker_clamps_zero_batch_size() {
        let recorder = Arc::new(Recorder::default());
        let tracker =
            ProgressTracker::new(recorder.clone(), OperationType::Compositing, None, 0);
        tracker.advance(None);
        assert_eq!(*recorder.seen.lock().unwrap(), vec![1]);
    }

    #[derive(Default)]
    struct Percentages {
        seen: Mutex<Vec<Option<f32>>>,
    }

    impl ProgressCallback for Percentages {
        fn on_progress(&self, info: &ProgressInfo) {
            self.seen.lock().unwrap().push(info.percentage);
        }
    }

    #[test]
    fn percentage_runs_from_zero_to_one_hundred() {
        let recorder = Arc::new(Percentages::default());
        let tracker = ProgressTracker::new(
            recorder.clone(),
            OperationType::FrameDecoding,
            Some(4),
            1,
        );
        for index in 0..4 {
            tracker.advance(Some(index));
        }
        assert_eq!(
            *recorder.seen.lock().unwrap(),
            vec![Some(25.0), Some(50.0), Some(75.0), Some(100.0)]
        );

        let unbounded = Arc::new(Percentages::default());
        ProgressTracker::new(unbounded.clone(), OperationType::Compositing, None, 1).finish();
        assert_eq!(*unbounded.seen.lock().unwrap(), vec![None]);
    }
}
