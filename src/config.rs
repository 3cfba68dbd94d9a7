//! Conversion configuration.
//!
//! [`ConvertOptions`] is a builder that threads the decode timeout, the
//! worker bound and progress reporting through the conversion pipeline
//! without polluting every function signature.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use flipbook::ConvertOptions;
//!
//! let options = ConvertOptions::new()
//!     .with_timeout(Duration::from_secs(60))
//!     .with_max_workers(4)
//!     .with_batch_size(10);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::progress::{NoOpProgress, ProgressCallback};

/// Default time to wait for each worker result.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on concurrent decode workers, whatever the host offers.
pub const MAX_WORKERS: usize = 16;

/// Worker bound derived from the host: `min(available_parallelism, 16)`.
pub fn default_worker_bound() -> usize {
    thread::available_parallelism()
        .map(|count| count.get())
        .unwrap_or(1)
        .clamp(1, MAX_WORKERS)
}

/// Configuration for [`process_animation`](crate::process_animation) and
/// [`convert`](crate::convert).
///
/// All fields have defaults: a 30 second timeout, the host-derived worker
/// bound, and no progress callback.
#[derive(Clone)]
pub struct ConvertOptions {
    /// How long to wait for each worker result.
    pub(crate) timeout: Duration,
    /// Maximum number of decode workers (1..=16).
    pub(crate) max_workers: usize,
    /// Progress callback. Defaults to a no-op.
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// How often to fire the progress callback (every N frames).
    pub(crate) batch_size: u64,
}

impl Debug for ConvertOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ConvertOptions")
            .field("timeout", &self.timeout)
            .field("max_workers", &self.max_workers)
            .field("has_progress", &true)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ConvertOptions {
    /// Create a new configuration with default settings.
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_workers: default_worker_bound(),
            progress: Arc::new(NoOpProgress),
            batch_size: 1,
        }
    }

    /// Set how long to wait for each worker result before giving up.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the worker bound. Clamped to `1..=MAX_WORKERS`.
    #[must_use]
    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = workers.clamp(1, MAX_WORKERS);
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Set how often the progress callback fires. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// The configured gather timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The configured worker bound.
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }
}
