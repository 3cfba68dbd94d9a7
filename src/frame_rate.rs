//! Frame rate estimation from per-frame durations.
//!
//! Animated images store a display duration per frame, while the output video
//! has a single constant rate. [`estimate_frame_rate`] picks that rate from
//! the mean duration; [`analyze_frame_timing`] additionally reports how far
//! the source strays from it.
//!
//! # Example
//!
//! ```
//! use flipbook::{analyze_frame_timing, estimate_frame_rate};
//!
//! let fps = estimate_frame_rate(&[100, 100, 100, 100])?;
//! assert!((fps - 10.0).abs() < 1e-9);
//!
//! let timing = analyze_frame_timing(&[40, 40, 200])?;
//! assert!(timing.is_variable);
//! # Ok::<(), flipbook::FlipbookError>(())
//! ```

use serde_json::{Value, json};

use crate::error::FlipbookError;

/// Largest numerator or denominator [`rational_frame_rate`] produces.
///
/// Some encoders (MPEG-4 part 2) reject time bases with terms above this.
pub const MAX_RATE_TERM: u32 = 65535;

/// Statistics over the frame durations of one animation.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTiming {
    /// Mean frame duration in milliseconds.
    pub mean_ms: f64,
    /// Standard deviation of frame durations in milliseconds.
    pub stddev_ms: f64,
    /// Shortest frame duration.
    pub min_ms: u32,
    /// Longest frame duration.
    pub max_ms: u32,
    /// Number of durations analyzed.
    pub frames: usize,
    /// Whether the standard deviation exceeds 10% of the mean duration.
    ///
    /// A constant-rate video only approximates such a source.
    pub is_variable: bool,
}

impl FrameTiming {
    /// Frames per second implied by the mean duration.
    pub fn frames_per_second(&self) -> f64 {
        1000.0 / self.mean_ms
    }

    /// JSON view used by the CLI summary.
    pub fn to_json(&self) -> Value {
        json!({
            "mean_ms": self.mean_ms,
            "stddev_ms": self.stddev_ms,
            "min_ms": self.min_ms,
            "max_ms": self.max_ms,
            "frames": self.frames,
            "is_variable": self.is_variable,
        })
    }
}

/// Estimate the constant output rate as `1000 / mean(durations)`.
///
/// # Errors
///
/// Returns [`FlipbookError::NoFrames`] for an empty list and
/// [`FlipbookError::InvalidFrameTiming`] when every duration is zero.
pub fn estimate_frame_rate(durations_ms: &[u32]) -> Result<f64, FlipbookError> {
    Ok(analyze_frame_timing(durations_ms)?.frames_per_second())
}

/// Compute [`FrameTiming`] statistics for a list of durations.
///
/// # Errors
///
/// Same as [`estimate_frame_rate`].
pub fn analyze_frame_timing(durations_ms: &[u32]) -> Result<FrameTiming, FlipbookError> {
    if durations_ms.is_empty() {
        return Err(FlipbookError::NoFrames);
    }

    let count = durations_ms.len() as f64;
    let mean = durations_ms.iter().map(|&d| f64::from(d)).sum::<f64>() / count;
    if mean <= 0.0 {
        return Err(FlipbookError::InvalidFrameTiming(format!(
            "all {} frames have a zero duration",
            durations_ms.len()
        )));
    }

    let variance = durations_ms
        .iter()
        .map(|&d| (f64::from(d) - mean).powi(2))
        .sum::<f64>()
        / count;
    let stddev = variance.sqrt();

    let min_ms = durations_ms.iter().copied().min().unwrap_or_default();
    let max_ms = durations_ms.iter().copied().max().unwrap_or_default();

    let is_variable = (stddev / mean) > 0.10;

    log::debug!(
        "Frame timing: mean={:.2}ms stddev={:.2}ms range={}..={}ms variable={}",
        mean,
        stddev,
        min_ms,
        max_ms,
        is_variable
    );

    Ok(FrameTiming {
        mean_ms: mean,
        stddev_ms: stddev,
        min_ms,
        max_ms,
        frames: durations_ms.len(),
        is_variable,
    })
}

/// Approximate `frames_per_second` as `numerator / denominator` with both
/// terms no larger than `limit`.
///
/// Walks the continued fraction expansion and keeps the last convergent
/// that fits. Returns `None` for non-positive or non-finite rates and for
/// rates that cannot be represented within `limit`.
pub fn rational_frame_rate(frames_per_second: f64, limit: u32) -> Option<(u32, u32)> {
    if !frames_per_second.is_finite() || frames_per_second <= 0.0 || limit == 0 {
        return None;
    }
    let limit = u64::from(limit);

    let (mut p0, mut q0, mut p1, mut q1) = (0u64, 1u64, 1u64, 0u64);
    let mut rest = frames_per_second;
    loop {
        let whole = rest.floor();
        if whole > limit as f64 {
            break;
        }
        let whole = whole as u64;
        let numerator = whole * p1 + p0;
        let denominator = whole * q1 + q0;
        if numerator > limit || denominator > limit {
            break;
        }
        (p0, q0, p1, q1) = (p1, q1, numerator, denominator);

        let fraction = rest - whole as f64;
        if fraction < 1e-9 {
            break;
        }
        rest = 1.0 / fraction;
    }

    if p1 == 0 || q1 == 0 {
        return None;
    }
    Some((p1 as u32, q1 as u32))
}
