//! Sampled analysis signals.
//!
//! [`SampledSignal`] is the common currency between the frame analyzers and
//! the clip candidate generator: an ordered sequence of `(timestamp, value)`
//! pairs produced by sampling every Nth frame of a video. Signals serialize
//! as part of a cache record so a cached analysis can be re-ranked without
//! touching the source file again.

use serde::{Deserialize, Serialize};

/// One sampled measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalPoint {
    /// Position in the video, in seconds.
    pub timestamp: f64,
    /// Measured value at that position. Always non-negative.
    pub value: f64,
}

/// An ordered sequence of sampled measurements.
///
/// Produced by [`analyze_motion`](crate::analyze_motion); empty when the
/// source has fewer frames than the sample stride.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampledSignal {
    points: Vec<SignalPoint>,
}

impl SampledSignal {
    /// Create an empty signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a signal with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Append a measurement. Timestamps are expected to be monotonically
    /// increasing; this is not enforced here.
    pub fn push(&mut self, timestamp: f64, value: f64) {
        self.points.push(SignalPoint { timestamp, value });
    }

    /// Number of measurements in the signal.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if the signal holds no measurements.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All measurements in sample order.
    pub fn points(&self) -> &[SignalPoint] {
        &self.points
    }

    /// The measured values without their timestamps.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|point| point.value).collect()
    }

    /// Compute the `p`-th percentile of the values (0–100) with linear
    /// interpolation between closest ranks.
    ///
    /// Returns `None` for an empty signal.
    pub fn percentile(&self, p: f64) -> Option<f64> {
        if self.points.is_empty() {
            return None;
        }

        let mut sorted = self.values();
        sorted.sort_by(f64::total_cmp);

        let p = p.clamp(0.0, 100.0);
        let rank = p / 100.0 * (sorted.len() - 1) as f64;
        let lower = rank.floor() as usize;
        let fraction = rank - lower as f64;

        if lower + 1 < sorted.len() {
            Some(sorted[lower] + fraction * (sorted[lower + 1] - sorted[lower]))
        } else {
            Some(sorted[lower])
        }
    }

    /// Mean of the values whose timestamps fall within `[start, end]`.
    ///
    /// Returns `None` when no sample lies in the range.
    pub fn mean_in_range(&self, start: f64, end: f64) -> Option<f64> {
        let mut sum = 0.0;
        let mut count = 0usize;

        for point in &self.points {
            if point.timestamp >= start && point.timestamp <= end {
                sum += point.value;
                count += 1;
            }
        }

        if count == 0 { None } else { Some(sum / count as f64) }
    }
}
