//! The clip data model.
//!
//! A [`Clip`] is the canonical output unit of the pipeline: a scored time
//! range inside a source video, tagged with the strategy that proposed it.
//! Clips carry the source path and the time range — enough for a downstream
//! editor to re-open and trim the original file — and serialize as part of a
//! cache record.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The strategy that proposed a candidate clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClipStrategy {
    /// Sustained run above the high motion percentile.
    HighMotion,
    /// Sustained run above the medium motion percentile.
    MediumMotion,
    /// Fixed window around a detected scene change.
    SceneTransition,
    /// Deliberately discounted coverage segment for featureless footage.
    FallbackCoverage,
}

/// A scored time range inside a source video.
///
/// Invariants maintained by the generator and ranker:
/// `start_time < end_time` within `[0, duration]`,
/// `duration == end_time - start_time`, and both `brightness_score` and
/// `quality_score` clamped to `[0.0, 1.0]`. Threshold strategies also keep
/// `duration` within the configured clip duration bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    /// Path of the video this clip was cut from.
    pub source_path: PathBuf,
    /// Clip start in seconds.
    pub start_time: f64,
    /// Clip end in seconds.
    pub end_time: f64,
    /// Clip length in seconds (`end_time - start_time`).
    pub duration: f64,
    /// Mean motion signal value over the clip window. Non-negative.
    pub motion_score: f64,
    /// Exposure quality at the clip's representative frame, in `[0, 1]`.
    pub brightness_score: f64,
    /// Composite ranking score in `[0, 1]`.
    pub quality_score: f64,
    /// The strategy that proposed this clip.
    pub strategy: ClipStrategy,
    /// Human-readable provenance, informational only.
    pub description: String,
}

impl Clip {
    /// Returns `true` if this clip's `[start, end)` range intersects the
    /// other clip's range.
    pub fn overlaps(&self, other: &Clip) -> bool {
        self.start_time < other.end_time && self.end_time > other.start_time
    }
}
