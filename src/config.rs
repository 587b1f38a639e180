//! Pipeline configuration.
//!
//! [`PipelineConfig`] gathers every tunable of the analysis pipeline into one
//! explicit struct passed to each component at call time. There is no
//! process-wide mutable state; two pipelines with different configurations
//! can coexist in the same process.
//!
//! # Example
//!
//! ```
//! use clipsift::PipelineConfig;
//!
//! let config = PipelineConfig::new()
//!     .with_sample_stride(5)
//!     .with_clip_duration_bounds(2.0, 15.0)
//!     .with_keyframes_per_video(8);
//! assert_eq!(config.sample_stride, 5);
//! ```

/// Tunables for the clip-extraction pipeline.
///
/// Defaults match the values the analysis heuristics were calibrated with;
/// override individual fields through the `with_*` builder methods.
#[derive(Debug, Clone)]
#[must_use]
pub struct PipelineConfig {
    /// Analyze every Nth frame. Larger strides are faster but coarser.
    pub sample_stride: u32,
    /// Minimum accepted clip duration in seconds (threshold strategies).
    pub min_clip_duration: f64,
    /// Maximum accepted clip duration in seconds (threshold strategies).
    pub max_clip_duration: f64,
    /// Number of evenly spaced keyframes extracted per video.
    pub keyframes_per_video: usize,
    /// Scene-change sensitivity in the 0–100 range. A change is flagged when
    /// histogram correlation drops below `1.0 - threshold / 100.0`.
    pub scene_change_threshold: f64,
    /// Width of extracted keyframes (analysis resolution).
    pub analysis_width: u32,
    /// Height of extracted keyframes (analysis resolution).
    pub analysis_height: u32,
    /// Motion percentile that opens a high-motion run.
    pub high_motion_percentile: f64,
    /// Motion percentile that opens a medium-motion run.
    pub medium_motion_percentile: f64,
    /// Cap on high-motion candidates per video.
    pub max_high_motion_clips: usize,
    /// Cap on medium-motion candidates per video.
    pub max_medium_motion_clips: usize,
    /// Cap on scene-transition candidates per video.
    pub max_scene_clips: usize,
    /// Fallback coverage kicks in below this candidate count.
    pub min_candidate_count: usize,
    /// Maximum number of clips returned after ranking.
    pub max_clips: usize,
    /// Mean motion value that maps to a normalized motion score of 1.0.
    pub motion_normalization_cap: f64,
    /// Gaussian blur sigma applied before frame differencing. 3.5 is the
    /// continuous equivalent of the 21x21 kernel used during calibration.
    pub blur_sigma: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_stride: 10,
            min_clip_duration: 1.0,
            max_clip_duration: 25.0,
            keyframes_per_video: 16,
            scene_change_threshold: 30.0,
            analysis_width: 640,
            analysis_height: 360,
            high_motion_percentile: 60.0,
            medium_motion_percentile: 40.0,
            max_high_motion_clips: 10,
            max_medium_motion_clips: 5,
            max_scene_clips: 5,
            min_candidate_count: 3,
            max_clips: 20,
            motion_normalization_cap: 50.0,
            blur_sigma: 3.5,
        }
    }
}

impl PipelineConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the frame sampling stride. Clamped to a minimum of 1.
    pub fn with_sample_stride(mut self, stride: u32) -> Self {
        self.sample_stride = stride.max(1);
        self
    }

    /// Set the accepted clip duration bounds in seconds.
    pub fn with_clip_duration_bounds(mut self, min: f64, max: f64) -> Self {
        self.min_clip_duration = min;
        self.max_clip_duration = max;
        self
    }

    /// Set the number of keyframes extracted per video.
    pub fn with_keyframes_per_video(mut self, count: usize) -> Self {
        self.keyframes_per_video = count.max(1);
        self
    }

    /// Set the scene-change sensitivity (0–100).
    pub fn with_scene_change_threshold(mut self, threshold: f64) -> Self {
        self.scene_change_threshold = threshold.clamp(0.0, 100.0);
        self
    }

    /// Set the keyframe analysis resolution.
    pub fn with_analysis_resolution(mut self, width: u32, height: u32) -> Self {
        self.analysis_width = width.max(1);
        self.analysis_height = height.max(1);
        self
    }

    /// Set the maximum number of ranked clips returned per video.
    pub fn with_max_clips(mut self, max_clips: usize) -> Self {
        self.max_clips = max_clips.max(1);
        self
    }
}
