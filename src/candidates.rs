//! Candidate clip generation.
//!
//! Turns the motion signal and scene-change timestamps into a pool of
//! overlapping candidate [`Clip`]s using several independent strategies.
//! Motion thresholding alone under-serves low-motion, high-quality footage,
//! and scene cuts are worth keeping even when motion is flat, so the
//! strategies are additive: high-motion runs, a more permissive
//! medium-motion pass, fixed windows around scene transitions, and a
//! discounted coverage fallback for featureless videos. Deduplication is
//! deliberately left to the ranker.
//!
//! Brightness probing is injected as a closure so the generator itself
//! stays decoder-free: the pipeline passes a live
//! [`frame_brightness`](crate::frame_brightness) probe, tests pass a
//! constant.

use std::path::Path;

use crate::{
    clip::{Clip, ClipStrategy},
    config::PipelineConfig,
    signal::SampledSignal,
};

/// Generate all candidate clips for one video.
///
/// `duration` is the video duration in seconds; `brightness_at` maps a
/// timestamp to an exposure score in `[0, 1]`. The returned pool may contain
/// overlapping candidates and may be empty — a featureless or too-short
/// video is a valid, non-error outcome.
pub fn generate_candidates(
    motion: &SampledSignal,
    scene_changes: &[f64],
    duration: f64,
    source_path: &Path,
    config: &PipelineConfig,
    brightness_at: &mut dyn FnMut(f64) -> f64,
) -> Vec<Clip> {
    let mut candidates = Vec::new();

    if let Some(threshold) = motion.percentile(config.high_motion_percentile) {
        candidates.extend(motion_run_clips(
            motion,
            threshold,
            config.max_high_motion_clips,
            ClipStrategy::HighMotion,
            "High motion",
            source_path,
            config,
            brightness_at,
        ));
    }

    if let Some(threshold) = motion.percentile(config.medium_motion_percentile) {
        candidates.extend(motion_run_clips(
            motion,
            threshold,
            config.max_medium_motion_clips,
            ClipStrategy::MediumMotion,
            "Medium motion",
            source_path,
            config,
            brightness_at,
        ));
    }

    candidates.extend(scene_transition_clips(
        scene_changes,
        duration,
        source_path,
        config,
        brightness_at,
    ));

    if candidates.len() < config.min_candidate_count {
        log::debug!(
            "Only {} candidates for {}; adding fallback coverage",
            candidates.len(),
            source_path.display()
        );
        candidates.extend(fallback_coverage_clips(
            motion,
            duration,
            source_path,
            config,
            brightness_at,
        ));
    }

    candidates
}

/// Extract clips from sustained runs of the motion signal above `threshold`.
///
/// A run opens on the first sample exceeding the threshold and closes on the
/// first sample at or below it; a run still open at the end of the signal is
/// discarded (its true extent is unknown). Closed runs are kept only when
/// their duration lies within the configured bounds.
#[allow(clippy::too_many_arguments)]
fn motion_run_clips(
    motion: &SampledSignal,
    threshold: f64,
    max_clips: usize,
    strategy: ClipStrategy,
    label: &str,
    source_path: &Path,
    config: &PipelineConfig,
    brightness_at: &mut dyn FnMut(f64) -> f64,
) -> Vec<Clip> {
    let mut clips = Vec::new();
    let mut run_start: Option<f64> = None;
    let mut run_values: Vec<f64> = Vec::new();

    for point in motion.points() {
        if point.value > threshold && clips.len() < max_clips {
            if run_start.is_none() {
                run_start = Some(point.timestamp);
            }
            run_values.push(point.value);
        } else if let Some(start) = run_start.take() {
            let clip_duration = point.timestamp - start;

            if !run_values.is_empty()
                && clip_duration >= config.min_clip_duration
                && clip_duration <= config.max_clip_duration
            {
                let mean_motion = run_values.iter().sum::<f64>() / run_values.len() as f64;
                let brightness = brightness_at(start + clip_duration / 2.0);
                let motion_norm = (mean_motion / config.motion_normalization_cap).min(1.0);
                let quality = (0.6 * motion_norm + 0.4 * brightness).clamp(0.0, 1.0);

                clips.push(Clip {
                    source_path: source_path.to_path_buf(),
                    start_time: start,
                    end_time: point.timestamp,
                    duration: clip_duration,
                    motion_score: mean_motion,
                    brightness_score: brightness,
                    quality_score: quality,
                    strategy,
                    description: format!("{label} segment ({clip_duration:.1}s)"),
                });
            }

            run_values.clear();
        }
    }

    clips
}

/// Emit a fixed `[t - 2, t + 3]` window around each detected scene change,
/// clamped to the video bounds. Transitions are valuable cut points, so
/// their quality floor sits above the motion strategies' midfield.
fn scene_transition_clips(
    scene_changes: &[f64],
    duration: f64,
    source_path: &Path,
    config: &PipelineConfig,
    brightness_at: &mut dyn FnMut(f64) -> f64,
) -> Vec<Clip> {
    let mut clips = Vec::new();

    for &change_time in scene_changes.iter().take(config.max_scene_clips) {
        let start = (change_time - 2.0).max(0.0);
        let mut end = change_time + 3.0;
        if duration > 0.0 {
            end = end.min(duration);
        }
        let clip_duration = end - start;

        if clip_duration < config.min_clip_duration {
            continue;
        }

        let brightness = brightness_at(change_time);
        let quality = (0.7 + 0.3 * brightness).clamp(0.0, 1.0);

        clips.push(Clip {
            source_path: source_path.to_path_buf(),
            start_time: start,
            end_time: end,
            duration: clip_duration,
            // Transitions carry no measured run; report a moderate level.
            motion_score: 30.0,
            brightness_score: brightness,
            quality_score: quality,
            strategy: ClipStrategy::SceneTransition,
            description: format!("Scene transition ({clip_duration:.1}s)"),
        });
    }

    clips
}

/// Emit up to three discounted coverage segments (beginning, middle, end)
/// so that even featureless footage yields something to cut from.
fn fallback_coverage_clips(
    motion: &SampledSignal,
    duration: f64,
    source_path: &Path,
    config: &PipelineConfig,
    brightness_at: &mut dyn FnMut(f64) -> f64,
) -> Vec<Clip> {
    let mut clips = Vec::new();

    if motion.is_empty() || duration <= 0.0 {
        return clips;
    }

    let segments = [
        (0.0, (duration * 0.2).min(5.0)),
        (duration * 0.4, duration * 0.4 + 5.0),
        ((duration - 5.0).max(0.0), duration),
    ];

    for (index, &(start, raw_end)) in segments.iter().enumerate() {
        let end = raw_end.min(duration);
        let clip_duration = end - start;

        if clip_duration < config.min_clip_duration {
            continue;
        }

        let Some(mean_motion) = motion.mean_in_range(start, end) else {
            continue;
        };

        let brightness = brightness_at((start + end) / 2.0);
        let quality =
            (0.3 + (mean_motion / 100.0) * 0.4 + 0.3 * brightness).clamp(0.0, 1.0);

        clips.push(Clip {
            source_path: source_path.to_path_buf(),
            start_time: start,
            end_time: end,
            duration: clip_duration,
            motion_score: mean_motion,
            brightness_score: brightness,
            quality_score: quality,
            strategy: ClipStrategy::FallbackCoverage,
            description: format!("Fallback segment {} ({clip_duration:.1}s)", index + 1),
        });
    }

    clips
}
