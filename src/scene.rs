//! Scene change detection.
//!
//! Flags shot boundaries by correlating color histograms of consecutive
//! sampled frames. Each sampled frame is reduced to a joint 3-D histogram
//! (50 bins per channel); when the Pearson correlation against the previous
//! histogram falls below the configured floor, the frame's timestamp is
//! reported as a scene change. Output is a sparse timestamp list, not a
//! dense signal.

use image::RgbImage;

use crate::{config::PipelineConfig, error::ClipsiftError, source::VideoSource};

/// Bins per color channel in the joint histogram.
const HISTOGRAM_BINS: usize = 50;

/// Detect major scene changes in the video.
///
/// Scans the stream once at the configured sample stride and returns the
/// timestamps (seconds, ascending) at which the histogram correlation
/// dropped below `1.0 - config.scene_change_threshold / 100.0`.
///
/// # Errors
///
/// Propagates decode-setup failures from the source. Individual corrupt
/// frames are skipped inside the scan.
pub fn detect_scene_changes(
    source: &mut VideoSource,
    config: &PipelineConfig,
) -> Result<Vec<f64>, ClipsiftError> {
    let correlation_floor = 1.0 - config.scene_change_threshold / 100.0;

    log::debug!(
        "Detecting scene changes ({}, correlation floor {correlation_floor:.2})",
        source.path().display()
    );

    let mut changes = Vec::new();
    let mut previous: Option<Vec<f64>> = None;

    source.for_each_sampled_frame(config.sample_stride, |_frame_index, timestamp, rgb| {
        let histogram = color_histogram(rgb);

        if let Some(prev) = &previous
            && histogram_correlation(prev, &histogram) < correlation_floor
        {
            changes.push(timestamp);
        }

        previous = Some(histogram);
        Ok(())
    })?;

    log::debug!("Detected {} scene changes", changes.len());
    Ok(changes)
}

/// Build a joint 3-D color histogram (50 bins per channel) for a frame.
///
/// The histogram is flattened to a vector of bin counts; correlation is
/// scale-invariant, so counts are not normalized.
pub(crate) fn color_histogram(frame: &RgbImage) -> Vec<f64> {
    let mut histogram = vec![0.0; HISTOGRAM_BINS * HISTOGRAM_BINS * HISTOGRAM_BINS];

    for pixel in frame.pixels() {
        let r = (pixel.0[0] as usize * HISTOGRAM_BINS) / 256;
        let g = (pixel.0[1] as usize * HISTOGRAM_BINS) / 256;
        let b = (pixel.0[2] as usize * HISTOGRAM_BINS) / 256;
        histogram[(r * HISTOGRAM_BINS + g) * HISTOGRAM_BINS + b] += 1.0;
    }

    histogram
}

/// Pearson correlation between two histograms of equal length.
///
/// Returns 1.0 for identical distributions, near 0.0 for unrelated ones.
/// Degenerate inputs (mismatched lengths, zero variance) correlate at 0.0.
pub(crate) fn histogram_correlation(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut variance_a = 0.0;
    let mut variance_b = 0.0;

    for (&value_a, &value_b) in a.iter().zip(b.iter()) {
        let da = value_a - mean_a;
        let db = value_b - mean_b;
        covariance += da * db;
        variance_a += da * da;
        variance_b += db * db;
    }

    let denominator = (variance_a * variance_b).sqrt();
    if denominator == 0.0 {
        0.0
    } else {
        covariance / denominator
    }
}
