//! Motion intensity analysis.
//!
//! Computes a per-sampled-frame motion signal by differencing consecutive
//! sampled frames. Each sampled frame is converted to grayscale and blurred
//! with a wide Gaussian to suppress sensor noise before the mean absolute
//! difference against the previous blurred sample is taken. The first
//! sampled frame has no predecessor and produces no score.

use image::{GrayImage, RgbImage, imageops};

use crate::{
    config::PipelineConfig, error::ClipsiftError, signal::SampledSignal, source::VideoSource,
};

/// Analyze motion intensity throughout the video.
///
/// Scans the stream once, sampling every `config.sample_stride`-th frame.
/// The returned signal holds one value per consecutive sampled-frame pair,
/// carrying the timestamp of the pair's earlier sample. A sample the decoder
/// skips leaves a gap in the signal; the surviving points keep their true
/// positions. The signal is empty when the source yields fewer than two
/// samples.
///
/// # Errors
///
/// Propagates decode-setup failures from the source. Individual corrupt
/// frames are skipped inside the scan, leaving a gap in the signal.
pub fn analyze_motion(
    source: &mut VideoSource,
    config: &PipelineConfig,
) -> Result<SampledSignal, ClipsiftError> {
    let stride = config.sample_stride;

    log::debug!(
        "Analyzing motion ({}, stride={stride})",
        source.path().display()
    );

    let mut accumulator = MotionAccumulator::new(config.blur_sigma);

    source.for_each_sampled_frame(stride, |_frame_index, timestamp, rgb| {
        accumulator.observe(timestamp, rgb);
        Ok(())
    })?;

    let signal = accumulator.finish();
    log::debug!("Motion analysis produced {} samples", signal.len());
    Ok(signal)
}

/// Incrementally builds the motion signal from timestamped samples.
///
/// Each observed frame is differenced against the previously observed one,
/// whatever its timestamp; a sample that never arrives simply widens the
/// pair without shifting any point's position.
struct MotionAccumulator {
    sigma: f32,
    previous: Option<(GrayImage, f64)>,
    signal: SampledSignal,
}

impl MotionAccumulator {
    fn new(sigma: f32) -> Self {
        Self {
            sigma,
            previous: None,
            signal: SampledSignal::new(),
        }
    }

    fn observe(&mut self, timestamp: f64, rgb: &RgbImage) {
        let blurred = blurred_grayscale(rgb, self.sigma);

        if let Some((previous, previous_timestamp)) = self.previous.take() {
            self.signal.push(
                previous_timestamp,
                mean_absolute_difference(&previous, &blurred),
            );
        }

        self.previous = Some((blurred, timestamp));
    }

    fn finish(self) -> SampledSignal {
        self.signal
    }
}

/// Convert an RGB frame to grayscale and apply the noise-suppressing blur.
pub(crate) fn blurred_grayscale(frame: &RgbImage, sigma: f32) -> GrayImage {
    let gray = image::DynamicImage::ImageRgb8(frame.clone()).to_luma8();
    imageops::blur(&gray, sigma)
}

/// Mean absolute pixel difference between two equally sized grayscale frames.
///
/// Differing dimensions (stream resolution change mid-file) score 0.0 rather
/// than panicking.
pub(crate) fn mean_absolute_difference(a: &GrayImage, b: &GrayImage) -> f64 {
    if a.dimensions() != b.dimensions() || a.as_raw().is_empty() {
        return 0.0;
    }

    let total: u64 = a
        .as_raw()
        .iter()
        .zip(b.as_raw().iter())
        .map(|(&left, &right)| left.abs_diff(right) as u64)
        .sum();

    total as f64 / a.as_raw().len() as f64
}
