//! Frame exposure scoring.
//!
//! A pure, piecewise score of how well a frame is exposed: mid-range mean
//! intensities score 1.0, while under- and over-exposed frames are penalized
//! linearly toward 0.0 at the extremes.

use image::GrayImage;

use crate::{error::ClipsiftError, source::VideoSource};

/// Intensity below which a frame counts as under-exposed.
const LOW_BOUND: f64 = 50.0;
/// Intensity above which a frame counts as over-exposed.
const HIGH_BOUND: f64 = 200.0;

/// Score the exposure quality of a grayscale frame.
///
/// Mean intensity `b` maps to: `b / 50` below the low bound,
/// `(255 - b) / 55` above the high bound, and `1.0` in between. The result
/// is clamped to `[0.0, 1.0]`.
pub fn brightness_score(frame: &GrayImage) -> f64 {
    if frame.as_raw().is_empty() {
        return 0.0;
    }

    let total: u64 = frame.as_raw().iter().map(|&value| value as u64).sum();
    let mean = total as f64 / frame.as_raw().len() as f64;

    let score = if mean < LOW_BOUND {
        mean / LOW_BOUND
    } else if mean > HIGH_BOUND {
        (255.0 - mean) / (255.0 - HIGH_BOUND)
    } else {
        1.0
    };

    score.clamp(0.0, 1.0)
}

/// Probe the brightness score of the frame at `timestamp` seconds.
///
/// Used by the candidate generator to score clip midpoints. A failed seek or
/// decode yields the neutral score 0.5 instead of an error — a single
/// unreadable probe frame must not sink the whole analysis.
pub fn frame_brightness(source: &mut VideoSource, timestamp: f64) -> f64 {
    match probe(source, timestamp) {
        Ok(score) => score,
        Err(error) => {
            log::debug!("Brightness probe at {timestamp:.2}s failed, using neutral score: {error}");
            0.5
        }
    }
}

fn probe(source: &mut VideoSource, timestamp: f64) -> Result<f64, ClipsiftError> {
    let frame = source.frame_at(timestamp)?;
    Ok(brightness_score(&frame.to_luma8()))
}
