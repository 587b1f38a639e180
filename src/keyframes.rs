//! Keyframe extraction.
//!
//! Pulls a small set of evenly spaced frames from a video at the analysis
//! resolution. The frames double as a visual summary of the file and as the
//! thumbnail payload persisted alongside cached analysis results.

use image::RgbImage;

use crate::{config::PipelineConfig, error::ClipsiftError, source::VideoSource};

/// Extract evenly spaced keyframes at the configured analysis resolution.
///
/// Extracts `config.keyframes_per_video` frames spread across the whole
/// stream (first and last frame included); when the video has fewer frames
/// than that, every frame is taken. Frames the decoder cannot reproduce are
/// simply absent from the result, so the returned vector may be shorter than
/// requested — and empty for a source with no decodable frames.
///
/// # Errors
///
/// Propagates decode-setup and seek failures from the source.
pub fn extract_keyframes(
    source: &mut VideoSource,
    config: &PipelineConfig,
) -> Result<Vec<RgbImage>, ClipsiftError> {
    let frame_count = source.info().frame_count;
    let indices = keyframe_indices(frame_count, config.keyframes_per_video);

    log::debug!(
        "Extracting {} keyframes from {}",
        indices.len(),
        source.path().display()
    );

    let mut keyframes = Vec::with_capacity(indices.len());
    source.frames_at(
        &indices,
        Some((config.analysis_width, config.analysis_height)),
        |_frame_number, image| {
            keyframes.push(image.to_rgb8());
            Ok(())
        },
    )?;

    Ok(keyframes)
}

/// Compute the evenly spaced frame indices for keyframe extraction.
///
/// Returns `count` indices spanning `[0, frame_count - 1]` inclusive,
/// deduplicated (short videos collapse neighbouring targets). When the video
/// has `count` frames or fewer, every frame index is returned.
pub(crate) fn keyframe_indices(frame_count: u64, count: usize) -> Vec<u64> {
    if frame_count == 0 || count == 0 {
        return Vec::new();
    }

    if frame_count <= count as u64 {
        return (0..frame_count).collect();
    }

    let last = frame_count - 1;
    let mut indices: Vec<u64> = (0..count)
        .map(|position| {
            if count == 1 {
                0
            } else {
                position as u64 * last / (count as u64 - 1)
            }
        })
        .collect();
    indices.dedup();
    indices
}
