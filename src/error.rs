//! Error types for the `clipsift` crate.
//!
//! This module defines [`ClipsiftError`], the unified error type returned by
//! all fallible operations in the crate. Variants carry enough context to
//! diagnose a failure without additional logging at the call site.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `clipsift` operations.
///
/// Every public method that can fail returns `Result<T, ClipsiftError>`.
/// Per-file analysis failures propagate through this type; cache failures
/// never do — the cache swallows its own errors and degrades to a miss.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClipsiftError {
    /// The video file could not be opened.
    #[error("Failed to open video file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::VideoSource::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// The requested frame number exceeds the total frame count.
    #[error("Frame {frame_number} is out of range (video has {total_frames} frames)")]
    FrameOutOfRange {
        /// The frame number that was requested.
        frame_number: u64,
        /// The total number of frames in the video.
        total_frames: u64,
    },

    /// The requested timestamp exceeds the video duration.
    #[error("Invalid timestamp: {0:.3}s")]
    InvalidTimestamp(f64),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate during frame conversion or keyframe
    /// persistence.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// A cache record could not be serialized or deserialized.
    ///
    /// Only surfaces from internal cache helpers; the public cache API
    /// converts this into a logged cache miss.
    #[error("Cache serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<FfmpegError> for ClipsiftError {
    fn from(error: FfmpegError) -> Self {
        ClipsiftError::FfmpegError(error.to_string())
    }
}
