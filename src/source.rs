//! Video decoding and frame access.
//!
//! [`VideoSource`] is the entry point for everything that touches pixels. It
//! opens a video file, probes its metadata once, and provides random access
//! to individual frames as well as a sequential sampled scan used by the
//! frame analyzers. One demuxer context is held per open source and released
//! on drop; every extraction method builds a fresh decoder that is dropped
//! when the method returns.
//!
//! # Example
//!
//! ```no_run
//! use clipsift::VideoSource;
//!
//! let mut source = VideoSource::open("flight.mp4")?;
//! println!("{:.1}s at {:.2} fps", source.info().duration, source.info().frames_per_second);
//! let frame = source.frame(0)?;
//! frame.save("first_frame.png")?;
//! # Ok::<(), clipsift::ClipsiftError>(())
//! ```

use std::path::{Path, PathBuf};

use ffmpeg_next::{
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, RgbImage};

use crate::{conversion, error::ClipsiftError};

/// Probed metadata for an open video file.
///
/// Extracted once during [`VideoSource::open`]; reading it never decodes.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Average frame rate.
    pub frames_per_second: f64,
    /// Total number of frames (exact when the container reports it,
    /// otherwise derived from duration and frame rate).
    pub frame_count: u64,
    /// Duration in seconds.
    pub duration: f64,
    /// File size in bytes.
    pub byte_size: u64,
}

/// An open video file.
///
/// Holds the FFmpeg demuxer context and cached [`VideoInfo`]. The decoder
/// handle is released when the value is dropped, on every path.
pub struct VideoSource {
    pub(crate) input: Input,
    info: VideoInfo,
    stream_index: usize,
    path: PathBuf,
}

impl std::fmt::Debug for VideoSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoSource")
            .field("path", &self.path)
            .field("info", &self.info)
            .field("stream_index", &self.stream_index)
            .finish_non_exhaustive()
    }
}

impl VideoSource {
    /// Open a video file for analysis.
    ///
    /// Initializes FFmpeg (idempotent), opens the file, locates the best
    /// video stream, and probes its metadata.
    ///
    /// # Errors
    ///
    /// Returns [`ClipsiftError::FileOpen`] if the file cannot be opened or
    /// its frame rate cannot be determined, and
    /// [`ClipsiftError::NoVideoStream`] if it carries no video stream.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ClipsiftError> {
        let path = path.as_ref();
        let owned_path = path.to_path_buf();

        log::debug!("Opening video file: {}", owned_path.display());

        ffmpeg_next::init().map_err(|error| ClipsiftError::FileOpen {
            path: owned_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let byte_size = std::fs::metadata(path)
            .map_err(|error| ClipsiftError::FileOpen {
                path: owned_path.clone(),
                reason: error.to_string(),
            })?
            .len();

        let input = ffmpeg_next::format::input(&path).map_err(|error| ClipsiftError::FileOpen {
            path: owned_path.clone(),
            reason: error.to_string(),
        })?;

        let stream = input
            .streams()
            .best(Type::Video)
            .ok_or(ClipsiftError::NoVideoStream)?;
        let stream_index = stream.index();

        let decoder_context = CodecContext::from_parameters(stream.parameters()).map_err(
            |error| ClipsiftError::FileOpen {
                path: owned_path.clone(),
                reason: format!("Failed to read video codec parameters: {error}"),
            },
        )?;
        let decoder = decoder_context
            .decoder()
            .video()
            .map_err(|error| ClipsiftError::FileOpen {
                path: owned_path.clone(),
                reason: format!("Failed to create video decoder: {error}"),
            })?;

        let width = decoder.width();
        let height = decoder.height();

        // Prefer the average frame rate; fall back to the raw rate field.
        let frame_rate = stream.avg_frame_rate();
        let frames_per_second = if frame_rate.denominator() != 0 && frame_rate.numerator() != 0 {
            frame_rate.numerator() as f64 / frame_rate.denominator() as f64
        } else {
            let rate = stream.rate();
            if rate.denominator() != 0 {
                rate.numerator() as f64 / rate.denominator() as f64
            } else {
                0.0
            }
        };

        if frames_per_second <= 0.0 {
            return Err(ClipsiftError::FileOpen {
                path: owned_path,
                reason: "Could not determine the video frame rate".to_string(),
            });
        }

        let duration_microseconds = input.duration();
        let duration = if duration_microseconds > 0 {
            duration_microseconds as f64 / 1_000_000.0
        } else {
            0.0
        };

        let reported_frames = stream.frames();
        let frame_count = if reported_frames > 0 {
            reported_frames as u64
        } else {
            (duration * frames_per_second) as u64
        };

        let info = VideoInfo {
            width,
            height,
            frames_per_second,
            frame_count,
            duration,
            byte_size,
        };

        log::info!(
            "Opened {} ({}x{}, {:.2} fps, {:.1}s, ~{} frames)",
            owned_path.display(),
            info.width,
            info.height,
            info.frames_per_second,
            info.duration,
            info.frame_count,
        );

        Ok(Self {
            input,
            info,
            stream_index,
            path: owned_path,
        })
    }

    /// Get the cached metadata probed at open time.
    pub fn info(&self) -> &VideoInfo {
        &self.info
    }

    /// Path the source was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Extract a single frame by frame number (0-indexed).
    ///
    /// Seeks to the nearest keyframe before the target and decodes forward
    /// until the requested frame is reached. If the stream skips the exact
    /// index, the closest following frame is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ClipsiftError::FrameOutOfRange`] if `frame_number` exceeds
    /// the frame count, or [`ClipsiftError::VideoDecodeError`] if decoding
    /// fails.
    pub fn frame(&mut self, frame_number: u64) -> Result<DynamicImage, ClipsiftError> {
        let total_frames = self.info.frame_count;
        if total_frames > 0 && frame_number >= total_frames {
            return Err(ClipsiftError::FrameOutOfRange {
                frame_number,
                total_frames,
            });
        }

        let frames_per_second = self.info.frames_per_second;
        let (mut decoder, mut scaler, time_base) = self.fresh_decoder(None)?;
        let (target_width, target_height) = (self.info.width, self.info.height);

        let seek_timestamp =
            conversion::frame_number_to_seek_timestamp(frame_number, frames_per_second);
        self.input.seek(seek_timestamp, ..seek_timestamp)?;

        let mut decoded_frame = VideoFrame::empty();
        let mut rgb_frame = VideoFrame::empty();

        for (stream, packet) in self.input.packets() {
            if stream.index() != self.stream_index {
                continue;
            }

            decoder
                .send_packet(&packet)
                .map_err(|error| ClipsiftError::VideoDecodeError(error.to_string()))?;

            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                let pts = decoded_frame.pts().unwrap_or(0);
                let current =
                    conversion::pts_to_frame_number(pts, time_base, frames_per_second);

                if current >= frame_number {
                    scaler.run(&decoded_frame, &mut rgb_frame)?;
                    return convert_frame_to_image(&rgb_frame, target_width, target_height);
                }
            }
        }

        // Flush the decoder.
        let _ = decoder.send_eof();
        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            let pts = decoded_frame.pts().unwrap_or(0);
            let current = conversion::pts_to_frame_number(pts, time_base, frames_per_second);

            if current >= frame_number {
                scaler.run(&decoded_frame, &mut rgb_frame)?;
                return convert_frame_to_image(&rgb_frame, target_width, target_height);
            }
        }

        Err(ClipsiftError::VideoDecodeError(format!(
            "Could not locate frame {frame_number} in the video stream"
        )))
    }

    /// Extract a single frame at a timestamp in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ClipsiftError::InvalidTimestamp`] if the timestamp exceeds
    /// the duration, or any error from [`frame`](VideoSource::frame).
    pub fn frame_at(&mut self, seconds: f64) -> Result<DynamicImage, ClipsiftError> {
        if seconds < 0.0 || (self.info.duration > 0.0 && seconds > self.info.duration) {
            return Err(ClipsiftError::InvalidTimestamp(seconds));
        }

        let frame_number =
            conversion::seconds_to_frame_number(seconds, self.info.frames_per_second);
        self.frame(frame_number)
    }

    /// Decode frames at specific (possibly non-contiguous) frame numbers.
    ///
    /// Frame numbers are sorted and deduplicated, then decoded in order to
    /// minimise seeks; sequential runs decode without re-seeking. When
    /// `target_dimensions` is set, frames are scaled to that size instead of
    /// the source resolution. If the stream skips past a requested index
    /// (sparse or non-monotone PTS rounding), the closest following frame is
    /// delivered for it instead of dropping the target.
    ///
    /// The handler receives the requested frame number and the decoded
    /// image.
    pub fn frames_at<F>(
        &mut self,
        frame_numbers: &[u64],
        target_dimensions: Option<(u32, u32)>,
        mut handler: F,
    ) -> Result<(), ClipsiftError>
    where
        F: FnMut(u64, DynamicImage) -> Result<(), ClipsiftError>,
    {
        if frame_numbers.is_empty() {
            return Ok(());
        }

        let frames_per_second = self.info.frames_per_second;
        let (target_width, target_height) =
            target_dimensions.unwrap_or((self.info.width, self.info.height));

        let mut sorted_numbers = frame_numbers.to_vec();
        sorted_numbers.sort_unstable();
        sorted_numbers.dedup();

        let (mut decoder, mut scaler, time_base) = self.fresh_decoder(target_dimensions)?;

        let seek_timestamp =
            conversion::frame_number_to_seek_timestamp(sorted_numbers[0], frames_per_second);
        self.input.seek(seek_timestamp, ..seek_timestamp)?;

        let mut target_index = 0;
        let mut decoded_frame = VideoFrame::empty();
        let mut rgb_frame = VideoFrame::empty();

        for (stream, packet) in self.input.packets() {
            if target_index >= sorted_numbers.len() {
                break;
            }
            if stream.index() != self.stream_index {
                continue;
            }

            decoder
                .send_packet(&packet)
                .map_err(|error| ClipsiftError::VideoDecodeError(error.to_string()))?;

            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                if target_index >= sorted_numbers.len() {
                    break;
                }

                let pts = decoded_frame.pts().unwrap_or(0);
                let current =
                    conversion::pts_to_frame_number(pts, time_base, frames_per_second);

                if target_index < sorted_numbers.len()
                    && current >= sorted_numbers[target_index]
                {
                    scaler.run(&decoded_frame, &mut rgb_frame)?;
                    let image =
                        convert_frame_to_image(&rgb_frame, target_width, target_height)?;
                    // This frame is the closest available one for every
                    // target the decoder reached or jumped past.
                    for &target in targets_reached(&sorted_numbers, target_index, current) {
                        handler(target, image.clone())?;
                        target_index += 1;
                    }
                }
            }
        }

        if target_index < sorted_numbers.len() {
            let _ = decoder.send_eof();
            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                if target_index >= sorted_numbers.len() {
                    break;
                }

                let pts = decoded_frame.pts().unwrap_or(0);
                let current =
                    conversion::pts_to_frame_number(pts, time_base, frames_per_second);

                if target_index < sorted_numbers.len()
                    && current >= sorted_numbers[target_index]
                {
                    scaler.run(&decoded_frame, &mut rgb_frame)?;
                    let image =
                        convert_frame_to_image(&rgb_frame, target_width, target_height)?;
                    for &target in targets_reached(&sorted_numbers, target_index, current) {
                        handler(target, image.clone())?;
                        target_index += 1;
                    }
                }
            }
        }

        Ok(())
    }

    /// Sequentially decode the whole stream, handing every Nth frame to the
    /// handler as `(frame_index, timestamp_seconds, rgb_image)`.
    ///
    /// This is the analyzers' workhorse: one pass, no per-frame seeks, one
    /// retained frame buffer. A packet or frame that fails to decode is
    /// skipped with a warning; the scan continues with a gap at that sample
    /// point rather than aborting the analysis.
    pub fn for_each_sampled_frame<F>(
        &mut self,
        stride: u32,
        mut handler: F,
    ) -> Result<(), ClipsiftError>
    where
        F: FnMut(u64, f64, &RgbImage) -> Result<(), ClipsiftError>,
    {
        let stride = stride.max(1) as u64;
        let frames_per_second = self.info.frames_per_second;
        let (width, height) = (self.info.width, self.info.height);

        let (mut decoder, mut scaler, _time_base) = self.fresh_decoder(None)?;

        // Rewind to the start of the stream.
        self.input.seek(0, ..0)?;

        let mut frame_index: u64 = 0;
        let mut decoded_frame = VideoFrame::empty();
        let mut rgb_frame = VideoFrame::empty();

        for (stream, packet) in self.input.packets() {
            if stream.index() != self.stream_index {
                continue;
            }

            if let Err(error) = decoder.send_packet(&packet) {
                // Corrupt packet: leave a gap at this sample point. Video
                // packets carry one frame, so the frame clock still advances
                // and later samples keep their true timestamps.
                log::warn!(
                    "Skipping undecodable packet near frame {frame_index}: {error}"
                );
                frame_index += 1;
                continue;
            }

            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                if frame_index % stride == 0 {
                    match scaler.run(&decoded_frame, &mut rgb_frame) {
                        Ok(()) => {
                            let buffer =
                                conversion::frame_to_rgb_buffer(&rgb_frame, width, height);
                            if let Some(rgb) = RgbImage::from_raw(width, height, buffer) {
                                let timestamp = frame_index as f64 / frames_per_second;
                                handler(frame_index, timestamp, &rgb)?;
                            } else {
                                log::warn!("Skipping truncated frame {frame_index}");
                            }
                        }
                        Err(error) => {
                            log::warn!("Skipping unscalable frame {frame_index}: {error}");
                        }
                    }
                }
                frame_index += 1;
            }
        }

        let _ = decoder.send_eof();
        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            if frame_index % stride == 0
                && let Ok(()) = scaler.run(&decoded_frame, &mut rgb_frame)
            {
                let buffer = conversion::frame_to_rgb_buffer(&rgb_frame, width, height);
                if let Some(rgb) = RgbImage::from_raw(width, height, buffer) {
                    let timestamp = frame_index as f64 / frames_per_second;
                    handler(frame_index, timestamp, &rgb)?;
                }
            }
            frame_index += 1;
        }

        Ok(())
    }

    /// Build a fresh decoder and RGB24 scaler for this source's video stream.
    fn fresh_decoder(
        &self,
        target_dimensions: Option<(u32, u32)>,
    ) -> Result<(VideoDecoder, ScalingContext, ffmpeg_next::Rational), ClipsiftError> {
        let stream = self
            .input
            .stream(self.stream_index)
            .ok_or(ClipsiftError::NoVideoStream)?;
        let time_base = stream.time_base();

        let decoder_context = CodecContext::from_parameters(stream.parameters())?;
        let decoder = decoder_context.decoder().video()?;

        let (target_width, target_height) =
            target_dimensions.unwrap_or((decoder.width(), decoder.height()));

        let scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            target_width,
            target_height,
            ScalingFlags::BILINEAR,
        )?;

        Ok((decoder, scaler, time_base))
    }
}

/// The slice of pending extraction targets satisfied by a decoded frame:
/// every target from `next` onward whose frame number is `<= current`. More
/// than one pending target is returned when the decoder jumped past several
/// of them at once; each takes this frame as its closest following frame.
fn targets_reached(sorted_numbers: &[u64], next: usize, current: u64) -> &[u64] {
    let reached = sorted_numbers[next..]
        .iter()
        .take_while(|&&target| target <= current)
        .count();
    &sorted_numbers[next..next + reached]
}

/// Convert a scaled RGB24 video frame to an [`image::DynamicImage`].
fn convert_frame_to_image(
    rgb_frame: &VideoFrame,
    width: u32,
    height: u32,
) -> Result<DynamicImage, ClipsiftError> {
    let buffer = conversion::frame_to_rgb_buffer(rgb_frame, width, height);
    let rgb_image = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        ClipsiftError::VideoDecodeError(
            "Failed to construct RGB image from decoded frame data".to_string(),
        )
    })?;
    Ok(DynamicImage::ImageRgb8(rgb_image))
}
