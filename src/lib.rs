//! # clipsift
//!
//! Sift interesting clips out of video files — motion and scene analysis,
//! quality-ranked clip selection, keyframe extraction, and on-disk result
//! caching.
//!
//! `clipsift` scans a video once per signal, proposes candidate clips with
//! several complementary strategies (sustained motion, scene transitions,
//! and a coverage fallback for featureless footage), resolves overlaps in
//! favour of the highest-quality candidate, and returns a ranked clip list
//! together with evenly spaced keyframe thumbnails. Decoding is powered by
//! FFmpeg via the [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next)
//! crate.
//!
//! ## Quick Start
//!
//! ### Analyze a Video
//!
//! ```no_run
//! use clipsift::{ClipPipeline, PipelineConfig};
//!
//! let pipeline = ClipPipeline::new(PipelineConfig::default());
//! let analysis = pipeline.process("input.mp4").unwrap();
//! for clip in &analysis.clips {
//!     println!("{:.1}s-{:.1}s {}", clip.start_time, clip.end_time, clip.description);
//! }
//! ```
//!
//! ### Cache Results Across Runs
//!
//! ```no_run
//! use clipsift::{ClipPipeline, PipelineConfig};
//!
//! let pipeline = ClipPipeline::with_cache(PipelineConfig::default(), ".cache").unwrap();
//! let first = pipeline.process("input.mp4").unwrap();   // full analysis
//! let second = pipeline.process("input.mp4").unwrap();  // served from disk
//! assert!(second.from_cache);
//! # let _ = first;
//! ```
//!
//! ### Work with Raw Frames
//!
//! ```no_run
//! use clipsift::VideoSource;
//!
//! let mut source = VideoSource::open("input.mp4").unwrap();
//! let frame = source.frame_at(12.5).unwrap();
//! frame.save("frame.png").unwrap();
//! ```
//!
//! ## Features
//!
//! - **Motion analysis** — blurred-grayscale frame differencing sampled at a
//!   configurable stride
//! - **Scene change detection** — color histogram correlation between
//!   consecutive sampled frames
//! - **Multi-strategy clip selection** — high/medium motion runs, scene
//!   transition windows, and discounted fallback coverage
//! - **Quality ranking** — composite motion and exposure score, greedy
//!   overlap resolution, configurable result cap
//! - **Keyframe extraction** — evenly spaced thumbnails at the analysis
//!   resolution
//! - **Result caching** — content-addressed JSON records and JPEG
//!   thumbnails, invalidated automatically when the source file changes
//! - **Efficient seeking** — seeks to nearest keyframe, then decodes forward
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod brightness;
pub mod cache;
pub mod candidates;
pub mod clip;
pub mod config;
mod conversion;
pub mod error;
pub mod keyframes;
pub mod motion;
pub mod pipeline;
pub mod ranker;
pub mod scene;
pub mod signal;
pub mod source;

pub use brightness::{brightness_score, frame_brightness};
pub use cache::{CacheEntry, CacheStats, ResultCache};
pub use candidates::generate_candidates;
pub use clip::{Clip, ClipStrategy};
pub use config::PipelineConfig;
pub use error::ClipsiftError;
pub use keyframes::extract_keyframes;
pub use motion::analyze_motion;
pub use pipeline::{ClipPipeline, VideoAnalysis};
pub use ranker::{rank, resolve_overlaps};
pub use scene::detect_scene_changes;
pub use signal::{SampledSignal, SignalPoint};
pub use source::{VideoInfo, VideoSource};
