//! The end-to-end clip extraction pipeline.
//!
//! [`ClipPipeline`] wires the stages together: open the source, measure
//! motion and scene changes, generate and rank candidate clips, extract
//! keyframes, and (when a cache is attached) short-circuit the whole chain
//! for unchanged files.
//!
//! # Example
//!
//! ```no_run
//! use clipsift::{ClipPipeline, PipelineConfig};
//!
//! let pipeline = ClipPipeline::with_cache(PipelineConfig::default(), ".clipsift-cache")?;
//! let analysis = pipeline.process("flight.mp4")?;
//! for clip in &analysis.clips {
//!     println!("{:6.1}s - {:6.1}s  {:.2}  {}", clip.start_time, clip.end_time,
//!         clip.quality_score, clip.description);
//! }
//! # Ok::<(), clipsift::ClipsiftError>(())
//! ```

use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::{
    brightness, candidates,
    cache::{CacheEntry, ResultCache},
    clip::Clip,
    config::PipelineConfig,
    error::ClipsiftError,
    keyframes, motion, ranker, scene,
    signal::SampledSignal,
};

/// The complete analysis result for one video.
#[derive(Debug, Clone)]
pub struct VideoAnalysis {
    /// Path of the analyzed video.
    pub source_path: PathBuf,
    /// Ranked, non-overlapping clips, best first.
    pub clips: Vec<Clip>,
    /// Evenly spaced keyframe thumbnails at the analysis resolution.
    pub keyframes: Vec<RgbImage>,
    /// The sampled motion signal.
    pub motion: SampledSignal,
    /// Scene-change timestamps in seconds, ascending.
    pub scene_changes: Vec<f64>,
    /// Opaque annotations attached by downstream consumers. Empty on a
    /// fresh analysis; round-trips through the cache untouched.
    pub annotations: Vec<serde_json::Value>,
    /// `true` when this result was served from the cache.
    pub from_cache: bool,
}

/// Runs the full analysis chain over video files.
#[derive(Debug)]
pub struct ClipPipeline {
    config: PipelineConfig,
    cache: Option<ResultCache>,
}

impl ClipPipeline {
    /// Create a pipeline without result caching.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            cache: None,
        }
    }

    /// Create a pipeline backed by a [`ResultCache`] rooted at `cache_root`.
    ///
    /// # Errors
    ///
    /// Returns [`ClipsiftError::IoError`] if the cache directories cannot be
    /// created.
    pub fn with_cache<P: AsRef<Path>>(
        config: PipelineConfig,
        cache_root: P,
    ) -> Result<Self, ClipsiftError> {
        Ok(Self {
            config,
            cache: Some(ResultCache::open(cache_root)?),
        })
    }

    /// The configuration this pipeline runs with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The attached result cache, if any.
    pub fn cache(&self) -> Option<&ResultCache> {
        self.cache.as_ref()
    }

    /// Analyze one video, serving from the cache when possible.
    ///
    /// A video that yields no clips is a valid result, not an error; the
    /// returned analysis simply carries an empty clip list.
    ///
    /// # Errors
    ///
    /// Returns any [`ClipsiftError`] from opening or scanning the source.
    /// Cache failures never surface here; they degrade to a fresh analysis.
    pub fn process<P: AsRef<Path>>(&self, source_path: P) -> Result<VideoAnalysis, ClipsiftError> {
        let source_path = source_path.as_ref();

        if let Some(cache) = &self.cache
            && let Some(entry) = cache.load(source_path)
        {
            return Ok(VideoAnalysis {
                source_path: source_path.to_path_buf(),
                clips: entry.clips,
                keyframes: entry.keyframes,
                motion: entry.motion,
                scene_changes: entry.scene_changes,
                annotations: entry.annotations,
                from_cache: true,
            });
        }

        let analysis = self.analyze(source_path)?;

        if let Some(cache) = &self.cache {
            cache.save(
                source_path,
                &CacheEntry {
                    clips: analysis.clips.clone(),
                    motion: analysis.motion.clone(),
                    scene_changes: analysis.scene_changes.clone(),
                    annotations: analysis.annotations.clone(),
                    keyframes: analysis.keyframes.clone(),
                },
            );
        }

        Ok(analysis)
    }

    /// Attach downstream annotations to a cached analysis.
    ///
    /// Appends the given opaque payloads to the cached entry for
    /// `source_path`, rewriting only its record — the stored keyframe
    /// images are not re-encoded. Returns `false` when no cache is attached
    /// or no current entry exists for the file; the payloads are never
    /// inspected.
    pub fn annotate<P: AsRef<Path>>(
        &self,
        source_path: P,
        annotations: Vec<serde_json::Value>,
    ) -> bool {
        match &self.cache {
            Some(cache) => cache.append_annotations(source_path.as_ref(), annotations),
            None => false,
        }
    }

    /// Analyze a batch of videos, skipping over per-file failures.
    ///
    /// A file that fails to open or decode is logged and dropped from the
    /// output; one corrupt file never aborts the batch.
    pub fn process_all<P: AsRef<Path>>(&self, source_paths: &[P]) -> Vec<VideoAnalysis> {
        let mut results = Vec::with_capacity(source_paths.len());

        for source_path in source_paths {
            let source_path = source_path.as_ref();
            match self.process(source_path) {
                Ok(analysis) => results.push(analysis),
                Err(error) => {
                    log::error!("Skipping {}: {error}", source_path.display());
                }
            }
        }

        results
    }

    /// Run the full analysis chain against one file, cache not consulted.
    fn analyze(&self, source_path: &Path) -> Result<VideoAnalysis, ClipsiftError> {
        log::info!("Analyzing {}", source_path.display());

        let mut source = crate::VideoSource::open(source_path)?;
        let duration = source.info().duration;

        let motion_signal = motion::analyze_motion(&mut source, &self.config)?;
        let scene_changes = scene::detect_scene_changes(&mut source, &self.config)?;

        let candidates = candidates::generate_candidates(
            &motion_signal,
            &scene_changes,
            duration,
            source_path,
            &self.config,
            &mut |timestamp| brightness::frame_brightness(&mut source, timestamp),
        );

        let clips = ranker::rank(ranker::resolve_overlaps(candidates), &self.config);
        let keyframes = keyframes::extract_keyframes(&mut source, &self.config)?;

        log::info!(
            "Selected {} clips from {} ({} keyframes)",
            clips.len(),
            source_path.display(),
            keyframes.len()
        );

        Ok(VideoAnalysis {
            source_path: source_path.to_path_buf(),
            clips,
            keyframes,
            motion: motion_signal,
            scene_changes,
            annotations: Vec::new(),
            from_cache: false,
        })
    }
}
