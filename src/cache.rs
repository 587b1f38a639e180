//! Content-addressed persistence of analysis results.
//!
//! Re-analyzing a video is expensive, so every completed analysis is written
//! to disk keyed by a fingerprint of the source file's identity (path, byte
//! size, modification time). A later run against an unchanged file loads the
//! stored result instead of decoding; any edit to the file changes the
//! fingerprint and silently invalidates the old entry.
//!
//! The cache is strictly best-effort: a failure while loading or saving is
//! logged and treated as a miss, never surfaced as a pipeline error.
//! Analysis records are JSON files under `video_analysis/`, keyframe
//! thumbnails are JPEG files under `keyframes/`, both inside the cache root.

use std::{
    fs,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use image::RgbImage;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{clip::Clip, error::ClipsiftError, signal::SampledSignal};

/// Bumped whenever the record layout changes incompatibly; records written
/// under another version are treated as misses.
const SCHEMA_VERSION: u32 = 2;

/// Hex characters of the fingerprint digest kept in file names.
const FINGERPRINT_LENGTH: usize = 32;

/// One cached analysis result, as returned by [`ResultCache::load`] and
/// accepted by [`ResultCache::save`].
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Ranked clips for the video.
    pub clips: Vec<Clip>,
    /// The motion signal computed during analysis.
    pub motion: SampledSignal,
    /// Scene-change timestamps in seconds.
    pub scene_changes: Vec<f64>,
    /// Opaque annotations attached by downstream consumers (external
    /// analysis results). Passed through the cache untouched, never
    /// interpreted here.
    pub annotations: Vec<serde_json::Value>,
    /// Decoded keyframe thumbnails at the analysis resolution.
    pub keyframes: Vec<RgbImage>,
}

/// Aggregate cache usage, from [`ResultCache::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of analysis records on disk.
    pub record_count: usize,
    /// Number of keyframe thumbnails on disk.
    pub keyframe_count: usize,
    /// Total bytes across records and thumbnails.
    pub total_bytes: u64,
}

/// On-disk record layout. Keyframes are referenced by path and stored as
/// separate JPEG files next to the record.
#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
    schema_version: u32,
    fingerprint: String,
    source_path: PathBuf,
    clips: Vec<Clip>,
    motion: SampledSignal,
    scene_changes: Vec<f64>,
    #[serde(default)]
    annotations: Vec<serde_json::Value>,
    keyframe_files: Vec<PathBuf>,
    #[serde(default)]
    created_at_secs: u64,
}

/// A content-addressed result cache rooted at one directory.
#[derive(Debug)]
pub struct ResultCache {
    records_dir: PathBuf,
    keyframes_dir: PathBuf,
}

impl ResultCache {
    /// Open (and create if needed) a cache rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`ClipsiftError::IoError`] if the cache directories cannot be
    /// created.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, ClipsiftError> {
        let root = root.as_ref();
        let records_dir = root.join("video_analysis");
        let keyframes_dir = root.join("keyframes");

        fs::create_dir_all(&records_dir)?;
        fs::create_dir_all(&keyframes_dir)?;

        log::debug!("Result cache opened at {}", root.display());

        Ok(Self {
            records_dir,
            keyframes_dir,
        })
    }

    /// Returns `true` if a current entry exists for `source_path`.
    ///
    /// Current means the record file for the file's present fingerprint
    /// exists; a stale entry from an older version of the file does not
    /// count.
    pub fn has(&self, source_path: &Path) -> bool {
        match fingerprint(source_path) {
            Some(fp) => self.record_path(source_path, &fp).is_file(),
            None => false,
        }
    }

    /// Load the cached entry for `source_path`, if one is current.
    ///
    /// Every failure mode — unreadable source file, missing or malformed
    /// record, schema mismatch, fingerprint drift, missing keyframe file —
    /// is logged at debug level and reported as `None`.
    pub fn load(&self, source_path: &Path) -> Option<CacheEntry> {
        let fp = fingerprint(source_path)?;
        let record_path = self.record_path(source_path, &fp);

        let raw = match fs::read_to_string(&record_path) {
            Ok(raw) => raw,
            Err(error) => {
                log::debug!("Cache miss for {}: {error}", source_path.display());
                return None;
            }
        };

        let record: CacheRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(error) => {
                log::debug!(
                    "Discarding unreadable cache record {}: {error}",
                    record_path.display()
                );
                return None;
            }
        };

        if record.schema_version != SCHEMA_VERSION {
            log::debug!(
                "Discarding cache record {} with schema version {}",
                record_path.display(),
                record.schema_version
            );
            return None;
        }

        if record.fingerprint != fp {
            log::debug!(
                "Discarding stale cache record {} (fingerprint changed)",
                record_path.display()
            );
            return None;
        }

        let mut keyframes = Vec::with_capacity(record.keyframe_files.len());
        for keyframe_path in &record.keyframe_files {
            match image::open(keyframe_path) {
                Ok(image) => keyframes.push(image.to_rgb8()),
                Err(error) => {
                    // A record without its thumbnails is incomplete; treat
                    // the whole entry as a miss.
                    log::debug!(
                        "Cache keyframe {} unreadable: {error}",
                        keyframe_path.display()
                    );
                    return None;
                }
            }
        }

        log::info!(
            "Cache hit for {} ({} clips, {} keyframes)",
            source_path.display(),
            record.clips.len(),
            keyframes.len()
        );

        Some(CacheEntry {
            clips: record.clips,
            motion: record.motion,
            scene_changes: record.scene_changes,
            annotations: record.annotations,
            keyframes,
        })
    }

    /// Persist an analysis result for `source_path`.
    ///
    /// Existing files for the same video (any fingerprint) are removed
    /// first, so a re-analysis after a file edit replaces the old entry
    /// rather than accumulating next to it. Failures are logged and
    /// swallowed; the analysis result itself is never at risk.
    pub fn save(&self, source_path: &Path, entry: &CacheEntry) {
        let Some(fp) = fingerprint(source_path) else {
            log::warn!(
                "Not caching {}: file cannot be fingerprinted",
                source_path.display()
            );
            return;
        };

        self.remove_entries_for(source_path);

        let stem = file_stem(source_path);
        let mut keyframe_files = Vec::with_capacity(entry.keyframes.len());

        for (index, keyframe) in entry.keyframes.iter().enumerate() {
            let keyframe_path = self
                .keyframes_dir
                .join(format!("{stem}_{fp}_frame_{index}.jpg"));
            if let Err(error) = keyframe.save(&keyframe_path) {
                log::warn!(
                    "Failed to write cache keyframe {}: {error}",
                    keyframe_path.display()
                );
                return;
            }
            keyframe_files.push(keyframe_path);
        }

        let record = CacheRecord {
            schema_version: SCHEMA_VERSION,
            fingerprint: fp.clone(),
            source_path: source_path.to_path_buf(),
            clips: entry.clips.clone(),
            motion: entry.motion.clone(),
            scene_changes: entry.scene_changes.clone(),
            annotations: entry.annotations.clone(),
            keyframe_files,
            created_at_secs: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_secs())
                .unwrap_or(0),
        };

        let record_path = self.record_path(source_path, &fp);
        let written = serde_json::to_string_pretty(&record)
            .map_err(ClipsiftError::from)
            .and_then(|json| fs::write(&record_path, json).map_err(ClipsiftError::from));

        match written {
            Ok(()) => log::debug!("Cached analysis at {}", record_path.display()),
            Err(error) => log::warn!(
                "Failed to write cache record {}: {error}",
                record_path.display()
            ),
        }
    }

    /// Append opaque annotations to an existing entry's record.
    ///
    /// Rewrites only the JSON record; the stored keyframe files are left
    /// untouched, so repeated annotation never re-encodes them. Returns
    /// `false` when no current entry exists for the file or the write fails.
    pub fn append_annotations(
        &self,
        source_path: &Path,
        annotations: Vec<serde_json::Value>,
    ) -> bool {
        let Some(fp) = fingerprint(source_path) else {
            return false;
        };
        let record_path = self.record_path(source_path, &fp);

        let Ok(raw) = fs::read_to_string(&record_path) else {
            return false;
        };
        let Ok(mut record) = serde_json::from_str::<CacheRecord>(&raw) else {
            log::debug!(
                "Not annotating unreadable cache record {}",
                record_path.display()
            );
            return false;
        };
        if record.schema_version != SCHEMA_VERSION || record.fingerprint != fp {
            return false;
        }

        record.annotations.extend(annotations);

        let written = serde_json::to_string_pretty(&record)
            .map_err(ClipsiftError::from)
            .and_then(|json| fs::write(&record_path, json).map_err(ClipsiftError::from));

        match written {
            Ok(()) => true,
            Err(error) => {
                log::warn!(
                    "Failed to annotate cache record {}: {error}",
                    record_path.display()
                );
                false
            }
        }
    }

    /// Remove all cached data for one video, regardless of fingerprint.
    pub fn clear(&self, source_path: &Path) {
        self.remove_entries_for(source_path);
    }

    /// Remove every record and keyframe in the cache.
    pub fn clear_all(&self) {
        remove_matching(&self.records_dir, |_| true);
        remove_matching(&self.keyframes_dir, |_| true);
        log::info!("Result cache cleared");
    }

    /// Aggregate counts and on-disk size of the cache.
    pub fn stats(&self) -> CacheStats {
        let (record_count, record_bytes) = dir_usage(&self.records_dir);
        let (keyframe_count, keyframe_bytes) = dir_usage(&self.keyframes_dir);

        CacheStats {
            record_count,
            keyframe_count,
            total_bytes: record_bytes + keyframe_bytes,
        }
    }

    fn record_path(&self, source_path: &Path, fp: &str) -> PathBuf {
        self.records_dir
            .join(format!("{}_{fp}.json", file_stem(source_path)))
    }

    /// Delete every record and keyframe file belonging to this video,
    /// across any prior fingerprint.
    ///
    /// Matching is exact on the `<stem>_<fingerprint>` layout so a video
    /// named `final.mp4` never claims the files of `final_v2.mp4`.
    fn remove_entries_for(&self, source_path: &Path) {
        let stem = file_stem(source_path);
        remove_matching(&self.records_dir, |name| is_entry_file(name, &stem));
        remove_matching(&self.keyframes_dir, |name| is_entry_file(name, &stem));
    }
}

/// Returns `true` if `name` is a cache file for the given video stem: the
/// stem, an underscore, a full-length hex fingerprint, then `.json` (record)
/// or `_frame_<i>.jpg` (keyframe).
fn is_entry_file(name: &str, stem: &str) -> bool {
    let Some(rest) = name
        .strip_prefix(stem)
        .and_then(|rest| rest.strip_prefix('_'))
    else {
        return false;
    };

    let bytes = rest.as_bytes();
    if bytes.len() < FINGERPRINT_LENGTH
        || !bytes[..FINGERPRINT_LENGTH].iter().all(u8::is_ascii_hexdigit)
    {
        return false;
    }

    let tail = &rest[FINGERPRINT_LENGTH..];
    tail == ".json" || tail.starts_with("_frame_")
}

/// Fingerprint a file by path, size, and modification time.
///
/// Returns the first 32 hex characters of the SHA-256 digest, or `None` when
/// the file's metadata cannot be read.
fn fingerprint(source_path: &Path) -> Option<String> {
    let metadata = fs::metadata(source_path).ok()?;
    let modified_nanos = metadata
        .modified()
        .ok()?
        .duration_since(UNIX_EPOCH)
        .ok()?
        .as_nanos();

    let identity = format!(
        "{}_{}_{}",
        source_path.display(),
        metadata.len(),
        modified_nanos
    );

    let digest = Sha256::digest(identity.as_bytes());
    let mut hex = String::with_capacity(FINGERPRINT_LENGTH);
    for byte in digest.iter().take(FINGERPRINT_LENGTH / 2) {
        hex.push_str(&format!("{byte:02x}"));
    }
    Some(hex)
}

fn file_stem(source_path: &Path) -> String {
    source_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string())
}

/// Remove regular files in `dir` whose names match the predicate. Errors are
/// logged and ignored.
fn remove_matching(dir: &Path, matches: impl Fn(&str) -> bool) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if matches(name)
            && let Err(error) = fs::remove_file(entry.path())
        {
            log::warn!("Failed to remove cache file {name}: {error}");
        }
    }
}

/// Count files and sum their sizes in one directory.
fn dir_usage(dir: &Path) -> (usize, u64) {
    let Ok(entries) = fs::read_dir(dir) else {
        return (0, 0);
    };

    let mut count = 0;
    let mut bytes = 0;
    for entry in entries.flatten() {
        if let Ok(metadata) = entry.metadata()
            && metadata.is_file()
        {
            count += 1;
            bytes += metadata.len();
        }
    }
    (count, bytes)
}
