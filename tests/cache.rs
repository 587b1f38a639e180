//! Result cache integration tests.
//!
//! Exercise the cache against real temporary directories: round-tripping an
//! entry, invalidation when the source file changes, targeted clears, and
//! usage statistics. No video decoding is involved; the cache never inspects
//! the source file beyond its metadata.

use std::{fs, path::PathBuf, thread, time::Duration};

use clipsift::{
    CacheEntry, Clip, ClipStrategy, ResultCache, SampledSignal,
};
use tempfile::TempDir;

fn sample_clip(source: &std::path::Path) -> Clip {
    Clip {
        source_path: source.to_path_buf(),
        start_time: 5.0,
        end_time: 9.0,
        duration: 4.0,
        motion_score: 18.5,
        brightness_score: 0.9,
        quality_score: 0.58,
        strategy: ClipStrategy::HighMotion,
        description: "High motion segment (4.0s)".to_string(),
    }
}

fn sample_entry(source: &std::path::Path) -> CacheEntry {
    let mut motion = SampledSignal::new();
    motion.push(0.0, 2.0);
    motion.push(0.33, 14.0);
    motion.push(0.66, 3.5);

    let keyframe = image::RgbImage::from_pixel(64, 36, image::Rgb([120, 80, 40]));

    CacheEntry {
        clips: vec![sample_clip(source)],
        motion,
        scene_changes: vec![12.5, 30.0],
        annotations: vec![serde_json::json!({"label": "aerial", "confidence": 0.92})],
        keyframes: vec![keyframe.clone(), keyframe],
    }
}

fn write_source(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, b"pretend video bytes").expect("write source");
    path
}

#[test]
fn saved_entry_round_trips() {
    let dir = TempDir::new().expect("tempdir");
    let source = write_source(&dir, "flight.mp4");
    let cache = ResultCache::open(dir.path().join("cache")).expect("open cache");

    assert!(!cache.has(&source));
    cache.save(&source, &sample_entry(&source));
    assert!(cache.has(&source));

    let loaded = cache.load(&source).expect("cache hit");
    assert_eq!(loaded.clips, vec![sample_clip(&source)]);
    assert_eq!(loaded.scene_changes, vec![12.5, 30.0]);
    assert_eq!(
        loaded.annotations,
        vec![serde_json::json!({"label": "aerial", "confidence": 0.92})]
    );
    assert_eq!(loaded.motion.len(), 3);
    assert_eq!(loaded.keyframes.len(), 2);
    assert_eq!(loaded.keyframes[0].dimensions(), (64, 36));
}

#[test]
fn modifying_the_source_invalidates_the_entry() {
    let dir = TempDir::new().expect("tempdir");
    let source = write_source(&dir, "flight.mp4");
    let cache = ResultCache::open(dir.path().join("cache")).expect("open cache");

    cache.save(&source, &sample_entry(&source));
    assert!(cache.has(&source));

    // Grow the file; size (and mtime) change the fingerprint.
    thread::sleep(Duration::from_millis(10));
    fs::write(&source, b"pretend video bytes, re-exported").expect("rewrite source");

    assert!(!cache.has(&source));
    assert!(cache.load(&source).is_none());
}

#[test]
fn missing_source_file_is_a_miss() {
    let dir = TempDir::new().expect("tempdir");
    let cache = ResultCache::open(dir.path().join("cache")).expect("open cache");
    let ghost = dir.path().join("deleted.mp4");

    assert!(!cache.has(&ghost));
    assert!(cache.load(&ghost).is_none());
}

#[test]
fn clear_removes_only_the_targeted_video() {
    let dir = TempDir::new().expect("tempdir");
    let first = write_source(&dir, "first.mp4");
    let second = write_source(&dir, "second.mp4");
    let cache = ResultCache::open(dir.path().join("cache")).expect("open cache");

    cache.save(&first, &sample_entry(&first));
    cache.save(&second, &sample_entry(&second));

    cache.clear(&first);

    assert!(!cache.has(&first));
    assert!(cache.has(&second));
    assert!(cache.load(&second).is_some());
}

#[test]
fn prefix_sharing_stems_do_not_collide() {
    let dir = TempDir::new().expect("tempdir");
    let short = write_source(&dir, "final.mp4");
    let long = write_source(&dir, "final_v2.mp4");
    let cache = ResultCache::open(dir.path().join("cache")).expect("open cache");

    cache.save(&short, &sample_entry(&short));
    cache.save(&long, &sample_entry(&long));

    // Saving `final.mp4` again must not wipe `final_v2.mp4`'s files even
    // though its name starts with `final_`.
    cache.save(&short, &sample_entry(&short));
    assert!(cache.has(&long));
    assert!(cache.load(&long).is_some());

    cache.clear(&short);
    assert!(!cache.has(&short));
    assert!(cache.has(&long));
    let survivor = cache.load(&long).expect("entry must survive");
    assert_eq!(survivor.keyframes.len(), 2);
}

#[test]
fn clear_all_empties_the_cache() {
    let dir = TempDir::new().expect("tempdir");
    let first = write_source(&dir, "first.mp4");
    let second = write_source(&dir, "second.mp4");
    let cache = ResultCache::open(dir.path().join("cache")).expect("open cache");

    cache.save(&first, &sample_entry(&first));
    cache.save(&second, &sample_entry(&second));
    cache.clear_all();

    assert!(!cache.has(&first));
    assert!(!cache.has(&second));

    let stats = cache.stats();
    assert_eq!(stats.record_count, 0);
    assert_eq!(stats.keyframe_count, 0);
    assert_eq!(stats.total_bytes, 0);
}

#[test]
fn stats_count_records_and_keyframes() {
    let dir = TempDir::new().expect("tempdir");
    let source = write_source(&dir, "flight.mp4");
    let cache = ResultCache::open(dir.path().join("cache")).expect("open cache");

    cache.save(&source, &sample_entry(&source));

    let stats = cache.stats();
    assert_eq!(stats.record_count, 1);
    assert_eq!(stats.keyframe_count, 2);
    assert!(stats.total_bytes > 0);
}

#[test]
fn annotating_leaves_keyframe_files_untouched() {
    let dir = TempDir::new().expect("tempdir");
    let source = write_source(&dir, "flight.mp4");
    let cache_root = dir.path().join("cache");
    let cache = ResultCache::open(&cache_root).expect("open cache");

    cache.save(&source, &sample_entry(&source));
    let before = jpeg_bytes(&cache_root);
    assert_eq!(before.len(), 2);

    let note = serde_json::json!({"label": "sunset"});
    assert!(cache.append_annotations(&source, vec![note.clone()]));
    assert!(cache.append_annotations(&source, vec![note.clone()]));

    // The thumbnails must not go through another lossy encode per cycle.
    assert_eq!(jpeg_bytes(&cache_root), before);

    let loaded = cache.load(&source).expect("cache hit");
    assert_eq!(loaded.annotations.len(), 3);
    assert_eq!(loaded.annotations[1], note);
}

#[test]
fn annotating_an_absent_entry_fails_cleanly() {
    let dir = TempDir::new().expect("tempdir");
    let source = write_source(&dir, "flight.mp4");
    let cache = ResultCache::open(dir.path().join("cache")).expect("open cache");

    assert!(!cache.append_annotations(&source, vec![serde_json::json!("late")]));
    assert!(!cache.has(&source));
}

/// Collect the raw bytes of every JPEG under the cache root, sorted by path.
fn jpeg_bytes(cache_root: &std::path::Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut files = Vec::new();
    let mut pending = vec![cache_root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir).expect("read cache dir").flatten() {
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "jpg") {
                let bytes = fs::read(&path).expect("read keyframe");
                files.push((path, bytes));
            }
        }
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    files
}

#[test]
fn resaving_replaces_rather_than_accumulates() {
    let dir = TempDir::new().expect("tempdir");
    let source = write_source(&dir, "flight.mp4");
    let cache = ResultCache::open(dir.path().join("cache")).expect("open cache");

    cache.save(&source, &sample_entry(&source));

    // Re-export the file, then cache the new analysis.
    thread::sleep(Duration::from_millis(10));
    fs::write(&source, b"new cut of the same video").expect("rewrite source");
    cache.save(&source, &sample_entry(&source));

    let stats = cache.stats();
    assert_eq!(stats.record_count, 1, "old record should be replaced");
    assert_eq!(stats.keyframe_count, 2, "old keyframes should be replaced");
    assert!(cache.load(&source).is_some());
}
