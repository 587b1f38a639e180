//! Full pipeline integration tests against a real video fixture.
//!
//! These tests decode an actual file and are skipped when the fixture is not
//! present. Place any short video at `tests/fixtures/sample_video.mp4` to
//! enable them.

use std::path::Path;

use clipsift::{ClipPipeline, PipelineConfig, VideoSource, analyze_motion, detect_scene_changes};
use tempfile::TempDir;

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

#[test]
fn open_reports_consistent_metadata() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let source = VideoSource::open(path).expect("open");
    let info = source.info();

    assert!(info.width > 0);
    assert!(info.height > 0);
    assert!(info.frames_per_second > 0.0);
    assert!(info.duration > 0.0);
    assert!(info.frame_count > 0);
    assert!(info.byte_size > 0);
}

#[test]
fn motion_signal_covers_the_video() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut source = VideoSource::open(path).expect("open");
    let config = PipelineConfig::default();
    let motion = analyze_motion(&mut source, &config).expect("motion analysis");

    let duration = source.info().duration;
    for point in motion.points() {
        assert!(point.timestamp >= 0.0);
        assert!(point.timestamp <= duration + 1.0, "timestamp past the end");
        assert!(point.value >= 0.0, "motion is non-negative");
    }
}

#[test]
fn scene_changes_are_ascending_timestamps() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut source = VideoSource::open(path).expect("open");
    let config = PipelineConfig::default();
    let changes = detect_scene_changes(&mut source, &config).expect("scene detection");

    let duration = source.info().duration;
    for pair in changes.windows(2) {
        assert!(pair[0] < pair[1], "scene changes must ascend");
    }
    for &timestamp in &changes {
        assert!(timestamp >= 0.0);
        assert!(timestamp <= duration + 1.0);
    }
}

#[test]
fn pipeline_produces_a_complete_analysis() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let config = PipelineConfig::default();
    let pipeline = ClipPipeline::new(config.clone());
    let analysis = pipeline.process(path).expect("process");

    assert!(!analysis.from_cache);
    assert_eq!(analysis.source_path, Path::new(path));
    assert!(analysis.clips.len() <= config.max_clips);
    assert!(!analysis.keyframes.is_empty());
    assert!(analysis.keyframes.len() <= config.keyframes_per_video);
    for keyframe in &analysis.keyframes {
        assert_eq!(
            keyframe.dimensions(),
            (config.analysis_width, config.analysis_height)
        );
    }
    assert!(analysis.annotations.is_empty(), "fresh analyses carry none");
}

#[test]
fn second_run_is_served_from_cache() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let cache_dir = TempDir::new().expect("tempdir");
    let pipeline =
        ClipPipeline::with_cache(PipelineConfig::default(), cache_dir.path()).expect("pipeline");

    let first = pipeline.process(path).expect("first run");
    assert!(!first.from_cache);

    let second = pipeline.process(path).expect("second run");
    assert!(second.from_cache);
    assert_eq!(second.clips, first.clips);
    assert_eq!(second.scene_changes, first.scene_changes);
    assert_eq!(second.keyframes.len(), first.keyframes.len());

    // Annotations attached by a downstream consumer survive the next load.
    let note = serde_json::json!({"summary": "test annotation"});
    assert!(pipeline.annotate(path, vec![note.clone()]));
    let third = pipeline.process(path).expect("third run");
    assert!(third.from_cache);
    assert_eq!(third.annotations, vec![note]);
}

#[test]
fn frame_extraction_round_trips_through_timestamps() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut source = VideoSource::open(path).expect("open");
    let midpoint = source.info().duration / 2.0;

    let frame = source.frame_at(midpoint).expect("frame at midpoint");
    assert_eq!(frame.width(), source.info().width);
    assert_eq!(frame.height(), source.info().height);
}

#[test]
fn batch_processing_skips_broken_files() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let pipeline = ClipPipeline::new(PipelineConfig::default());
    let results = pipeline.process_all(&[path, "tests/fixtures/does_not_exist.mp4"]);

    // The broken path is logged and dropped; the good one survives.
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].source_path, Path::new(path));
}
