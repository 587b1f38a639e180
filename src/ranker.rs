//! Overlap resolution and final ranking.
//!
//! The candidate pool is intentionally redundant: motion strategies at two
//! thresholds plus scene windows routinely propose near-identical ranges.
//! This module collapses the pool into a non-overlapping set, keeping the
//! best-scoring clip for each contested region, then orders the survivors by
//! quality and applies the configured cap.

use crate::{clip::Clip, config::PipelineConfig};

/// Collapse a candidate pool into a set of mutually non-overlapping clips.
///
/// Candidates are walked in ascending `start_time`; each one either claims
/// fresh territory or challenges the accepted clip it overlaps. A challenger
/// wins only with strictly higher quality, so on an exact tie the
/// earlier-starting clip stays — making the outcome deterministic and the
/// operation idempotent.
pub fn resolve_overlaps(mut candidates: Vec<Clip>) -> Vec<Clip> {
    candidates.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

    let mut accepted: Vec<Clip> = Vec::new();

    'next: for candidate in candidates {
        for existing in accepted.iter_mut() {
            if candidate.overlaps(existing) {
                if candidate.quality_score > existing.quality_score {
                    *existing = candidate;
                }
                continue 'next;
            }
        }
        accepted.push(candidate);
    }

    accepted
}

/// Order clips by descending quality and truncate to `config.max_clips`.
///
/// Ties fall back to ascending start time so the ordering is total.
pub fn rank(mut clips: Vec<Clip>, config: &PipelineConfig) -> Vec<Clip> {
    clips.sort_by(|a, b| {
        b.quality_score
            .total_cmp(&a.quality_score)
            .then(a.start_time.total_cmp(&b.start_time))
    });
    clips.truncate(config.max_clips);
    clips
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::ClipStrategy;
    use std::path::PathBuf;

    fn clip(start: f64, end: f64, quality: f64) -> Clip {
        Clip {
            source_path: PathBuf::from("test.mp4"),
            start_time: start,
            end_time: end,
            duration: end - start,
            motion_score: 10.0,
            brightness_score: 1.0,
            quality_score: quality,
            strategy: ClipStrategy::HighMotion,
            description: String::new(),
        }
    }

    #[test]
    fn disjoint_clips_all_survive() {
        let resolved = resolve_overlaps(vec![
            clip(0.0, 2.0, 0.5),
            clip(3.0, 5.0, 0.6),
            clip(6.0, 8.0, 0.4),
        ]);
        assert_eq!(resolved.len(), 3);
    }

    #[test]
    fn higher_quality_challenger_replaces_incumbent() {
        let resolved = resolve_overlaps(vec![clip(0.0, 5.0, 0.4), clip(3.0, 8.0, 0.9)]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].quality_score, 0.9);
        assert_eq!(resolved[0].start_time, 3.0);
    }

    #[test]
    fn lower_quality_challenger_is_dropped() {
        let resolved = resolve_overlaps(vec![clip(0.0, 5.0, 0.9), clip(3.0, 8.0, 0.4)]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].start_time, 0.0);
    }

    #[test]
    fn exact_tie_keeps_earlier_start() {
        let resolved = resolve_overlaps(vec![clip(3.0, 8.0, 0.5), clip(0.0, 5.0, 0.5)]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].start_time, 0.0);
    }

    #[test]
    fn resolution_output_has_no_overlaps() {
        let resolved = resolve_overlaps(vec![
            clip(0.0, 6.0, 0.3),
            clip(2.0, 4.0, 0.8),
            clip(5.0, 9.0, 0.5),
            clip(8.0, 12.0, 0.7),
            clip(20.0, 22.0, 0.1),
        ]);
        for (i, a) in resolved.iter().enumerate() {
            for b in resolved.iter().skip(i + 1) {
                assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn resolution_is_idempotent() {
        let once = resolve_overlaps(vec![
            clip(0.0, 6.0, 0.3),
            clip(2.0, 4.0, 0.8),
            clip(5.0, 9.0, 0.5),
        ]);
        let twice = resolve_overlaps(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn ranking_orders_by_quality_descending() {
        let config = PipelineConfig::default();
        let ranked = rank(
            vec![clip(0.0, 2.0, 0.2), clip(3.0, 5.0, 0.9), clip(6.0, 8.0, 0.5)],
            &config,
        );
        let qualities: Vec<f64> = ranked.iter().map(|c| c.quality_score).collect();
        assert_eq!(qualities, vec![0.9, 0.5, 0.2]);
    }

    #[test]
    fn ranking_truncates_to_configured_cap() {
        let config = PipelineConfig::default().with_max_clips(2);
        let ranked = rank(
            vec![clip(0.0, 2.0, 0.2), clip(3.0, 5.0, 0.9), clip(6.0, 8.0, 0.5)],
            &config,
        );
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].quality_score, 0.9);
        assert_eq!(ranked[1].quality_score, 0.5);
    }

    #[test]
    fn quality_ties_break_on_start_time() {
        let config = PipelineConfig::default();
        let ranked = rank(vec![clip(5.0, 7.0, 0.5), clip(1.0, 3.0, 0.5)], &config);
        assert_eq!(ranked[0].start_time, 1.0);
    }
}
