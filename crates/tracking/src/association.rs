//! Per-frame matching of predicted tracks to new detections.
//!
//! Costs blend a positional/size term (1 - IoU between the predicted box and
//! the detection box) with an appearance term (cosine distance between the
//! track's newest feature and the detection feature). The square-padded
//! matrix is solved optimally with Jonker-Volgenant; pairs whose true cost
//! exceeds the gate are rejected post-hoc and treated as unmatched on both
//! sides. Tracks are iterated in id order and equal-cost pairings are biased
//! toward the lower track id, then the lower detection index, so identical
//! input always yields identical assignments regardless of how the solver
//! breaks ties internally.

use court_vision_common::Detection;
use lapjv::{lapjv, Matrix};
use tracing::trace;

use crate::track::Track;
use crate::{TrackerConfig, TrackingError};

/// Cost of virtual rows/columns. Every perfect matching on the padded matrix
/// uses the same number of padding cells, so any constant works here.
const PAD_COST: f32 = 0.0;

/// Bias that orders equal-cost pairings: lower track index wins, then lower
/// detection index. Large enough to survive f32 rounding next to unit-scale
/// costs, far smaller than any meaningful cost difference or the gate.
const TIE_BREAK: f32 = 1e-5;

#[derive(Debug, Default)]
pub(crate) struct Association {
    /// (track index, detection index) pairs that passed the gate
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

fn cosine_distance(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;

    if denom <= f32::EPSILON {
        return 1.0;
    }
    1.0 - dot / denom
}

fn pair_cost(track: &Track, detection: &Detection, config: &TrackerConfig) -> f32 {
    let predicted = track.motion.bbox();
    let position = 1.0 - predicted.iou(&detection.bbox);
    let appearance = cosine_distance(&track.latest_feature(), &detection.feature());

    config.position_weight * position + config.appearance_weight * appearance
}

/// Solve the assignment between all live tracks and player detections.
pub(crate) fn associate(
    tracks: &[Track],
    detections: &[Detection],
    config: &TrackerConfig,
) -> Result<Association, TrackingError> {
    if tracks.is_empty() {
        return Ok(Association {
            matches: Vec::new(),
            unmatched_tracks: Vec::new(),
            unmatched_detections: (0..detections.len()).collect(),
        });
    }
    if detections.is_empty() {
        return Ok(Association {
            matches: Vec::new(),
            unmatched_tracks: (0..tracks.len()).collect(),
            unmatched_detections: Vec::new(),
        });
    }

    // The solver wants a square matrix; virtual rows/columns are free.
    let dims = tracks.len().max(detections.len());
    let costs = Matrix::from_shape_fn((dims, dims), |(i, j)| {
        if i < tracks.len() && j < detections.len() {
            pair_cost(&tracks[i], &detections[j], config) + TIE_BREAK * j as f32 / (i + 1) as f32
        } else {
            PAD_COST
        }
    });

    let (row_assignment, _) =
        lapjv(&costs).map_err(|e| TrackingError::AssignmentFailed(e.to_string()))?;

    let mut association = Association::default();
    let mut detection_matched = vec![false; detections.len()];

    for (track_idx, &det_idx) in row_assignment.iter().enumerate().take(tracks.len()) {
        if det_idx < detections.len() && costs[(track_idx, det_idx)] <= config.gate_threshold {
            trace!(
                track_id = tracks[track_idx].id,
                detection = det_idx,
                cost = costs[(track_idx, det_idx)],
                "Association accepted"
            );
            association.matches.push((track_idx, det_idx));
            detection_matched[det_idx] = true;
        } else {
            association.unmatched_tracks.push(track_idx);
        }
    }

    for (det_idx, matched) in detection_matched.iter().enumerate() {
        if !matched {
            association.unmatched_detections.push(det_idx);
        }
    }

    Ok(association)
}
