//! Multi-object tracking for basketball footage.
//!
//! Assigns stable identities to player detections across frames using
//! constant-velocity motion prediction and optimal assignment over a blended
//! position/appearance cost. The ball is deliberately not tracked through the
//! assignment engine; at most one ball detection per frame is forwarded
//! directly to the analytics layer.
//!
//! # Example
//! ```no_run
//! use court_vision_tracking::{PlayerTracker, TrackerConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut tracker = PlayerTracker::new(TrackerConfig::default());
//!
//! // For each frame, pass validated detections
//! // let frame = tracker.step(&detections, frame_id, timestamp)?;
//! # Ok(())
//! # }
//! ```

mod association;
mod kalman;
mod track;

pub use track::{TimedPosition, TrackHistory, TrackSnapshot, TrackState, TrackStore};

use court_vision_common::{Detection, DetectionClass};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Tracking errors
#[derive(Debug, thiserror::Error)]
pub enum TrackingError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Assignment solver failed: {0}")]
    AssignmentFailed(String),
}

/// Tracker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Consecutive matches required before a track is confirmed (default: 3)
    pub n_init: u32,
    /// Maximum frames a track survives without a match (default: 30)
    pub max_age: u32,
    /// Association cost above which a matched pair is rejected (default: 0.5)
    pub gate_threshold: f32,
    /// Weight of the positional/size term in the association cost
    pub position_weight: f32,
    /// Weight of the appearance term in the association cost
    pub appearance_weight: f32,
    /// Hard cap on live tracks; oldest tentative is evicted beyond this
    pub max_tracks: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            n_init: 3,
            max_age: 30,
            gate_threshold: 0.5,
            position_weight: 0.6,
            appearance_weight: 0.4,
            max_tracks: 64,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), TrackingError> {
        if self.n_init == 0 {
            return Err(TrackingError::InvalidConfig(
                "n_init must be at least 1".to_string(),
            ));
        }
        if self.max_tracks == 0 {
            return Err(TrackingError::InvalidConfig(
                "max_tracks must be at least 1".to_string(),
            ));
        }
        if self.position_weight < 0.0 || self.appearance_weight < 0.0 {
            return Err(TrackingError::InvalidConfig(
                "cost weights must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Per-frame tracking output: Confirmed player snapshots plus the ball
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameTracks {
    pub frame_id: u64,
    pub timestamp: f64,
    pub players: Vec<TrackSnapshot>,
    pub ball: Option<Detection>,
}

/// Per-session tracker state; the single public entry point is [`step`].
///
/// [`step`]: PlayerTracker::step
pub struct PlayerTracker {
    config: TrackerConfig,
    store: TrackStore,
    frame_count: u64,
}

impl PlayerTracker {
    pub fn new(config: TrackerConfig) -> Self {
        let store = TrackStore::new(config.n_init, config.max_age, config.max_tracks);
        Self {
            config,
            store,
            frame_count: 0,
        }
    }

    /// Process one frame of detections.
    ///
    /// Strict sequence: predict all tracks, associate player detections,
    /// apply matches/ages/spawns, prune deleted tracks, then forward the
    /// single best ball detection. Ball absence never affects player tracks.
    pub fn step(
        &mut self,
        detections: &[Detection],
        frame_id: u64,
        timestamp: f64,
    ) -> Result<FrameTracks, TrackingError> {
        self.frame_count += 1;

        self.store.predict_all();

        let players: Vec<Detection> = detections
            .iter()
            .filter(|d| d.class == DetectionClass::Player)
            .cloned()
            .collect();
        let ball = best_ball(detections);

        let association = association::associate(self.store.tracks(), &players, &self.config)?;

        for &(track_idx, det_idx) in &association.matches {
            self.store
                .apply_match(track_idx, &players[det_idx], timestamp);
        }
        for &track_idx in &association.unmatched_tracks {
            self.store.age(track_idx);
        }
        for &det_idx in &association.unmatched_detections {
            self.store.spawn(&players[det_idx], timestamp);
        }
        self.store.prune();

        debug!(
            frame_id,
            live = self.store.live_count(),
            matched = association.matches.len(),
            spawned = association.unmatched_detections.len(),
            "Tracker step"
        );

        Ok(FrameTracks {
            frame_id,
            timestamp,
            players: self.store.snapshot(),
            ball,
        })
    }

    /// Position histories of every Confirmed identity, for statistics.
    pub fn histories(&self) -> Vec<TrackHistory> {
        self.store.histories()
    }

    /// Terminal read-only view of Confirmed tracks.
    pub fn snapshot(&self) -> Vec<TrackSnapshot> {
        self.store.snapshot()
    }

    pub fn live_count(&self) -> usize {
        self.store.live_count()
    }

    /// Tracks dropped by the live-track cap, surfaced as a metric.
    pub fn evicted_count(&self) -> u64 {
        self.store.evicted_count()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// At most one ball per frame: keep the highest-confidence candidate.
fn best_ball(detections: &[Detection]) -> Option<Detection> {
    detections
        .iter()
        .filter(|d| d.class == DetectionClass::Ball)
        .max_by(|a, b| {
            a.confidence
                .partial_cmp(&b.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .cloned()
}
