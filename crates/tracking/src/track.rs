//! Track lifecycle and ownership.
//!
//! The `TrackStore` exclusively owns every live track. Identities are
//! monotonically assigned and never reused; a deleted track is gone for good
//! and a later matching detection spawns a fresh identity.

use std::collections::VecDeque;

use court_vision_common::{BoundingBox, Detection, Point};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::kalman::MotionEstimate;

/// Maximum appearance descriptors retained per track (FIFO eviction).
const FEATURE_BUDGET: usize = 100;
/// Position history is trimmed to the newest half once it exceeds this.
const POSITION_BUDGET: usize = 100;

/// Track lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackState {
    Tentative,
    Confirmed,
    Deleted,
}

/// A position observation with its frame timestamp
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedPosition {
    pub x: f32,
    pub y: f32,
    pub timestamp: f64,
}

/// Read-only view of a Confirmed track for downstream consumers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackSnapshot {
    pub id: u32,
    pub bbox: BoundingBox,
    pub center: Point,
    pub confidence: f32,
    pub time_since_update: u32,
    pub hit_streak: u32,
}

/// Per-identity position history exported for statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackHistory {
    pub id: u32,
    pub first_seen: f64,
    pub last_seen: f64,
    pub positions: Vec<TimedPosition>,
}

#[derive(Debug, Clone)]
pub(crate) struct Track {
    pub id: u32,
    pub state: TrackState,
    pub motion: MotionEstimate,
    pub time_since_update: u32,
    pub hit_streak: u32,
    pub hits: u32,
    pub last_confidence: f32,
    was_confirmed: bool,
    features: VecDeque<[f32; 4]>,
    positions: Vec<TimedPosition>,
    first_seen: f64,
    last_seen: f64,
}

impl Track {
    fn new(id: u32, detection: &Detection, timestamp: f64) -> Self {
        let center = detection.center();
        let mut features = VecDeque::with_capacity(8);
        features.push_back(detection.feature());

        Self {
            id,
            state: TrackState::Tentative,
            motion: MotionEstimate::new(&detection.bbox),
            time_since_update: 0,
            hit_streak: 1,
            hits: 1,
            last_confidence: detection.confidence,
            was_confirmed: false,
            features,
            positions: vec![TimedPosition {
                x: center.x,
                y: center.y,
                timestamp,
            }],
            first_seen: timestamp,
            last_seen: timestamp,
        }
    }

    pub fn latest_feature(&self) -> [f32; 4] {
        // Non-empty from construction onward.
        *self.features.back().unwrap_or(&[0.0; 4])
    }

    fn record_match(&mut self, detection: &Detection, timestamp: f64, n_init: u32) {
        self.motion.update(&detection.bbox);

        self.features.push_back(detection.feature());
        if self.features.len() > FEATURE_BUDGET {
            self.features.pop_front();
        }

        let center = self.motion.center();
        self.positions.push(TimedPosition {
            x: center.x,
            y: center.y,
            timestamp,
        });
        if self.positions.len() > POSITION_BUDGET {
            let keep_from = self.positions.len() - POSITION_BUDGET / 2;
            self.positions.drain(..keep_from);
        }

        self.hits += 1;
        self.hit_streak += 1;
        self.time_since_update = 0;
        self.last_confidence = detection.confidence;
        self.last_seen = timestamp;

        if self.state == TrackState::Tentative && self.hit_streak >= n_init {
            self.state = TrackState::Confirmed;
            self.was_confirmed = true;
            debug!(track_id = self.id, hits = self.hits, "Track confirmed");
        }
    }

    fn snapshot(&self) -> TrackSnapshot {
        TrackSnapshot {
            id: self.id,
            bbox: self.motion.bbox(),
            center: self.motion.center(),
            confidence: self.last_confidence,
            time_since_update: self.time_since_update,
            hit_streak: self.hit_streak,
        }
    }

    fn history(&self) -> TrackHistory {
        TrackHistory {
            id: self.id,
            first_seen: self.first_seen,
            last_seen: self.last_seen,
            positions: self.positions.clone(),
        }
    }
}

/// Owner of all live tracks for one session
#[derive(Debug)]
pub struct TrackStore {
    tracks: Vec<Track>,
    next_id: u32,
    n_init: u32,
    max_age: u32,
    max_tracks: usize,
    evicted: u64,
    retired: Vec<TrackHistory>,
}

impl TrackStore {
    pub fn new(n_init: u32, max_age: u32, max_tracks: usize) -> Self {
        Self {
            tracks: Vec::with_capacity(max_tracks.min(32)),
            next_id: 1,
            n_init,
            max_age,
            max_tracks,
            evicted: 0,
            retired: Vec::new(),
        }
    }

    /// Advance every live track by one frame interval.
    pub fn predict_all(&mut self) {
        for track in &mut self.tracks {
            track.motion.predict();
        }
    }

    /// Create a Tentative track for an unmatched detection.
    ///
    /// When the live-track cap is reached the oldest Tentative track is
    /// evicted to make room; if everything live is Confirmed the detection is
    /// dropped instead.
    pub fn spawn(&mut self, detection: &Detection, timestamp: f64) -> Option<u32> {
        if self.tracks.len() >= self.max_tracks {
            let victim = self
                .tracks
                .iter()
                .position(|t| t.state == TrackState::Tentative);
            match victim {
                Some(idx) => {
                    let removed = self.tracks.remove(idx);
                    self.evicted += 1;
                    warn!(
                        track_id = removed.id,
                        live = self.tracks.len(),
                        "Track cap reached, evicting oldest tentative track"
                    );
                }
                None => {
                    warn!(
                        live = self.tracks.len(),
                        "Track cap reached with no tentative track to evict, dropping spawn"
                    );
                    return None;
                }
            }
        }

        let id = self.next_id;
        self.next_id += 1;
        self.tracks.push(Track::new(id, detection, timestamp));
        Some(id)
    }

    /// Apply a successful association to the track at `index`.
    pub fn apply_match(&mut self, index: usize, detection: &Detection, timestamp: f64) {
        let n_init = self.n_init;
        if let Some(track) = self.tracks.get_mut(index) {
            track.record_match(detection, timestamp, n_init);
        }
    }

    /// Age the track at `index` after an unmatched frame.
    pub fn age(&mut self, index: usize) {
        let max_age = self.max_age;
        if let Some(track) = self.tracks.get_mut(index) {
            track.time_since_update += 1;
            track.hit_streak = 0;
            if track.time_since_update > max_age {
                track.state = TrackState::Deleted;
            }
        }
    }

    /// Remove Deleted tracks. Confirmed identities are archived so their
    /// history survives for statistics; Tentative ones vanish silently.
    pub fn prune(&mut self) {
        let retired = &mut self.retired;
        self.tracks.retain(|track| {
            if track.state == TrackState::Deleted {
                if track.was_confirmed {
                    retired.push(track.history());
                }
                debug!(track_id = track.id, "Track removed");
                false
            } else {
                true
            }
        });
    }

    /// Read-only snapshots of Confirmed tracks, in id order.
    pub fn snapshot(&self) -> Vec<TrackSnapshot> {
        self.tracks
            .iter()
            .filter(|t| t.state == TrackState::Confirmed)
            .map(Track::snapshot)
            .collect()
    }

    /// Position histories of every Confirmed identity seen so far, retired
    /// identities first, then live ones, all in id order.
    pub fn histories(&self) -> Vec<TrackHistory> {
        let mut histories = self.retired.clone();
        histories.extend(
            self.tracks
                .iter()
                .filter(|t| t.state == TrackState::Confirmed)
                .map(Track::history),
        );
        histories.sort_by_key(|h| h.id);
        histories
    }

    pub fn live_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn evicted_count(&self) -> u64 {
        self.evicted
    }

    pub(crate) fn tracks(&self) -> &[Track] {
        &self.tracks
    }
}
