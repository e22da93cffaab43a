//! Shot-attempt detection from ball trajectory.
//!
//! A bounded sliding window of recent ball observations is split in half and
//! the mean vertical coordinates compared: when the older half sits lower on
//! screen (larger y) than the newer half by more than a fixed delta, the ball
//! rose toward the hoop and a shot attempt is recorded. This is a windowed
//! heuristic, not a physics simulator; it needs only the rolling window and
//! is safe to re-enter at any frame.

use std::collections::VecDeque;

use court_vision_common::{Point, VideoMetadata};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::zones::CourtZone;

/// Default number of ball samples in the sliding window.
pub const DEFAULT_SHOT_WINDOW: usize = 10;
/// Default upward-movement delta in pixels.
pub const DEFAULT_RISE_DELTA: f32 = 50.0;
/// Fixed confidence attached to heuristic detections.
const SHOT_CONFIDENCE: f32 = 0.7;

/// One ball observation inside the window
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BallSample {
    pub position: Point,
    pub timestamp: f64,
    pub frame_id: u64,
}

/// Append-only record of a detected shot attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShotAttempt {
    pub timestamp: f64,
    pub frame_id: u64,
    /// Possession holder at launch, when one was known
    pub shooter_id: Option<u32>,
    pub origin_position: Point,
    pub trajectory: Vec<Point>,
    pub zone: CourtZone,
    /// Point value of the origin zone (2 or 3)
    pub value: u8,
    pub confidence: f32,
    /// Outcome is not inferred by this heuristic
    pub made: Option<bool>,
}

pub struct ShotDetector {
    window_size: usize,
    rise_delta: f32,
    frame_width: f32,
    frame_height: f32,
    window: VecDeque<BallSample>,
    attempts: Vec<ShotAttempt>,
}

impl ShotDetector {
    pub fn new(window_size: usize, rise_delta: f32, video: &VideoMetadata) -> Self {
        Self {
            window_size,
            rise_delta,
            frame_width: video.width as f32,
            frame_height: video.height as f32,
            window: VecDeque::with_capacity(window_size + 1),
            attempts: Vec::new(),
        }
    }

    /// Feed one frame's ball observation (absent frames are skipped) and the
    /// current possession holder; returns a newly emitted attempt, if any.
    pub fn observe(
        &mut self,
        ball_position: Option<Point>,
        shooter: Option<u32>,
        frame_id: u64,
        timestamp: f64,
    ) -> Option<ShotAttempt> {
        let position = ball_position?;

        self.window.push_back(BallSample {
            position,
            timestamp,
            frame_id,
        });
        if self.window.len() > self.window_size {
            self.window.pop_front();
        }
        if self.window.len() < self.window_size {
            return None;
        }

        let half = self.window.len() / 2;
        let first_mean: f32 = self
            .window
            .iter()
            .take(half)
            .map(|s| s.position.y)
            .sum::<f32>()
            / half as f32;
        let second_mean: f32 = self
            .window
            .iter()
            .skip(half)
            .map(|s| s.position.y)
            .sum::<f32>()
            / (self.window.len() - half) as f32;

        // y grows downward: a shrinking mean means the ball went up.
        if first_mean - second_mean <= self.rise_delta {
            return None;
        }

        let origin = self.window.front().copied()?;
        let zone = CourtZone::classify(
            origin.position.x / self.frame_width,
            origin.position.y / self.frame_height,
        );
        let attempt = ShotAttempt {
            timestamp: origin.timestamp,
            frame_id: origin.frame_id,
            shooter_id: shooter,
            origin_position: origin.position,
            trajectory: self.window.iter().map(|s| s.position).collect(),
            zone,
            value: zone.value(),
            confidence: SHOT_CONFIDENCE,
            made: None,
        };
        debug!(
            frame_id,
            shooter = ?shooter,
            zone = ?zone,
            rise = first_mean - second_mean,
            "Shot attempt detected"
        );

        // One launch, one event: start a fresh window.
        self.window.clear();
        self.attempts.push(attempt.clone());
        Some(attempt)
    }

    pub fn attempts(&self) -> &[ShotAttempt] {
        &self.attempts
    }

    pub fn into_attempts(self) -> Vec<ShotAttempt> {
        self.attempts
    }
}
