//! Game-event inference on top of the tracking layer.
//!
//! Consumes per-frame [`FrameTracks`] output and maintains append-only
//! possession and shot logs plus a pure statistics projection over them.
//! Nothing in this crate touches the tracker's internals; everything is
//! derived from the snapshots the tracker publishes.

pub mod possession;
pub mod shots;
pub mod stats;
pub mod zones;

use court_vision_common::VideoMetadata;
use court_vision_tracking::{FrameTracks, TrackHistory};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use possession::{
    possession_summary, PossessionRecord, PossessionResolver, PossessionSummary,
    DEFAULT_POSSESSION_RADIUS_FRAC,
};
pub use shots::{BallSample, ShotAttempt, ShotDetector, DEFAULT_RISE_DELTA, DEFAULT_SHOT_WINDOW};
pub use stats::{
    compute_statistics, shot_chart, PlayerStatistics, ShotChart, ShotMark, ZoneShooting,
    PIXELS_TO_METERS,
};
pub use zones::CourtZone;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Invalid analytics configuration: {0}")]
    InvalidConfig(String),
}

/// Tunables for the event-inference layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Possession radius as a fraction of the frame diagonal.
    pub possession_radius_frac: f32,
    /// Ball samples held for launch detection.
    pub shot_window: usize,
    /// Minimum upward pixel displacement across the window.
    pub shot_rise_delta: f32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            possession_radius_frac: DEFAULT_POSSESSION_RADIUS_FRAC,
            shot_window: DEFAULT_SHOT_WINDOW,
            shot_rise_delta: DEFAULT_RISE_DELTA,
        }
    }
}

impl AnalyticsConfig {
    pub fn validate(&self) -> Result<(), AnalyticsError> {
        if self.possession_radius_frac <= 0.0 {
            return Err(AnalyticsError::InvalidConfig(
                "possession_radius_frac must be positive".into(),
            ));
        }
        if self.shot_window < 2 {
            return Err(AnalyticsError::InvalidConfig(
                "shot_window must be at least 2".into(),
            ));
        }
        if self.shot_rise_delta <= 0.0 {
            return Err(AnalyticsError::InvalidConfig(
                "shot_rise_delta must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Event emitted while observing a frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    PossessionChange(PossessionRecord),
    ShotAttempt(ShotAttempt),
}

/// Per-session analytics state fed one frame at a time.
pub struct GameAnalytics {
    resolver: PossessionResolver,
    shots: ShotDetector,
    frames_observed: u64,
    ball_frames: u64,
}

impl GameAnalytics {
    pub fn new(config: AnalyticsConfig, video: &VideoMetadata) -> Result<Self, AnalyticsError> {
        config.validate()?;
        Ok(Self {
            resolver: PossessionResolver::new(
                config.possession_radius_frac,
                video.diagonal(),
            ),
            shots: ShotDetector::new(config.shot_window, config.shot_rise_delta, video),
            frames_observed: 0,
            ball_frames: 0,
        })
    }

    /// Fold one frame of tracking output into the logs.
    ///
    /// May yield at most one possession change and one shot attempt per frame.
    pub fn observe_frame(&mut self, frame: &FrameTracks) -> Vec<GameEvent> {
        self.frames_observed += 1;
        let ball = frame.ball.as_ref().map(|d| d.bbox.center());
        if ball.is_some() {
            self.ball_frames += 1;
        }

        let mut events = Vec::new();

        let records_before = self.resolver.records().len();
        self.resolver
            .resolve(ball, &frame.players, frame.frame_id, frame.timestamp);
        if self.resolver.records().len() > records_before {
            let record = self.resolver.records().last().cloned();
            if let Some(record) = record {
                events.push(GameEvent::PossessionChange(record));
            }
        }

        // Shooter attribution uses the holder at (or just before) launch.
        let shooter = self.resolver.holder();
        if let Some(attempt) = self
            .shots
            .observe(ball, shooter, frame.frame_id, frame.timestamp)
        {
            events.push(GameEvent::ShotAttempt(attempt));
        }

        events
    }

    pub fn possession_log(&self) -> &[PossessionRecord] {
        self.resolver.records()
    }

    pub fn shot_log(&self) -> &[ShotAttempt] {
        self.shots.attempts()
    }

    pub fn possession_summary(&self) -> PossessionSummary {
        possession_summary(self.resolver.records())
    }

    pub fn shot_chart(&self) -> ShotChart {
        shot_chart(self.shots.attempts())
    }

    /// Fraction of observed frames with a ball detection present.
    pub fn ball_detection_rate(&self) -> f64 {
        if self.frames_observed == 0 {
            0.0
        } else {
            self.ball_frames as f64 / self.frames_observed as f64
        }
    }

    pub fn frames_observed(&self) -> u64 {
        self.frames_observed
    }

    /// Project the logs (plus the supplied track histories) into statistics.
    pub fn statistics(
        &self,
        histories: &[TrackHistory],
        video: &VideoMetadata,
    ) -> Vec<PlayerStatistics> {
        compute_statistics(
            histories,
            self.resolver.records(),
            self.shots.attempts(),
            video,
        )
    }
}
