//! Ball-possession resolution.
//!
//! The holder is the Confirmed track nearest the ball within a fixed radius
//! (a fraction of the frame diagonal), ties broken by lower track id. Change
//! records are append-only and carry the previous holder's tenure measured
//! from acquisition, so possession can toggle through null (ball occluded,
//! nobody close enough) without corrupting the duration accounting.

use court_vision_common::Point;
use court_vision_tracking::TrackSnapshot;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default possession radius as a fraction of the frame diagonal.
pub const DEFAULT_POSSESSION_RADIUS_FRAC: f32 = 0.016;

/// Append-only record of a possession change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PossessionRecord {
    pub timestamp: f64,
    pub frame_id: u64,
    /// The player acquiring possession
    pub player_id: Option<u32>,
    /// The player who held possession before this change
    pub previous_player_id: Option<u32>,
    pub ball_position: Point,
    /// How long the previous holder retained possession
    pub duration: f64,
}

/// Summary statistics over the possession log
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PossessionSummary {
    pub total_possessions: usize,
    pub average_duration: f64,
    pub longest_duration: f64,
    pub shortest_duration: f64,
}

pub struct PossessionResolver {
    radius: f32,
    holder: Option<u32>,
    holder_since: f64,
    records: Vec<PossessionRecord>,
}

impl PossessionResolver {
    /// `radius_frac` scales the frame diagonal into a pixel radius.
    pub fn new(radius_frac: f32, frame_diagonal: f32) -> Self {
        Self {
            radius: radius_frac * frame_diagonal,
            holder: None,
            holder_since: 0.0,
            records: Vec::new(),
        }
    }

    /// Resolve this frame's holder and append a change record if the holder
    /// moved from one player to a different one.
    ///
    /// Returns the holder resolved for this frame (None when the ball is
    /// absent or nobody is within the radius). Null frames neither emit
    /// records nor end the incumbent's tenure.
    pub fn resolve(
        &mut self,
        ball_position: Option<Point>,
        players: &[TrackSnapshot],
        frame_id: u64,
        timestamp: f64,
    ) -> Option<u32> {
        let ball = ball_position?;
        let resolved = self.nearest_within_radius(&ball, players)?;

        match self.holder {
            Some(previous) if previous != resolved => {
                let record = PossessionRecord {
                    timestamp,
                    frame_id,
                    player_id: Some(resolved),
                    previous_player_id: Some(previous),
                    ball_position: ball,
                    duration: timestamp - self.holder_since,
                };
                debug!(
                    from = previous,
                    to = resolved,
                    duration = record.duration,
                    "Possession change"
                );
                self.records.push(record);
                self.holder = Some(resolved);
                self.holder_since = timestamp;
            }
            Some(_) => {}
            None => {
                // First acquisition starts a tenure without a change record.
                self.holder = Some(resolved);
                self.holder_since = timestamp;
            }
        }

        Some(resolved)
    }

    fn nearest_within_radius(&self, ball: &Point, players: &[TrackSnapshot]) -> Option<u32> {
        let mut best: Option<(u32, f32)> = None;
        // Snapshots arrive in id order, so strict < keeps the lower id on ties.
        for player in players {
            let distance = player.center.distance_to(ball);
            if distance > self.radius {
                continue;
            }
            match best {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => best = Some((player.id, distance)),
            }
        }
        best.map(|(id, _)| id)
    }

    /// Current (or most recent) holder, for shooter attribution.
    pub fn holder(&self) -> Option<u32> {
        self.holder
    }

    pub fn records(&self) -> &[PossessionRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<PossessionRecord> {
        self.records
    }
}

/// Pure projection of the possession log into summary numbers.
pub fn possession_summary(records: &[PossessionRecord]) -> PossessionSummary {
    let durations: Vec<f64> = records
        .iter()
        .filter(|r| r.duration > 0.0)
        .map(|r| r.duration)
        .collect();

    if durations.is_empty() {
        return PossessionSummary {
            total_possessions: records.len(),
            ..Default::default()
        };
    }

    PossessionSummary {
        total_possessions: records.len(),
        average_duration: durations.iter().sum::<f64>() / durations.len() as f64,
        longest_duration: durations.iter().cloned().fold(f64::MIN, f64::max),
        shortest_duration: durations.iter().cloned().fold(f64::MAX, f64::min),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use court_vision_common::BoundingBox;

    const DIAGONAL: f32 = 2203.0; // 1920x1080

    fn snapshot(id: u32, x: f32, y: f32) -> TrackSnapshot {
        TrackSnapshot {
            id,
            bbox: BoundingBox::from_center(x, y, 40.0, 80.0),
            center: Point::new(x, y),
            confidence: 0.9,
            time_since_update: 0,
            hit_streak: 5,
        }
    }

    fn resolver() -> PossessionResolver {
        PossessionResolver::new(DEFAULT_POSSESSION_RADIUS_FRAC, DIAGONAL)
    }

    #[test]
    fn test_no_players_means_no_possession() {
        let mut resolver = resolver();
        let result = resolver.resolve(Some(Point::new(100.0, 100.0)), &[], 0, 0.0);
        assert!(result.is_none());
        assert!(resolver.records().is_empty());
    }

    #[test]
    fn test_outside_radius_means_no_possession() {
        let mut resolver = resolver();
        let players = vec![snapshot(1, 500.0, 500.0)];
        let result = resolver.resolve(Some(Point::new(100.0, 100.0)), &players, 0, 0.0);
        assert!(result.is_none());
    }

    #[test]
    fn test_tie_broken_by_lower_id() {
        let mut resolver = resolver();
        let players = vec![snapshot(3, 90.0, 100.0), snapshot(7, 110.0, 100.0)];
        let result = resolver.resolve(Some(Point::new(100.0, 100.0)), &players, 0, 0.0);
        assert_eq!(result, Some(3));
    }

    #[test]
    fn test_first_acquisition_emits_no_record() {
        let mut resolver = resolver();
        let players = vec![snapshot(1, 100.0, 100.0)];
        resolver.resolve(Some(Point::new(105.0, 100.0)), &players, 0, 0.0);
        assert_eq!(resolver.holder(), Some(1));
        assert!(resolver.records().is_empty());
    }

    #[test]
    fn test_change_scenario_single_record_with_duration() {
        // 2 players, ball near player 1 for frames 0-2, then near player 2.
        let mut resolver = resolver();
        let players = vec![snapshot(1, 100.0, 100.0), snapshot(2, 500.0, 100.0)];
        let timestamps = [0.0, 0.5, 1.0, 1.5, 2.0];

        for (frame, &ts) in timestamps.iter().enumerate() {
            let ball = if frame < 3 {
                Point::new(110.0, 100.0)
            } else {
                Point::new(505.0, 100.0)
            };
            resolver.resolve(Some(ball), &players, frame as u64, ts);
        }

        let records = resolver.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].previous_player_id, Some(1));
        assert_eq!(records[0].player_id, Some(2));
        assert!((records[0].duration - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_duration_survives_null_gap() {
        // Holder A at t=0, nobody in between, holder B at t=7.5.
        let mut resolver = resolver();
        let players = vec![snapshot(1, 100.0, 100.0), snapshot(2, 500.0, 100.0)];

        resolver.resolve(Some(Point::new(100.0, 100.0)), &players, 0, 0.0);
        // Ball absent, then far from everyone.
        resolver.resolve(None, &players, 1, 2.5);
        resolver.resolve(Some(Point::new(1500.0, 900.0)), &players, 2, 5.0);
        resolver.resolve(Some(Point::new(500.0, 100.0)), &players, 3, 7.5);

        let records = resolver.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].previous_player_id, Some(1));
        assert!((records[0].duration - 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_summary_guards_empty_log() {
        let summary = possession_summary(&[]);
        assert_eq!(summary.total_possessions, 0);
        assert_eq!(summary.average_duration, 0.0);
    }
}
