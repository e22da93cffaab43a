//! Per-player statistics as a pure projection.
//!
//! Everything here is recomputable at any time from the track histories and
//! the append-only possession/shot logs; there is no hidden accumulator that
//! can drift from the logs.

use std::collections::BTreeMap;

use court_vision_common::VideoMetadata;
use court_vision_tracking::TrackHistory;
use serde::{Deserialize, Serialize};

use crate::possession::PossessionRecord;
use crate::shots::ShotAttempt;
use crate::zones::CourtZone;

/// Fixed court-scale conversion; no calibration mechanism exists upstream.
pub const PIXELS_TO_METERS: f32 = 0.02;
const MPS_TO_KMH: f64 = 3.6;

/// Derived per-player statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerStatistics {
    pub player_id: u32,
    pub shots_attempted: usize,
    pub shots_made: usize,
    pub field_goal_percentage: f64,
    pub three_point_attempts: usize,
    pub three_point_made: usize,
    pub three_point_percentage: f64,
    pub possessions: usize,
    pub total_possession_time: f64,
    pub avg_possession_time: f64,
    pub distance_covered_m: f64,
    pub avg_speed_kmh: f64,
    pub max_speed_kmh: f64,
    pub time_played_seconds: f64,
    /// Ordered map so serialized output stays reproducible
    pub zone_time_seconds: BTreeMap<CourtZone, f64>,
    /// Per-zone shooting line for this player
    pub shot_zones: BTreeMap<CourtZone, ZoneShooting>,
}

impl PlayerStatistics {
    fn new(player_id: u32) -> Self {
        Self {
            player_id,
            shots_attempted: 0,
            shots_made: 0,
            field_goal_percentage: 0.0,
            three_point_attempts: 0,
            three_point_made: 0,
            three_point_percentage: 0.0,
            possessions: 0,
            total_possession_time: 0.0,
            avg_possession_time: 0.0,
            distance_covered_m: 0.0,
            avg_speed_kmh: 0.0,
            max_speed_kmh: 0.0,
            time_played_seconds: 0.0,
            zone_time_seconds: BTreeMap::new(),
            shot_zones: BTreeMap::new(),
        }
    }
}

/// Attempts and makes for one zone
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ZoneShooting {
    pub attempts: usize,
    pub made: usize,
}

/// One plotted launch point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShotMark {
    pub x: f32,
    pub y: f32,
    pub zone: CourtZone,
    pub value: u8,
    pub shooter_id: Option<u32>,
    pub made: Option<bool>,
}

/// Court-wide shot chart: per-zone totals plus every launch point.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShotChart {
    pub zones: BTreeMap<CourtZone, ZoneShooting>,
    pub marks: Vec<ShotMark>,
}

/// Project the shot log into a chart; like the statistics, recomputable at
/// any time.
pub fn shot_chart(shot_log: &[ShotAttempt]) -> ShotChart {
    let mut chart = ShotChart::default();
    for shot in shot_log {
        let line = chart.zones.entry(shot.zone).or_default();
        line.attempts += 1;
        if shot.made == Some(true) {
            line.made += 1;
        }
        chart.marks.push(ShotMark {
            x: shot.origin_position.x,
            y: shot.origin_position.y,
            zone: shot.zone,
            value: shot.value,
            shooter_id: shot.shooter_id,
            made: shot.made,
        });
    }
    chart
}

fn percentage(made: usize, attempted: usize) -> f64 {
    if attempted == 0 {
        // Never divide by zero: no attempts reports exactly 0.
        0.0
    } else {
        made as f64 / attempted as f64 * 100.0
    }
}

/// Project the logs into per-player statistics, sorted by player id.
pub fn compute_statistics(
    histories: &[TrackHistory],
    possession_log: &[PossessionRecord],
    shot_log: &[ShotAttempt],
    video: &VideoMetadata,
) -> Vec<PlayerStatistics> {
    fn entry(players: &mut BTreeMap<u32, PlayerStatistics>, id: u32) {
        players.entry(id).or_insert_with(|| PlayerStatistics::new(id));
    }

    let mut players: BTreeMap<u32, PlayerStatistics> = BTreeMap::new();
    for history in histories {
        entry(&mut players, history.id);
    }
    for record in possession_log {
        if let Some(id) = record.player_id {
            entry(&mut players, id);
        }
        if let Some(id) = record.previous_player_id {
            entry(&mut players, id);
        }
    }
    for shot in shot_log {
        if let Some(id) = shot.shooter_id {
            entry(&mut players, id);
        }
    }

    for history in histories {
        if let Some(stats) = players.get_mut(&history.id) {
            apply_movement(stats, history, video);
        }
    }

    // A change record closes the previous holder's tenure.
    for record in possession_log {
        if let Some(prev) = record.previous_player_id {
            if let Some(stats) = players.get_mut(&prev) {
                stats.possessions += 1;
                stats.total_possession_time += record.duration;
            }
        }
    }

    for shot in shot_log {
        if let Some(shooter) = shot.shooter_id {
            if let Some(stats) = players.get_mut(&shooter) {
                stats.shots_attempted += 1;
                if shot.made == Some(true) {
                    stats.shots_made += 1;
                }
                if shot.zone.is_three_pointer() {
                    stats.three_point_attempts += 1;
                    if shot.made == Some(true) {
                        stats.three_point_made += 1;
                    }
                }
                let line = stats.shot_zones.entry(shot.zone).or_default();
                line.attempts += 1;
                if shot.made == Some(true) {
                    line.made += 1;
                }
            }
        }
    }

    for stats in players.values_mut() {
        stats.field_goal_percentage = percentage(stats.shots_made, stats.shots_attempted);
        stats.three_point_percentage =
            percentage(stats.three_point_made, stats.three_point_attempts);
        if stats.possessions > 0 {
            stats.avg_possession_time = stats.total_possession_time / stats.possessions as f64;
        }
    }

    players.into_values().collect()
}

fn apply_movement(stats: &mut PlayerStatistics, history: &TrackHistory, video: &VideoMetadata) {
    let positions = &history.positions;
    if positions.is_empty() {
        return;
    }

    stats.time_played_seconds = history.last_seen - history.first_seen;

    let width = video.width as f32;
    let height = video.height as f32;
    let mut speeds: Vec<f64> = Vec::with_capacity(positions.len().saturating_sub(1));

    for pair in positions.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        let dx = (b.x - a.x) as f64;
        let dy = (b.y - a.y) as f64;
        let distance_m = (dx * dx + dy * dy).sqrt() * PIXELS_TO_METERS as f64;
        stats.distance_covered_m += distance_m;

        let dt = b.timestamp - a.timestamp;
        if dt > 0.0 {
            speeds.push(distance_m / dt * MPS_TO_KMH);
            // Dwell time for the interval is charged to the starting zone.
            let zone = CourtZone::classify(a.x / width, a.y / height);
            *stats.zone_time_seconds.entry(zone).or_insert(0.0) += dt;
        }
    }

    if !speeds.is_empty() {
        stats.avg_speed_kmh = speeds.iter().sum::<f64>() / speeds.len() as f64;
        stats.max_speed_kmh = speeds.iter().cloned().fold(f64::MIN, f64::max);
    }
}
