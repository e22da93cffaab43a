//! Static court-zone classification.
//!
//! Zones are normalized rectangles relative to one basket; a position is
//! classified by containment in a fixed order, falling back to mid-range.
//! This is a rectangular approximation, not real court calibration.

use serde::{Deserialize, Serialize};

/// Named court regions used for shot and positional classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourtZone {
    RestrictedArea,
    Paint,
    LeftCornerThree,
    RightCornerThree,
    LeftWingThree,
    RightWingThree,
    TopThree,
    MidRange,
}

/// (zone, x1, y1, x2, y2) in normalized frame coordinates; checked in order.
const ZONE_TABLE: [(CourtZone, f32, f32, f32, f32); 8] = [
    (CourtZone::RestrictedArea, 0.45, 0.88, 0.55, 1.0),
    (CourtZone::Paint, 0.35, 0.81, 0.65, 1.0),
    (CourtZone::LeftCornerThree, 0.0, 0.88, 0.22, 1.0),
    (CourtZone::RightCornerThree, 0.78, 0.88, 1.0, 1.0),
    (CourtZone::LeftWingThree, 0.15, 0.65, 0.35, 0.85),
    (CourtZone::RightWingThree, 0.65, 0.65, 0.85, 0.85),
    (CourtZone::TopThree, 0.35, 0.5, 0.65, 0.75),
    (CourtZone::MidRange, 0.25, 0.75, 0.75, 0.9),
];

impl CourtZone {
    /// Classify a normalized position; mid-range is the deterministic default.
    pub fn classify(norm_x: f32, norm_y: f32) -> CourtZone {
        for &(zone, x1, y1, x2, y2) in &ZONE_TABLE {
            if (x1..=x2).contains(&norm_x) && (y1..=y2).contains(&norm_y) {
                return zone;
            }
        }
        CourtZone::MidRange
    }

    /// Point value of a made shot from this zone.
    pub fn value(&self) -> u8 {
        if self.is_three_pointer() {
            3
        } else {
            2
        }
    }

    pub fn is_three_pointer(&self) -> bool {
        matches!(
            self,
            CourtZone::LeftCornerThree
                | CourtZone::RightCornerThree
                | CourtZone::LeftWingThree
                | CourtZone::RightWingThree
                | CourtZone::TopThree
        )
    }
}
