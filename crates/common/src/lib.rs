//! Common types and utilities shared by the tracking and analytics crates

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while validating detector input
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("Malformed bounding box: {0}")]
    MalformedBox(String),

    #[error("Confidence out of range: {0}")]
    InvalidConfidence(f32),
}

/// Result type for detection validation
pub type Result<T> = std::result::Result<T, DetectionError>;

const FEATURE_NORM_EPSILON: f32 = 1e-6;

/// A 2D point in frame coordinates (origin top-left, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Axis-aligned bounding box in (x1, y1, x2, y2) corner format
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Build a box from a center point and size
    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self {
            x1: cx - width / 2.0,
            y1: cy - height / 2.0,
            x2: cx + width / 2.0,
            y2: cy + height / 2.0,
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    pub fn center(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    #[inline]
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix = (self.x2.min(other.x2) - self.x1.max(other.x1)).max(0.0);
        let iy = (self.y2.min(other.y2) - self.y1.max(other.y1)).max(0.0);
        let intersection = ix * iy;
        let union = self.area() + other.area() - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }

    /// Finite coordinates with positive extent in both axes
    pub fn is_valid(&self) -> bool {
        let coords = [self.x1, self.y1, self.x2, self.y2];
        coords.iter().all(|c| c.is_finite()) && self.width() > 0.0 && self.height() > 0.0
    }
}

/// Object class reported by the external detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionClass {
    Player,
    Ball,
}

/// A single detection produced by the external detector for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub confidence: f32,
    pub class: DetectionClass,
}

impl Detection {
    pub fn new(bbox: BoundingBox, confidence: f32, class: DetectionClass) -> Self {
        Self {
            bbox,
            confidence,
            class,
        }
    }

    pub fn center(&self) -> Point {
        self.bbox.center()
    }

    pub fn area(&self) -> f32 {
        self.bbox.area()
    }

    /// Reject malformed detector output without aborting the frame
    pub fn validate(&self) -> Result<()> {
        if !self.bbox.is_valid() {
            return Err(DetectionError::MalformedBox(format!(
                "({}, {}, {}, {})",
                self.bbox.x1, self.bbox.y1, self.bbox.x2, self.bbox.y2
            )));
        }
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(DetectionError::InvalidConfidence(self.confidence));
        }
        Ok(())
    }

    /// Appearance descriptor for association.
    ///
    /// No richer embedding is available at this boundary, so the L2-normalized
    /// bounding box stands in as a cheap substitute feature. This conflates
    /// size/position similarity with appearance similarity; see DESIGN.md.
    pub fn feature(&self) -> [f32; 4] {
        let raw = [self.bbox.x1, self.bbox.y1, self.bbox.x2, self.bbox.y2];
        let norm = raw.iter().map(|v| v * v).sum::<f32>().sqrt();
        raw.map(|v| v / (norm + FEATURE_NORM_EPSILON))
    }
}

/// All detections reported for one frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameDetections {
    pub frame_id: u64,
    pub timestamp: f64,
    pub detections: Vec<Detection>,
}

/// Source video properties needed for normalization and rate math
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: u64,
}

impl VideoMetadata {
    pub fn new(width: u32, height: u32, fps: f64, total_frames: u64) -> Self {
        Self {
            width,
            height,
            fps,
            total_frames,
        }
    }

    /// Frame diagonal in pixels
    pub fn diagonal(&self) -> f32 {
        let w = self.width as f32;
        let h = self.height as f32;
        (w * w + h * h).sqrt()
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.fps > 0.0 {
            self.total_frames as f64 / self.fps
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(x1: f32, y1: f32, x2: f32, y2: f32, conf: f32) -> Detection {
        Detection::new(BoundingBox::new(x1, y1, x2, y2), conf, DetectionClass::Player)
    }

    #[test]
    fn test_bbox_center_and_area() {
        let bbox = BoundingBox::new(10.0, 20.0, 30.0, 60.0);
        assert_eq!(bbox.center(), Point::new(20.0, 40.0));
        assert_eq!(bbox.area(), 800.0);
        assert_eq!(bbox.width(), 20.0);
        assert_eq!(bbox.height(), 40.0);
    }

    #[test]
    fn test_bbox_from_center_roundtrip() {
        let bbox = BoundingBox::from_center(50.0, 80.0, 20.0, 40.0);
        assert_eq!(bbox.center(), Point::new(50.0, 80.0));
        assert!((bbox.width() - 20.0).abs() < f32::EPSILON);
        assert!((bbox.height() - 40.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_iou_identical_boxes() {
        let bbox = BoundingBox::new(0.1, 0.1, 0.5, 0.5);
        assert!((bbox.iou(&bbox) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_iou_no_overlap() {
        let a = BoundingBox::new(0.0, 0.0, 0.2, 0.2);
        let b = BoundingBox::new(0.5, 0.5, 0.7, 0.7);
        assert!(a.iou(&b) < 0.001);
    }

    #[test]
    fn test_iou_partial_overlap() {
        let a = BoundingBox::new(0.0, 0.0, 0.5, 0.5);
        let b = BoundingBox::new(0.25, 0.25, 0.75, 0.75);
        let iou = a.iou(&b);
        assert!(iou > 0.1 && iou < 0.2, "IoU should be ~0.14, got {iou}");
    }

    #[test]
    fn test_validate_accepts_well_formed() {
        assert!(player(10.0, 10.0, 50.0, 90.0, 0.8).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_negative_extent() {
        let det = player(50.0, 10.0, 10.0, 90.0, 0.8);
        assert!(matches!(
            det.validate(),
            Err(DetectionError::MalformedBox(_))
        ));
    }

    #[test]
    fn test_validate_rejects_nan_coordinates() {
        let det = player(f32::NAN, 10.0, 50.0, 90.0, 0.8);
        assert!(det.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_confidence() {
        let det = player(10.0, 10.0, 50.0, 90.0, 1.5);
        assert!(matches!(
            det.validate(),
            Err(DetectionError::InvalidConfidence(_))
        ));
    }

    #[test]
    fn test_feature_is_unit_length() {
        let det = player(100.0, 200.0, 300.0, 400.0, 0.9);
        let feature = det.feature();
        let norm: f32 = feature.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_video_metadata_diagonal() {
        let video = VideoMetadata::new(1920, 1080, 30.0, 300);
        assert!((video.diagonal() - 2202.9071).abs() < 0.01);
        assert!((video.duration_seconds() - 10.0).abs() < 1e-9);
    }
}
