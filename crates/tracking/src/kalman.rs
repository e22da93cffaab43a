//! Constant-velocity motion estimation for tracked players.
//!
//! The state vector covers (cx, cy, w, h) and their per-frame velocities,
//! with a diagonal covariance approximation. Prediction advances position by
//! velocity and inflates uncertainty; the update step corrects toward the
//! measurement with a per-component gain proportional to relative uncertainty.

use court_vision_common::{BoundingBox, Point};

/// Sizes never extrapolate below this during prediction or update.
pub(crate) const MIN_DIMENSION: f32 = 1e-3;

const INITIAL_POSITION_VARIANCE: f32 = 10.0;
const INITIAL_VELOCITY_VARIANCE: f32 = 100.0;

#[derive(Debug, Clone)]
pub struct MotionEstimate {
    /// State vector: [cx, cy, w, h, vcx, vcy, vw, vh]
    state: [f32; 8],
    /// Diagonal covariance approximation
    covariance: [f32; 8],
    process_noise_pos: f32,
    process_noise_vel: f32,
    measurement_noise: f32,
}

impl MotionEstimate {
    pub fn new(bbox: &BoundingBox) -> Self {
        let center = bbox.center();
        Self {
            state: [
                center.x,
                center.y,
                bbox.width().max(MIN_DIMENSION),
                bbox.height().max(MIN_DIMENSION),
                0.0,
                0.0,
                0.0,
                0.0,
            ],
            covariance: [
                INITIAL_POSITION_VARIANCE,
                INITIAL_POSITION_VARIANCE,
                INITIAL_POSITION_VARIANCE,
                INITIAL_POSITION_VARIANCE,
                INITIAL_VELOCITY_VARIANCE,
                INITIAL_VELOCITY_VARIANCE,
                INITIAL_VELOCITY_VARIANCE,
                INITIAL_VELOCITY_VARIANCE,
            ],
            process_noise_pos: 1.0,
            process_noise_vel: 0.1,
            measurement_noise: 1.0,
        }
    }

    /// Advance the state by one frame interval.
    ///
    /// Positional uncertainty inflates monotonically, so repeated predictions
    /// without updates keep extrapolating while the estimate degrades.
    pub fn predict(&mut self) {
        self.state[0] += self.state[4];
        self.state[1] += self.state[5];
        self.state[2] = (self.state[2] + self.state[6]).max(MIN_DIMENSION);
        self.state[3] = (self.state[3] + self.state[7]).max(MIN_DIMENSION);

        for i in 0..4 {
            self.covariance[i] += self.process_noise_pos;
        }
        for i in 4..8 {
            self.covariance[i] += self.process_noise_vel;
        }
    }

    /// Correct the predicted state toward an observed box.
    pub fn update(&mut self, bbox: &BoundingBox) {
        let center = bbox.center();
        let measurement = [center.x, center.y, bbox.width(), bbox.height()];

        for i in 0..4 {
            let innovation_var = self.covariance[i] + self.measurement_noise;
            let gain = self.covariance[i] / innovation_var;
            let innovation = measurement[i] - self.state[i];

            self.state[i] += gain * innovation;
            self.state[i + 4] = gain * innovation;
            self.covariance[i] *= 1.0 - gain;
        }

        self.state[2] = self.state[2].max(MIN_DIMENSION);
        self.state[3] = self.state[3].max(MIN_DIMENSION);
    }

    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::from_center(
            self.state[0],
            self.state[1],
            self.state[2].max(MIN_DIMENSION),
            self.state[3].max(MIN_DIMENSION),
        )
    }

    pub fn center(&self) -> Point {
        Point::new(self.state[0], self.state[1])
    }

    /// Mean positional variance, used as a rough estimate-quality signal.
    pub fn position_uncertainty(&self) -> f32 {
        (self.covariance[0] + self.covariance[1]) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predict_holds_position_with_zero_velocity() {
        let mut motion = MotionEstimate::new(&BoundingBox::new(10.0, 20.0, 30.0, 60.0));
        motion.predict();
        let predicted = motion.bbox();
        assert!((predicted.center().x - 20.0).abs() < 0.01);
        assert!((predicted.center().y - 40.0).abs() < 0.01);
    }

    #[test]
    fn test_update_moves_toward_measurement() {
        let mut motion = MotionEstimate::new(&BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        motion.predict();
        motion.update(&BoundingBox::new(20.0, 0.0, 30.0, 10.0));

        let center = motion.center();
        assert!(center.x > 5.0 && center.x < 25.0);
        assert!((center.y - 5.0).abs() < 0.1);
    }

    #[test]
    fn test_velocity_learned_from_consecutive_updates() {
        let mut motion = MotionEstimate::new(&BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        for step in 1..=5 {
            motion.predict();
            let shift = step as f32 * 5.0;
            motion.update(&BoundingBox::new(shift, 0.0, shift + 10.0, 10.0));
        }

        // After steady rightward motion the prediction keeps moving right.
        let before = motion.center().x;
        motion.predict();
        assert!(motion.center().x > before);
    }

    #[test]
    fn test_uncertainty_inflates_while_unmatched() {
        let mut motion = MotionEstimate::new(&BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        let initial = motion.position_uncertainty();
        motion.predict();
        let after_one = motion.position_uncertainty();
        motion.predict();
        let after_two = motion.position_uncertainty();

        assert!(after_one > initial);
        assert!(after_two > after_one);
    }

    #[test]
    fn test_size_never_extrapolates_non_positive() {
        let mut motion = MotionEstimate::new(&BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        // Shrinking measurements teach negative size velocity.
        motion.predict();
        motion.update(&BoundingBox::new(0.0, 0.0, 2.0, 2.0));
        motion.predict();
        motion.update(&BoundingBox::new(0.0, 0.0, 0.5, 0.5));
        for _ in 0..50 {
            motion.predict();
        }

        let bbox = motion.bbox();
        assert!(bbox.width() >= MIN_DIMENSION);
        assert!(bbox.height() >= MIN_DIMENSION);
    }
}
