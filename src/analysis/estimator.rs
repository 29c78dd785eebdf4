//! AttentionEstimator - single-frame attention score from face landmarks
//!
//! The score is a geometric heuristic, not a gaze measurement:
//! - Yaw: horizontal offset of the nose tip from the centre of the eye line
//! - Pitch: vertical offset of the nose tip from the eye line
//! - Openness: mean vertical eyelid gap above a closed-eye baseline
//!
//! The three sub-scores are linearly blended and mapped to an integer in
//! [0, 100].

use serde::{Deserialize, Serialize};

use crate::error::LandmarkError;
use crate::geometry::{clamp, midpoint, LandmarkPoint};
use crate::landmarks::{index, FaceLandmarkSet};
use crate::overlay::OverlayGeometry;

/// Output of one estimation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttentionSample {
    /// Instantaneous attention score in [0, 100]
    pub score: u8,
    /// Points for the overlay layer, in the same normalized coordinates
    pub geometry: OverlayGeometry,
}

/// Intermediate sub-scores, exposed for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttentionBreakdown {
    pub yaw_offset: f64,
    pub pitch_offset: f64,
    pub yaw_score: f64,
    pub pitch_score: f64,
    pub open_score: f64,
    pub blended: f64,
}

/// Stateless estimator turning a landmark set into an [`AttentionSample`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AttentionEstimator;

impl AttentionEstimator {
    /// Horizontal nose deviation at which the yaw score reaches zero
    pub const YAW_TOLERANCE: f64 = 0.08;
    /// Vertical nose deviation at which the pitch score reaches zero
    pub const PITCH_TOLERANCE: f64 = 0.1;
    /// Eyelid gap treated as fully closed
    pub const CLOSED_EYE_GAP: f64 = 0.015;
    /// Gap above the closed baseline that counts as fully open
    pub const OPEN_EYE_RANGE: f64 = 0.03;

    pub const YAW_WEIGHT: f64 = 0.55;
    pub const PITCH_WEIGHT: f64 = 0.25;
    pub const OPEN_WEIGHT: f64 = 0.20;

    pub fn new() -> Self {
        Self
    }

    /// Estimate the instantaneous attention score for one face.
    ///
    /// # Arguments
    /// * `landmarks` - Full landmark set for a single face
    ///
    /// # Returns
    /// * `Ok(AttentionSample)` - Score in [0, 100] plus overlay geometry
    /// * `Err(LandmarkError)` - A required landmark is missing or non-finite
    pub fn estimate(&self, landmarks: &FaceLandmarkSet) -> Result<AttentionSample, LandmarkError> {
        self.estimate_detailed(landmarks)
            .map(|(sample, _)| sample)
    }

    /// Same as [`estimate`](Self::estimate) but also returns the sub-scores.
    pub fn estimate_detailed(
        &self,
        landmarks: &FaceLandmarkSet,
    ) -> Result<(AttentionSample, AttentionBreakdown), LandmarkError> {
        let left_outer = landmarks.required(index::LEFT_EYE_OUTER)?;
        let left_inner = landmarks.required(index::LEFT_EYE_INNER)?;
        let right_inner = landmarks.required(index::RIGHT_EYE_INNER)?;
        let right_outer = landmarks.required(index::RIGHT_EYE_OUTER)?;
        let left_top = landmarks.required(index::LEFT_EYE_TOP)?;
        let left_bottom = landmarks.required(index::LEFT_EYE_BOTTOM)?;
        let right_top = landmarks.required(index::RIGHT_EYE_TOP)?;
        let right_bottom = landmarks.required(index::RIGHT_EYE_BOTTOM)?;
        let nose = landmarks.required(index::NOSE_TIP)?;

        // Eye centres take x from the corners and y from the eyelids.
        let left_eye = LandmarkPoint::new(
            midpoint(left_outer, left_inner).x,
            midpoint(left_top, left_bottom).y,
        );
        let right_eye = LandmarkPoint::new(
            midpoint(right_outer, right_inner).x,
            midpoint(right_top, right_bottom).y,
        );
        let eyes_mid = midpoint(left_eye, right_eye);

        let yaw_offset = nose.x - eyes_mid.x;
        let pitch_offset = nose.y - eyes_mid.y;

        let yaw_score = clamp(1.0 - yaw_offset.abs() / Self::YAW_TOLERANCE, 0.0, 1.0);
        let pitch_score = clamp(1.0 - pitch_offset.abs() / Self::PITCH_TOLERANCE, 0.0, 1.0);

        let left_gap = (left_top.y - left_bottom.y).abs();
        let right_gap = (right_top.y - right_bottom.y).abs();
        let mean_gap = (left_gap + right_gap) / 2.0;
        let open_score = clamp(mean_gap - Self::CLOSED_EYE_GAP, 0.0, Self::OPEN_EYE_RANGE)
            / Self::OPEN_EYE_RANGE;

        let blended = Self::YAW_WEIGHT * yaw_score
            + Self::PITCH_WEIGHT * pitch_score
            + Self::OPEN_WEIGHT * open_score;
        let score = (clamp(blended, 0.0, 1.0) * 100.0).round() as u8;

        let sample = AttentionSample {
            score,
            geometry: OverlayGeometry {
                nose,
                left_eye,
                right_eye,
            },
        };
        let breakdown = AttentionBreakdown {
            yaw_offset,
            pitch_offset,
            yaw_score,
            pitch_score,
            open_score,
            blended,
        };
        Ok((sample, breakdown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::KeyLandmarks;

    fn estimate(keys: KeyLandmarks) -> (AttentionSample, AttentionBreakdown) {
        AttentionEstimator::new()
            .estimate_detailed(&keys.into_landmark_set())
            .expect("valid landmark set")
    }

    #[test]
    fn test_frontal_face_scores_full_marks() {
        let (sample, breakdown) = estimate(KeyLandmarks::frontal());
        assert!((breakdown.yaw_score - 1.0).abs() < 1e-9);
        assert!((breakdown.pitch_score - 1.0).abs() < 1e-9);
        assert!((breakdown.open_score - 1.0).abs() < 1e-6);
        assert_eq!(sample.score, 100);
    }

    #[test]
    fn test_yaw_at_tolerance_boundary() {
        let (sample, breakdown) = estimate(KeyLandmarks::frontal().with_nose_offset(0.08, 0.0));
        assert!(breakdown.yaw_score < 1e-9);
        assert_eq!(sample.score, 45);
    }

    #[test]
    fn test_pitch_beyond_tolerance_clamps_to_zero() {
        let (sample, breakdown) = estimate(KeyLandmarks::frontal().with_nose_offset(0.0, -0.3));
        assert_eq!(breakdown.pitch_score, 0.0);
        assert_eq!(sample.score, 75);
    }

    #[test]
    fn test_closed_eyes_score_zero_openness() {
        let (sample, breakdown) = estimate(KeyLandmarks::frontal().with_eye_gap(0.01));
        assert_eq!(breakdown.open_score, 0.0);
        assert_eq!(sample.score, 80);
    }

    #[test]
    fn test_half_open_eyes() {
        // 0.03 gap sits halfway between the 0.015 baseline and fully open.
        let (_, breakdown) = estimate(KeyLandmarks::frontal().with_eye_gap(0.03));
        assert!((breakdown.open_score - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_extreme_pose_stays_in_range() {
        let keys = KeyLandmarks::frontal()
            .with_nose_offset(0.5, 0.5)
            .with_eye_gap(0.0);
        let (sample, _) = estimate(keys);
        assert_eq!(sample.score, 0);
    }

    #[test]
    fn test_score_always_within_bounds() {
        for dx in [-0.3, -0.1, -0.04, 0.0, 0.02, 0.07, 0.2] {
            for dy in [-0.2, -0.05, 0.0, 0.05, 0.2] {
                for gap in [0.0, 0.01, 0.02, 0.045, 0.1] {
                    let keys = KeyLandmarks::frontal()
                        .with_nose_offset(dx, dy)
                        .with_eye_gap(gap);
                    let (sample, _) = estimate(keys);
                    assert!(sample.score <= 100);
                }
            }
        }
    }

    #[test]
    fn test_geometry_uses_eye_centres_and_nose() {
        let (sample, _) = estimate(KeyLandmarks::frontal().with_nose_offset(0.01, 0.02));
        let geometry = sample.geometry;
        assert!((geometry.left_eye.x - 0.40).abs() < 1e-9);
        assert!((geometry.left_eye.y - 0.45).abs() < 1e-9);
        assert!((geometry.right_eye.x - 0.60).abs() < 1e-9);
        assert!((geometry.nose.x - 0.51).abs() < 1e-9);
        assert!((geometry.nose.y - 0.47).abs() < 1e-9);
    }

    #[test]
    fn test_missing_index_is_rejected() {
        let set = FaceLandmarkSet::new(vec![LandmarkPoint::new(0.5, 0.5); 100]);
        let err = AttentionEstimator::new().estimate(&set).unwrap_err();
        assert!(matches!(err, LandmarkError::InvalidLandmarkSet { len: 100, .. }));
    }
}
