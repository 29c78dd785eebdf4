//! Face landmark sets as produced by the external face mesh detector.
//!
//! The detector returns a positional list of normalized points. Only nine of
//! them are read by the estimator; [`KeyLandmarks`] names those nine so
//! fixtures and tests can describe a face without spelling out the full mesh.

use serde::{Deserialize, Serialize};

use crate::error::LandmarkError;
use crate::geometry::LandmarkPoint;

/// Number of points in a full face mesh (468 mesh points + 10 iris points).
pub const FACE_MESH_POINT_COUNT: usize = 478;

/// Semantically fixed indices into the face mesh.
pub mod index {
    pub const NOSE_TIP: usize = 1;
    pub const LEFT_EYE_OUTER: usize = 33;
    pub const LEFT_EYE_INNER: usize = 133;
    pub const LEFT_EYE_TOP: usize = 159;
    pub const LEFT_EYE_BOTTOM: usize = 145;
    pub const RIGHT_EYE_INNER: usize = 362;
    pub const RIGHT_EYE_OUTER: usize = 263;
    pub const RIGHT_EYE_TOP: usize = 386;
    pub const RIGHT_EYE_BOTTOM: usize = 374;

    /// Every index the estimator reads, in evaluation order.
    pub const REQUIRED: [usize; 9] = [
        LEFT_EYE_OUTER,
        LEFT_EYE_INNER,
        RIGHT_EYE_INNER,
        RIGHT_EYE_OUTER,
        LEFT_EYE_TOP,
        LEFT_EYE_BOTTOM,
        RIGHT_EYE_TOP,
        RIGHT_EYE_BOTTOM,
        NOSE_TIP,
    ];
}

/// Ordered landmark points for one detected face.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceLandmarkSet {
    points: Vec<LandmarkPoint>,
}

impl FaceLandmarkSet {
    pub fn new(points: Vec<LandmarkPoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[LandmarkPoint] {
        &self.points
    }

    pub fn get(&self, index: usize) -> Option<LandmarkPoint> {
        self.points.get(index).copied()
    }

    /// Fetch a required point, rejecting missing or non-finite entries.
    pub fn required(&self, index: usize) -> Result<LandmarkPoint, LandmarkError> {
        let point = self.get(index).ok_or(LandmarkError::InvalidLandmarkSet {
            index,
            len: self.len(),
        })?;
        if !point.is_finite() {
            return Err(LandmarkError::NonFiniteLandmark { index });
        }
        Ok(point)
    }

    /// Check that every point the estimator reads is present and finite.
    pub fn validate(&self) -> Result<(), LandmarkError> {
        for &idx in index::REQUIRED.iter() {
            self.required(idx)?;
        }
        Ok(())
    }
}

/// The nine landmarks the estimator reads, by name.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyLandmarks {
    pub nose_tip: LandmarkPoint,
    pub left_eye_outer: LandmarkPoint,
    pub left_eye_inner: LandmarkPoint,
    pub left_eye_top: LandmarkPoint,
    pub left_eye_bottom: LandmarkPoint,
    pub right_eye_inner: LandmarkPoint,
    pub right_eye_outer: LandmarkPoint,
    pub right_eye_top: LandmarkPoint,
    pub right_eye_bottom: LandmarkPoint,
}

impl KeyLandmarks {
    /// A frontal face: nose centred under the eye line, eyelid gap 0.045.
    pub fn frontal() -> Self {
        Self {
            nose_tip: LandmarkPoint::new(0.5, 0.45),
            left_eye_outer: LandmarkPoint::new(0.35, 0.45),
            left_eye_inner: LandmarkPoint::new(0.45, 0.45),
            left_eye_top: LandmarkPoint::new(0.40, 0.4275),
            left_eye_bottom: LandmarkPoint::new(0.40, 0.4725),
            right_eye_inner: LandmarkPoint::new(0.55, 0.45),
            right_eye_outer: LandmarkPoint::new(0.65, 0.45),
            right_eye_top: LandmarkPoint::new(0.60, 0.4275),
            right_eye_bottom: LandmarkPoint::new(0.60, 0.4725),
        }
    }

    /// Shift the nose tip by `(dx, dy)`, leaving the eyes in place.
    pub fn with_nose_offset(mut self, dx: f64, dy: f64) -> Self {
        self.nose_tip.x += dx;
        self.nose_tip.y += dy;
        self
    }

    /// Set the vertical eyelid gap of both eyes around their current centres.
    pub fn with_eye_gap(mut self, gap: f64) -> Self {
        let half = gap / 2.0;
        let left_center = (self.left_eye_top.y + self.left_eye_bottom.y) / 2.0;
        let right_center = (self.right_eye_top.y + self.right_eye_bottom.y) / 2.0;
        self.left_eye_top.y = left_center - half;
        self.left_eye_bottom.y = left_center + half;
        self.right_eye_top.y = right_center - half;
        self.right_eye_bottom.y = right_center + half;
        self
    }

    /// Expand into a full-length mesh; unnamed points sit at the origin.
    pub fn into_landmark_set(self) -> FaceLandmarkSet {
        let mut points = vec![LandmarkPoint::default(); FACE_MESH_POINT_COUNT];
        points[index::NOSE_TIP] = self.nose_tip;
        points[index::LEFT_EYE_OUTER] = self.left_eye_outer;
        points[index::LEFT_EYE_INNER] = self.left_eye_inner;
        points[index::LEFT_EYE_TOP] = self.left_eye_top;
        points[index::LEFT_EYE_BOTTOM] = self.left_eye_bottom;
        points[index::RIGHT_EYE_INNER] = self.right_eye_inner;
        points[index::RIGHT_EYE_OUTER] = self.right_eye_outer;
        points[index::RIGHT_EYE_TOP] = self.right_eye_top;
        points[index::RIGHT_EYE_BOTTOM] = self.right_eye_bottom;
        FaceLandmarkSet::new(points)
    }
}

impl Default for KeyLandmarks {
    fn default() -> Self {
        Self::frontal()
    }
}

impl From<KeyLandmarks> for FaceLandmarkSet {
    fn from(keys: KeyLandmarks) -> Self {
        keys.into_landmark_set()
    }
}
