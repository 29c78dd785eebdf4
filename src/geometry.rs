// Geometry - numeric helpers over normalized image coordinates
//
// Landmark coordinates are normalized to [0, 1] with the origin at the
// top-left corner of the video frame.

use serde::{Deserialize, Serialize};

/// A single 2D point in normalized image space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f64,
    pub y: f64,
}

impl LandmarkPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both coordinates are finite (no NaN or infinity).
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Clamp `value` into `[min, max]`.
///
/// Evaluates as `min(max(value, min), max)`, so unlike `f64::clamp` it never
/// panics when `min > max`.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// Midpoint of two points.
pub fn midpoint(a: LandmarkPoint, b: LandmarkPoint) -> LandmarkPoint {
    LandmarkPoint {
        x: (a.x + b.x) / 2.0,
        y: (a.y + b.y) / 2.0,
    }
}

/// Euclidean distance between two points.
pub fn distance(a: LandmarkPoint, b: LandmarkPoint) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Arithmetic mean of integer scores, rounded to the nearest integer.
///
/// Returns `None` for an empty input.
pub fn rounded_mean<I>(scores: I) -> Option<u8>
where
    I: IntoIterator<Item = u8>,
{
    let (sum, count) = scores
        .into_iter()
        .fold((0u64, 0u64), |(sum, count), score| (sum + score as u64, count + 1));
    if count == 0 {
        return None;
    }
    // Scores are non-negative, so round-half-away-from-zero equals round-half-up.
    let mean = (sum as f64 / count as f64).round();
    Some(mean.min(u8::MAX as f64) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_bounds() {
        assert_eq!(clamp(-0.5, 0.0, 1.0), 0.0);
        assert_eq!(clamp(1.5, 0.0, 1.0), 1.0);
        assert_eq!(clamp(0.25, 0.0, 1.0), 0.25);
        assert_eq!(clamp(0.04, 0.0, 0.03), 0.03);
    }

    #[test]
    fn test_midpoint_and_distance() {
        let a = LandmarkPoint::new(0.2, 0.4);
        let b = LandmarkPoint::new(0.6, 0.8);
        let mid = midpoint(a, b);
        assert!((mid.x - 0.4).abs() < 1e-12);
        assert!((mid.y - 0.6).abs() < 1e-12);

        let d = distance(LandmarkPoint::new(0.0, 0.0), LandmarkPoint::new(0.3, 0.4));
        assert!((d - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_rounded_mean() {
        assert_eq!(rounded_mean(Vec::<u8>::new()), None);
        assert_eq!(rounded_mean([70, 80, 90]), Some(80));
        // 0.5 rounds up
        assert_eq!(rounded_mean([1, 2]), Some(2));
        assert_eq!(rounded_mean([100; 20]), Some(100));
    }

    #[test]
    fn test_non_finite_point() {
        assert!(LandmarkPoint::new(0.1, 0.2).is_finite());
        assert!(!LandmarkPoint::new(f64::NAN, 0.2).is_finite());
        assert!(!LandmarkPoint::new(0.1, f64::INFINITY).is_finite());
    }
}
