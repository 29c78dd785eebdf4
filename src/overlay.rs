//! Overlay geometry handed to the rendering layer.
//!
//! The engine never draws. It publishes normalized points per detected frame,
//! and [`OverlayGeometry::to_pixels`] maps them onto a canvas of the video's
//! size: a line joining the eye centres and a dot on the nose tip.

use serde::{Deserialize, Serialize};

use crate::geometry::{distance, LandmarkPoint};

/// Normalized points describing the current head pose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayGeometry {
    pub nose: LandmarkPoint,
    pub left_eye: LandmarkPoint,
    pub right_eye: LandmarkPoint,
}

/// A point in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

/// Draw commands for one frame, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelOverlay {
    pub eye_line: (PixelPoint, PixelPoint),
    pub nose: PixelPoint,
    pub nose_radius: f64,
    pub style: OverlayStyle,
}

/// Stroke and fill settings for the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayStyle {
    /// RGBA colour, alpha in [0, 1]
    pub color: (u8, u8, u8, f32),
    pub line_width: f64,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            color: (16, 185, 129, 0.9),
            line_width: 2.0,
        }
    }
}

impl OverlayGeometry {
    pub const NOSE_RADIUS_PX: f64 = 4.0;

    /// Normalized distance between the eye centres.
    pub fn interocular_distance(&self) -> f64 {
        distance(self.left_eye, self.right_eye)
    }

    /// Map onto a `width` x `height` canvas.
    ///
    /// Returns `None` when either dimension is zero (no decoded frame yet).
    pub fn to_pixels(&self, width: u32, height: u32) -> Option<PixelOverlay> {
        if width == 0 || height == 0 {
            return None;
        }
        let to_pixel = |point: LandmarkPoint| PixelPoint {
            x: point.x * width as f64,
            y: point.y * height as f64,
        };
        Some(PixelOverlay {
            eye_line: (to_pixel(self.left_eye), to_pixel(self.right_eye)),
            nose: to_pixel(self.nose),
            nose_radius: Self::NOSE_RADIUS_PX,
            style: OverlayStyle::default(),
        })
    }
}
