//! Where the frame image goes, in video-space pixels.

use serde::{Deserialize, Serialize};

use super::adjust::AdjustmentDelta;
use crate::landmarks::LandmarkEstimate;

/// Axis-aligned rectangle an overlay is drawn into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayPlacement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl OverlayPlacement {
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    pub fn translated(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    /// Integer pixel rectangle `(x, y, w, h)` used when compositing a photo.
    ///
    /// The terminal preview samples the continuous rectangle instead, so the
    /// two can differ by up to one video pixel at each edge.
    pub fn to_pixels(&self) -> (i64, i64, u32, u32) {
        (
            self.x.round() as i64,
            self.y.round() as i64,
            self.width.round().max(1.0) as u32,
            self.height.round().max(1.0) as u32,
        )
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlacementError {
    #[error("aspect ratio must be a positive finite number, got {0}")]
    InvalidAspect(f64),

    #[error("scale must be a positive finite number, got {0}")]
    InvalidScale(f64),

    #[error("landmarks produced a degenerate placement")]
    Degenerate,
}

/// Tunable constants for sizing and anchoring the frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementCalibration {
    /// Frame width as a multiple of the inter-eye span.
    pub span_multiplier: f64,
    /// Fraction of the frame height that sits above the eye line.
    pub vertical_anchor: f64,
}

impl Default for PlacementCalibration {
    fn default() -> Self {
        Self {
            span_multiplier: 2.5,
            vertical_anchor: 0.45,
        }
    }
}

/// Turns landmarks into a placement rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OverlayPositioner {
    pub calibration: PlacementCalibration,
}

impl OverlayPositioner {
    pub fn new(calibration: PlacementCalibration) -> Self {
        Self { calibration }
    }

    /// Size and anchor the frame around the eye line.
    ///
    /// `width / height == aspect_ratio` for every successful result.
    pub fn place(
        &self,
        landmarks: &LandmarkEstimate,
        aspect_ratio: f64,
        scale: f64,
    ) -> Result<OverlayPlacement, PlacementError> {
        if !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
            return Err(PlacementError::InvalidAspect(aspect_ratio));
        }
        if !scale.is_finite() || scale <= 0.0 {
            return Err(PlacementError::InvalidScale(scale));
        }

        let width = landmarks.inter_eye_span * self.calibration.span_multiplier * scale;
        let height = width / aspect_ratio;
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(PlacementError::Degenerate);
        }

        Ok(OverlayPlacement {
            x: landmarks.center_x - width / 2.0,
            y: landmarks.eye_line_y - height * self.calibration.vertical_anchor,
            width,
            height,
        })
    }

    /// [`place`](Self::place) with the user's scale, then the user's nudge.
    pub fn place_adjusted(
        &self,
        landmarks: &LandmarkEstimate,
        aspect_ratio: f64,
        delta: &AdjustmentDelta,
    ) -> Result<OverlayPlacement, PlacementError> {
        let placement = self.place(landmarks, aspect_ratio, delta.scale)?;
        Ok(placement.translated(delta.dx, delta.dy))
    }
}
