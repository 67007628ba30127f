//! Eye-line estimation.
//!
//! The default estimator is a geometric heuristic keyed only on the capture
//! resolution: it assumes a centered, front-facing head-and-shoulders framing.
//! A real landmark model can replace it behind [`LandmarkEstimator`] without
//! touching anything downstream.

use serde::{Deserialize, Serialize};

/// Approximate eye geometry for one frame, in video-space pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkEstimate {
    pub center_x: f64,
    pub eye_line_y: f64,
    pub inter_eye_span: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EstimateError {
    #[error("cannot estimate landmarks for an empty {width}x{height} frame")]
    EmptyFrame { width: u32, height: u32 },

    #[error("landmark estimation failed: {0}")]
    Failed(String),
}

/// Anything that can locate the eyes given a frame size.
pub trait LandmarkEstimator {
    fn estimate(&self, frame_width: u32, frame_height: u32)
        -> Result<LandmarkEstimate, EstimateError>;
}

impl<E: LandmarkEstimator + ?Sized> LandmarkEstimator for Box<E> {
    fn estimate(&self, w: u32, h: u32) -> Result<LandmarkEstimate, EstimateError> {
        (**self).estimate(w, h)
    }
}

/// Fractions of the frame used by [`HeuristicEstimator`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FramingRatios {
    /// Eye line as a fraction of frame height (slightly above center).
    pub eye_line_ratio: f64,
    /// Inter-eye span as a fraction of frame width.
    pub span_ratio: f64,
}

impl Default for FramingRatios {
    fn default() -> Self {
        Self {
            eye_line_ratio: 0.42,
            span_ratio: 0.12,
        }
    }
}

/// Cheap resolution-only estimator; runs every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HeuristicEstimator {
    pub ratios: FramingRatios,
}

impl HeuristicEstimator {
    pub fn new(ratios: FramingRatios) -> Self {
        Self { ratios }
    }
}

impl LandmarkEstimator for HeuristicEstimator {
    fn estimate(
        &self,
        frame_width: u32,
        frame_height: u32,
    ) -> Result<LandmarkEstimate, EstimateError> {
        if frame_width == 0 || frame_height == 0 {
            return Err(EstimateError::EmptyFrame {
                width: frame_width,
                height: frame_height,
            });
        }
        let w = f64::from(frame_width);
        let h = f64::from(frame_height);
        Ok(LandmarkEstimate {
            center_x: w / 2.0,
            eye_line_y: h * self.ratios.eye_line_ratio,
            inter_eye_span: w * self.ratios.span_ratio,
        })
    }
}
