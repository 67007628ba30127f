//! Overlay geometry: computed placement, manual adjustment and the
//! video-to-display transform.

mod adjust;
mod placement;
mod viewport;

pub use adjust::{AdjustmentController, AdjustmentDelta, Direction};
pub use placement::{OverlayPlacement, OverlayPositioner, PlacementCalibration, PlacementError};
pub use viewport::Viewport;
