//! CLI enum types.

use clap::ValueEnum;

/// Where camera frames come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CameraSource {
    /// Real webcam
    #[default]
    Webcam,
    /// Solid in-process frames, no hardware needed
    Synthetic,
}
