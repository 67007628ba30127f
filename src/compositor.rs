//! Flattening the live frame and the overlay into one still image.

use chrono::{DateTime, Local};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage, RgbaImage};

use crate::camera::Frame;
use crate::catalog::AssetImage;
use crate::overlay::OverlayPlacement;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompositeError {
    #[error("frame buffer holds {actual} bytes, expected {expected} for {width}x{height} RGB")]
    BadFrame {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// A finished try-on photo. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct CapturedPhoto {
    raster: RgbaImage,
    created_at: DateTime<Local>,
    /// Display name of the frame drawn into it, if any
    frame_name: Option<String>,
}

impl CapturedPhoto {
    pub fn raster(&self) -> &RgbaImage {
        &self.raster
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    pub fn frame_name(&self) -> Option<&str> {
        self.frame_name.as_deref()
    }

    /// `tryon-20261018-153000.png`
    pub fn suggested_name(&self) -> String {
        format!("tryon-{}.png", self.created_at.format("%Y%m%d-%H%M%S"))
    }
}

/// Flattens a photo: frame first, then the asset resized into the placement
/// rectangle rounded to whole pixels.
#[derive(Debug, Clone, Copy)]
pub struct Compositor {
    filter: FilterType,
}

impl Default for Compositor {
    fn default() -> Self {
        Self {
            filter: FilterType::Triangle,
        }
    }
}

impl Compositor {
    pub fn capture(
        &self,
        frame: &Frame,
        asset: Option<&AssetImage>,
        placement: Option<&OverlayPlacement>,
    ) -> Result<CapturedPhoto, CompositeError> {
        let mut surface = base_layer(frame)?;

        let mut frame_name = None;
        if let (Some(asset), Some(placement)) = (asset, placement) {
            let (x, y, width, height) = placement.to_pixels();
            let scaled = imageops::resize(&asset.image, width, height, self.filter);
            imageops::overlay(&mut surface, &scaled, x, y);
            frame_name = Some(asset.asset.display_name.clone());
        }

        Ok(CapturedPhoto {
            raster: surface,
            created_at: Local::now(),
            frame_name,
        })
    }
}

/// Fresh RGBA surface at the frame's native size holding the frame.
fn base_layer(frame: &Frame) -> Result<RgbaImage, CompositeError> {
    let expected = frame.width as usize * frame.height as usize * Frame::BYTES_PER_PIXEL;
    let bad_frame = || CompositeError::BadFrame {
        width: frame.width,
        height: frame.height,
        expected,
        actual: frame.data.len(),
    };
    if frame.data.len() != expected {
        return Err(bad_frame());
    }
    let rgb: RgbImage = image::ImageBuffer::<Rgb<u8>, _>::from_raw(
        frame.width,
        frame.height,
        frame.data.clone(),
    )
    .ok_or_else(bad_frame)?;
    Ok(image::DynamicImage::ImageRgb8(rgb).to_rgba8())
}
