//! Frame assets as listed by the catalog, and their decoded images.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A selectable eyewear product.
///
/// Owned by the catalog; the try-on session only holds `Arc` references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameAsset {
    pub id: String,
    #[serde(alias = "imageUrl", alias = "image")]
    pub image_url: String,
    #[serde(alias = "displayName", alias = "name")]
    pub display_name: String,
}

/// A frame asset whose image has finished loading.
#[derive(Debug, Clone)]
pub struct AssetImage {
    pub asset: Arc<FrameAsset>,
    pub image: RgbaImage,
}

impl AssetImage {
    /// Width over height of the loaded image. Never assumed from metadata.
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.image.width()) / f64::from(self.image.height())
    }
}
