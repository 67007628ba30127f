//! Fetching and decoding frame images.

use futures_util::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::asset::{AssetImage, FrameAsset};
use super::cache::AssetCache;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A frame image could not be made available.
///
/// Never fatal: the live preview keeps running without the overlay.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
    #[error("Asset load failed for '{id}': {reason}")]
    LoadFailed { id: String, reason: String },

    #[error("Asset '{0}' has not been requested")]
    NotRequested(String),
}

impl AssetError {
    fn load_failed(asset: &FrameAsset, reason: impl ToString) -> Self {
        AssetError::LoadFailed {
            id: asset.id.clone(),
            reason: reason.to_string(),
        }
    }
}

/// Loads `http(s)://` images (through an optional disk cache) and local files.
#[derive(Debug, Clone)]
pub struct AssetLoader {
    http_client: reqwest::Client,
    cache: Option<AssetCache>,
}

impl AssetLoader {
    pub fn new(cache: Option<AssetCache>) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()?;
        Ok(Self { http_client, cache })
    }

    pub async fn load(&self, asset: Arc<FrameAsset>) -> Result<AssetImage, AssetError> {
        let bytes = if is_remote(&asset.image_url) {
            self.fetch_remote(&asset).await?
        } else {
            let path = local_path(&asset.image_url);
            tokio::fs::read(&path)
                .await
                .map_err(|e| AssetError::load_failed(&asset, format!("{}: {}", path.display(), e)))?
        };

        let image = image::load_from_memory(&bytes)
            .map_err(|e| AssetError::load_failed(&asset, e))?
            .to_rgba8();
        if image.width() == 0 || image.height() == 0 {
            return Err(AssetError::load_failed(&asset, "image has no pixels"));
        }

        log::info!(
            "loaded frame '{}' ({}x{})",
            asset.display_name,
            image.width(),
            image.height()
        );
        Ok(AssetImage { asset, image })
    }

    async fn fetch_remote(&self, asset: &FrameAsset) -> Result<Vec<u8>, AssetError> {
        let url = &asset.image_url;
        if let Some(path) = self.cache.as_ref().and_then(|c| c.get(url)) {
            match tokio::fs::read(&path).await {
                Ok(bytes) => {
                    log::debug!("cache hit for {}", url);
                    return Ok(bytes);
                }
                Err(e) => log::warn!("ignoring unreadable cache entry {}: {}", path.display(), e),
            }
        }

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| AssetError::load_failed(asset, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AssetError::load_failed(asset, format!("HTTP {}", status)));
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| AssetError::load_failed(asset, e))?;
            bytes.extend_from_slice(&chunk);
        }

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.store(url, &bytes) {
                log::warn!("failed to cache {}: {}", url, e);
            }
        }
        Ok(bytes)
    }
}

fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn local_path(url: &str) -> PathBuf {
    PathBuf::from(url.strip_prefix("file://").unwrap_or(url))
}
