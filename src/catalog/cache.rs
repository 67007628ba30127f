//! AssetCache - disk cache for remotely hosted frame images.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Persistent cache of downloaded asset images, keyed by URL.
#[derive(Debug, Clone)]
pub struct AssetCache {
    cache_dir: PathBuf,
}

impl AssetCache {
    /// Does not create the directory; `store` does that lazily.
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// `~/.cache/tryon-overlay/frames/`
    pub fn with_default_dir() -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("tryon-overlay")
            .join("frames");
        Self::new(cache_dir)
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Cached file for `url`, if present.
    pub fn get(&self, url: &str) -> Option<PathBuf> {
        let path = self.path_for(url);
        path.is_file().then_some(path)
    }

    pub fn store(&self, url: &str, bytes: &[u8]) -> Result<PathBuf, std::io::Error> {
        std::fs::create_dir_all(&self.cache_dir)?;
        let path = self.path_for(url);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Remove every cached image.
    pub fn clear(&self) -> Result<usize, std::io::Error> {
        if !self.cache_dir.exists() {
            return Ok(0);
        }
        let mut removed = 0;
        for entry in std::fs::read_dir(&self.cache_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("img") {
                std::fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// 32 hex chars (first 16 bytes of SHA-256). Same URL, same key.
    pub fn hash_url(url: &str) -> String {
        let digest = Sha256::digest(url.as_bytes());
        hex::encode(&digest[..16])
    }

    fn path_for(&self, url: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.img", Self::hash_url(url)))
    }
}
