//! Load state of every frame image the session has asked for.

use futures_util::FutureExt;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;

use super::asset::{AssetImage, FrameAsset};
use super::loader::{AssetError, AssetLoader};

/// Where a frame image is in its load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetState {
    Loading,
    Ready,
    Failed(AssetError),
}

enum Slot {
    Loading(JoinHandle<Result<AssetImage, AssetError>>),
    Ready(Arc<AssetImage>),
    Failed(AssetError),
}

/// Images keyed by asset id. Loads run as tasks on the current runtime; the
/// render loop only ever reads finished ones.
pub struct AssetShelf {
    loader: AssetLoader,
    slots: HashMap<String, Slot>,
}

impl std::fmt::Debug for AssetShelf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetShelf")
            .field("assets", &self.slots.len())
            .finish_non_exhaustive()
    }
}

impl AssetShelf {
    pub fn new(loader: AssetLoader) -> Self {
        Self {
            loader,
            slots: HashMap::new(),
        }
    }

    /// Start loading `asset` unless it is already loading or loaded.
    /// A previously failed asset is retried.
    pub fn request(&mut self, asset: Arc<FrameAsset>) {
        if matches!(
            self.slots.get(&asset.id),
            Some(Slot::Loading(_)) | Some(Slot::Ready(_))
        ) {
            return;
        }
        let loader = self.loader.clone();
        let id = asset.id.clone();
        let handle = tokio::spawn(async move { loader.load(asset).await });
        self.slots.insert(id, Slot::Loading(handle));
    }

    /// Move finished loads into `Ready`/`Failed` without waiting.
    pub fn poll(&mut self) {
        for (id, slot) in self.slots.iter_mut() {
            let Slot::Loading(handle) = &mut *slot else {
                continue;
            };
            if !handle.is_finished() {
                continue;
            }
            let finished = handle.now_or_never();
            if let Some(joined) = finished {
                *slot = settle(id, joined);
            }
        }
    }

    pub fn state(&self, id: &str) -> Option<AssetState> {
        self.slots.get(id).map(|slot| match slot {
            Slot::Loading(_) => AssetState::Loading,
            Slot::Ready(_) => AssetState::Ready,
            Slot::Failed(e) => AssetState::Failed(e.clone()),
        })
    }

    /// The image, only if it has finished loading successfully.
    pub fn ready(&self, id: &str) -> Option<Arc<AssetImage>> {
        match self.slots.get(id) {
            Some(Slot::Ready(image)) => Some(Arc::clone(image)),
            _ => None,
        }
    }

    /// Wait for a requested asset to finish loading.
    pub async fn wait(&mut self, id: &str) -> Result<Arc<AssetImage>, AssetError> {
        let slot = self
            .slots
            .get_mut(id)
            .ok_or_else(|| AssetError::NotRequested(id.to_string()))?;
        if let Slot::Loading(handle) = &mut *slot {
            let joined = handle.await;
            *slot = settle(id, joined);
        }
        match slot {
            Slot::Ready(image) => Ok(Arc::clone(image)),
            Slot::Failed(e) => Err(e.clone()),
            Slot::Loading(_) => Err(AssetError::LoadFailed {
                id: id.to_string(),
                reason: "load did not settle".to_string(),
            }),
        }
    }
}

fn settle(
    id: &str,
    joined: Result<Result<AssetImage, AssetError>, tokio::task::JoinError>,
) -> Slot {
    match joined {
        Ok(Ok(image)) => Slot::Ready(Arc::new(image)),
        Ok(Err(e)) => {
            log::warn!("{}", e);
            Slot::Failed(e)
        }
        Err(join_error) => {
            let e = AssetError::LoadFailed {
                id: id.to_string(),
                reason: format!("load task ended: {}", join_error),
            };
            log::warn!("{}", e);
            Slot::Failed(e)
        }
    }
}

impl Drop for AssetShelf {
    fn drop(&mut self) {
        for slot in self.slots.values() {
            if let Slot::Loading(handle) = slot {
                handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    fn write_png(dir: &TempDir, name: &str, w: u32, h: u32) -> String {
        let path = dir.path().join(name);
        RgbaImage::from_pixel(w, h, Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();
        path.display().to_string()
    }

    fn asset(id: &str, url: String) -> Arc<FrameAsset> {
        Arc::new(FrameAsset {
            id: id.to_string(),
            image_url: url,
            display_name: id.to_string(),
        })
    }

    #[tokio::test]
    async fn test_request_then_wait() {
        let dir = TempDir::new().unwrap();
        let mut shelf = AssetShelf::new(AssetLoader::new(None).unwrap());
        shelf.request(asset("a", write_png(&dir, "a.png", 60, 20)));

        let image = shelf.wait("a").await.unwrap();
        assert_eq!(image.aspect_ratio(), 3.0);
        assert_eq!(shelf.state("a"), Some(AssetState::Ready));
        assert!(shelf.ready("a").is_some());
    }

    #[tokio::test]
    async fn test_failed_load_is_recorded() {
        let mut shelf = AssetShelf::new(AssetLoader::new(None).unwrap());
        shelf.request(asset("missing", "/nope/missing.png".to_string()));

        assert!(shelf.wait("missing").await.is_err());
        assert!(matches!(shelf.state("missing"), Some(AssetState::Failed(_))));
        assert!(shelf.ready("missing").is_none());
    }

    #[tokio::test]
    async fn test_wait_unrequested() {
        let mut shelf = AssetShelf::new(AssetLoader::new(None).unwrap());
        assert_eq!(
            shelf.wait("ghost").await.unwrap_err(),
            AssetError::NotRequested("ghost".to_string())
        );
        assert_eq!(shelf.state("ghost"), None);
    }

    #[tokio::test]
    async fn test_poll_settles_finished_loads() {
        let dir = TempDir::new().unwrap();
        let mut shelf = AssetShelf::new(AssetLoader::new(None).unwrap());
        shelf.request(asset("b", write_png(&dir, "b.png", 10, 10)));
        assert_eq!(shelf.state("b"), Some(AssetState::Loading));

        for _ in 0..200 {
            shelf.poll();
            if shelf.state("b") != Some(AssetState::Loading) {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert_eq!(shelf.state("b"), Some(AssetState::Ready));
    }
}
