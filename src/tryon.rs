//! A try-on session: the camera, the selected frame, the user's adjustments
//! and the last captured photo, driven by the user-facing controls.
//!
//! All of it is process-local and dies with the session.

use std::path::PathBuf;
use std::sync::Arc;

use crate::camera::{CameraBackend, CaptureDevice, CaptureError, CaptureSession};
use crate::catalog::{AssetImage, AssetShelf, AssetState, FrameAsset};
use crate::compositor::{CapturedPhoto, CompositeError, Compositor};
use crate::export::{Delivery, ExportAdapter, ExportError, ExportSink, ShareError};
use crate::landmarks::{HeuristicEstimator, LandmarkEstimator};
use crate::overlay::{AdjustmentController, AdjustmentDelta, Direction};
use crate::render::{RenderLoop, TickInput, TickOutcome};

#[derive(Debug, thiserror::Error)]
pub enum TryOnError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("Camera is not streaming")]
    NotStreaming,

    #[error("No camera frame available yet")]
    NoFrame,

    #[error("No captured photo")]
    NoPhoto,

    #[error(transparent)]
    Composite(#[from] CompositeError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Share(#[from] ShareError),
}

pub struct TryOnSession<B, S, E = HeuristicEstimator>
where
    B: CameraBackend,
    S: ExportSink,
    E: LandmarkEstimator,
{
    device: CaptureDevice<B>,
    render: RenderLoop<E>,
    shelf: AssetShelf,
    adjustments: AdjustmentController,
    compositor: Compositor,
    export: ExportAdapter<S>,
    assets: Vec<Arc<FrameAsset>>,
    selected: Option<usize>,
    photo: Option<CapturedPhoto>,
}

impl<B, S, E> std::fmt::Debug for TryOnSession<B, S, E>
where
    B: CameraBackend,
    S: ExportSink,
    E: LandmarkEstimator,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TryOnSession")
            .field("session", self.device.session())
            .field("assets", &self.assets.len())
            .field("selected", &self.selected)
            .field("adjustment", &self.adjustments.delta())
            .field("has_photo", &self.photo.is_some())
            .finish_non_exhaustive()
    }
}

impl<B, S, E> TryOnSession<B, S, E>
where
    B: CameraBackend,
    S: ExportSink,
    E: LandmarkEstimator,
{
    pub fn new(
        device: CaptureDevice<B>,
        render: RenderLoop<E>,
        shelf: AssetShelf,
        adjustments: AdjustmentController,
        export: ExportAdapter<S>,
    ) -> Self {
        Self {
            device,
            render,
            shelf,
            adjustments,
            compositor: Compositor::default(),
            export,
            assets: Vec::new(),
            selected: None,
            photo: None,
        }
    }

    // ---- catalog / selection ----

    /// Cache the catalog listing for this session and select its first entry.
    pub fn set_catalog(&mut self, assets: Vec<FrameAsset>) {
        self.assets = assets.into_iter().map(Arc::new).collect();
        self.selected = None;
        if !self.assets.is_empty() {
            self.select(0);
        }
    }

    pub fn assets(&self) -> &[Arc<FrameAsset>] {
        &self.assets
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_asset(&self) -> Option<&Arc<FrameAsset>> {
        self.selected.and_then(|i| self.assets.get(i))
    }

    /// Load state of the selected asset's image.
    pub fn selected_state(&self) -> Option<AssetState> {
        self.selected_asset()
            .and_then(|asset| self.shelf.state(&asset.id))
    }

    /// Select by position in the catalog. Choosing a different asset resets
    /// the manual adjustment.
    pub fn select(&mut self, index: usize) {
        let Some(asset) = self.assets.get(index).cloned() else {
            return;
        };
        if self.selected != Some(index) {
            self.adjustments.reset();
            log::info!("selected frame '{}'", asset.display_name);
        }
        self.selected = Some(index);
        self.shelf.request(asset);
    }

    pub fn next_asset(&mut self) {
        if let Some(index) = self.cycled(1) {
            self.select(index);
        }
    }

    pub fn previous_asset(&mut self) {
        if let Some(index) = self.cycled(-1) {
            self.select(index);
        }
    }

    fn cycled(&self, step: isize) -> Option<usize> {
        let len = self.assets.len() as isize;
        if len == 0 {
            return None;
        }
        let next = match self.selected {
            Some(i) => (i as isize + step).rem_euclid(len),
            None if step < 0 => len - 1,
            None => 0,
        };
        Some(next as usize)
    }

    // ---- manual adjustment ----

    pub fn adjustment(&self) -> AdjustmentDelta {
        self.adjustments.delta()
    }

    pub fn nudge(&mut self, direction: Direction) {
        self.adjustments.nudge_once(direction);
    }

    pub fn set_scale(&mut self, value: f64) {
        self.adjustments.set_scale(value);
    }

    pub fn step_scale(&mut self, steps: i32) {
        self.adjustments.step_scale(steps);
    }

    pub fn reset_adjustment(&mut self) {
        self.adjustments.reset();
    }

    // ---- camera / render loop ----

    pub fn session(&self) -> &CaptureSession {
        self.device.session()
    }

    pub fn device(&self) -> &CaptureDevice<B> {
        &self.device
    }

    pub fn render_loop(&self) -> &RenderLoop<E> {
        &self.render
    }

    /// Start (or restart) the camera and the render loop bound to it.
    pub async fn start_camera(&mut self) -> Result<CaptureSession, CaptureError> {
        self.render.stop();
        let session = self.device.start().await?;
        self.render.start(self.device.watch());
        Ok(session)
    }

    pub fn stop_camera(&mut self) {
        self.device.stop();
        self.render.stop();
    }

    /// One render tick with the current selection and adjustment.
    pub fn tick(&mut self) -> TickOutcome {
        self.device.check_connection();
        self.shelf.poll();
        let asset = self.ready_asset();
        self.render.tick(TickInput {
            frame_size: self.device.frame_size(),
            asset: asset.as_deref(),
            delta: self.adjustments.delta(),
        })
    }

    /// Decoded image of the selected frame, once it has loaded.
    pub fn ready_asset(&self) -> Option<Arc<AssetImage>> {
        self.selected_asset()
            .and_then(|asset| self.shelf.ready(&asset.id))
    }

    // ---- capture / export ----

    /// Freeze the current frame with the overlay drawn where the preview
    /// shows it.
    ///
    /// Waits for the selected frame image if it is still loading. If it failed
    /// to load, the photo is taken without it.
    pub async fn capture(&mut self) -> Result<&CapturedPhoto, TryOnError> {
        if !self.device.check_connection() {
            return Err(TryOnError::NotStreaming);
        }

        let asset = match self.selected_asset().cloned() {
            Some(selected) => match self.shelf.wait(&selected.id).await {
                Ok(image) => Some(image),
                Err(e) => {
                    log::warn!("capturing without overlay: {}", e);
                    None
                }
            },
            None => None,
        };

        let frame = self.device.latest_frame().ok_or(TryOnError::NoFrame)?;
        let outcome = self.render.tick(TickInput {
            frame_size: Some((frame.width, frame.height)),
            asset: asset.as_deref(),
            delta: self.adjustments.delta(),
        });
        let placement = match outcome {
            TickOutcome::Halted => return Err(TryOnError::NotStreaming),
            TickOutcome::Placed(p) => Some(p),
            _ => None,
        };

        let photo = self
            .compositor
            .capture(&frame, asset.as_deref(), placement.as_ref())?;
        log::info!(
            "captured {}x{} photo{}",
            photo.raster().width(),
            photo.raster().height(),
            photo
                .frame_name()
                .map(|n| format!(" with '{}'", n))
                .unwrap_or_default()
        );
        Ok(&*self.photo.insert(photo))
    }

    pub fn photo(&self) -> Option<&CapturedPhoto> {
        self.photo.as_ref()
    }

    pub fn discard_photo(&mut self) {
        self.photo = None;
    }

    pub fn download(&self) -> Result<PathBuf, TryOnError> {
        let photo = self.photo.as_ref().ok_or(TryOnError::NoPhoto)?;
        Ok(self.export.download(photo)?)
    }

    /// Share the photo, saving it instead when sharing is unsupported.
    pub fn share(&self) -> Result<Delivery, TryOnError> {
        let photo = self.photo.as_ref().ok_or(TryOnError::NoPhoto)?;
        Ok(self.export.share_or_download(photo)?)
    }

    /// Release the camera and drop all session state.
    pub fn teardown(mut self) {
        self.stop_camera();
        log::debug!("try-on session torn down");
    }
}
