//! The seam between the session lifecycle and an actual frame source.

use std::cell::Cell;
use std::rc::Rc;

use super::types::{CameraSettings, CaptureError, Frame, Resolution};

/// A source of decoded camera frames.
///
/// Implementations hold the device exclusively between `open` and `release`
/// and expose only the most recent frame; nothing is buffered.
#[allow(async_fn_in_trait)]
pub trait CameraBackend {
    /// Acquire the device and start delivering frames.
    ///
    /// Resolves with the resolution the device actually negotiated.
    async fn open(&mut self, settings: &CameraSettings) -> Result<Resolution, CaptureError>;

    /// Latest decoded frame, if any has arrived yet.
    fn latest_frame(&self) -> Option<Frame>;

    /// Size of the latest frame without copying its pixels.
    fn frame_size(&self) -> Option<(u32, u32)> {
        self.latest_frame().map(|f| (f.width, f.height))
    }

    /// Stop delivering frames and give the device back. Idempotent.
    fn release(&mut self);

    fn is_open(&self) -> bool;
}

/// In-process backend that produces solid frames of a fixed size.
///
/// Used by the headless `--synthetic` mode and by tests. Counters are shared
/// through `Rc` so a test can keep observing them after handing the backend
/// to a `CaptureDevice`.
#[derive(Debug, Clone)]
pub struct SyntheticBackend {
    outcome: Result<Resolution, CaptureError>,
    color: [u8; 3],
    open: Rc<Cell<bool>>,
    opens: Rc<Cell<u32>>,
    releases: Rc<Cell<u32>>,
}

impl SyntheticBackend {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            outcome: Ok(resolution),
            color: [96, 96, 96],
            open: Rc::new(Cell::new(false)),
            opens: Rc::new(Cell::new(0)),
            releases: Rc::new(Cell::new(0)),
        }
    }

    /// A backend whose `open` always fails with `error`.
    pub fn failing(error: CaptureError) -> Self {
        Self {
            outcome: Err(error),
            ..Self::new(Resolution::default())
        }
    }

    pub fn with_color(mut self, rgb: [u8; 3]) -> Self {
        self.color = rgb;
        self
    }

    /// Drop the device out from under the session, as an unplugged camera
    /// would. Does not count as a release.
    pub fn disconnect(&self) {
        self.open.set(false);
    }

    pub fn open_count(&self) -> u32 {
        self.opens.get()
    }

    pub fn release_count(&self) -> u32 {
        self.releases.get()
    }
}

impl CameraBackend for SyntheticBackend {
    async fn open(&mut self, _settings: &CameraSettings) -> Result<Resolution, CaptureError> {
        if self.open.get() {
            return Err(CaptureError::DeviceUnavailable(
                "device already claimed".to_string(),
            ));
        }
        let resolution = self.outcome.clone()?;
        self.open.set(true);
        self.opens.set(self.opens.get() + 1);
        Ok(resolution)
    }

    fn latest_frame(&self) -> Option<Frame> {
        if !self.open.get() {
            return None;
        }
        let resolution = self.outcome.as_ref().ok()?;
        Some(Frame::solid(resolution.width, resolution.height, self.color))
    }

    fn frame_size(&self) -> Option<(u32, u32)> {
        if !self.open.get() {
            return None;
        }
        let resolution = self.outcome.as_ref().ok()?;
        Some((resolution.width, resolution.height))
    }

    fn release(&mut self) {
        if self.open.replace(false) {
            self.releases.set(self.releases.get() + 1);
        }
    }

    fn is_open(&self) -> bool {
        self.open.get()
    }
}
