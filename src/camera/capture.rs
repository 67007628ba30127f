//! Real webcam backend built on nokhwa.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tokio::sync::oneshot;

use super::backend::CameraBackend;
use super::capture_loop::run_capture_loop;
use super::device::{list_devices, select_device};
use super::types::{CameraSettings, CaptureError, Frame, Resolution};

/// Webcam backend.
///
/// Decoding runs on a dedicated thread which overwrites a single shared slot
/// with the newest frame. Readers on the render side only ever see that one
/// frame.
pub struct NokhwaBackend {
    latest: Arc<Mutex<Option<Frame>>>,
    capture_thread: Option<JoinHandle<()>>,
    stop_signal: Arc<AtomicBool>,
}

impl std::fmt::Debug for NokhwaBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NokhwaBackend")
            .field("is_open", &self.is_open())
            .finish_non_exhaustive()
    }
}

impl Default for NokhwaBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl NokhwaBackend {
    pub fn new() -> Self {
        Self {
            latest: Arc::new(Mutex::new(None)),
            capture_thread: None,
            stop_signal: Arc::new(AtomicBool::new(false)),
        }
    }

    fn join_thread(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        if let Some(handle) = self.capture_thread.take() {
            let _ = handle.join();
        }
    }
}

impl CameraBackend for NokhwaBackend {
    async fn open(&mut self, settings: &CameraSettings) -> Result<Resolution, CaptureError> {
        if self.is_open() {
            return Err(CaptureError::DeviceUnavailable(
                "device already claimed".to_string(),
            ));
        }

        let devices = list_devices()?;
        let device_index = select_device(&devices, settings)?;
        log::info!("opening camera {} at {}", device_index, settings.resolution);

        self.stop_signal.store(false, Ordering::SeqCst);
        let (ready_tx, ready_rx) = oneshot::channel();
        let slot = Arc::clone(&self.latest);
        let stop = Arc::clone(&self.stop_signal);
        let thread_settings = settings.clone();

        self.capture_thread = Some(std::thread::spawn(move || {
            run_capture_loop(device_index, thread_settings, slot, stop, ready_tx);
        }));

        match ready_rx.await {
            Ok(Ok(resolution)) => Ok(resolution),
            Ok(Err(e)) => {
                self.join_thread();
                Err(e)
            }
            Err(_) => {
                self.join_thread();
                Err(CaptureError::DeviceUnavailable(
                    "capture thread terminated unexpectedly".to_string(),
                ))
            }
        }
    }

    fn latest_frame(&self) -> Option<Frame> {
        self.latest.lock().ok()?.clone()
    }

    fn frame_size(&self) -> Option<(u32, u32)> {
        let latest = self.latest.lock().ok()?;
        latest.as_ref().map(|f| (f.width, f.height))
    }

    fn release(&mut self) {
        self.join_thread();
        if let Ok(mut latest) = self.latest.lock() {
            *latest = None;
        }
    }

    fn is_open(&self) -> bool {
        self.capture_thread
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for NokhwaBackend {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_without_open_is_noop() {
        let mut backend = NokhwaBackend::new();
        backend.release();
        backend.release();
        assert!(!backend.is_open());
        assert!(backend.latest_frame().is_none());
    }
}
