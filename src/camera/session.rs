//! Capture session lifecycle on top of a [`CameraBackend`].

use tokio::sync::watch;

use super::backend::CameraBackend;
use super::types::{CameraSettings, CaptureError, CaptureSession, Frame, SessionState};

/// Owns the camera and the single live [`CaptureSession`].
///
/// Session transitions are published on a watch channel so observers (the
/// render loop) can check, synchronously and at any time, whether the session
/// they were started for is still streaming.
pub struct CaptureDevice<B: CameraBackend> {
    backend: B,
    settings: CameraSettings,
    session: CaptureSession,
    status_tx: watch::Sender<CaptureSession>,
    next_id: u64,
}

impl<B: CameraBackend> std::fmt::Debug for CaptureDevice<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureDevice")
            .field("settings", &self.settings)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl<B: CameraBackend> CaptureDevice<B> {
    pub fn new(backend: B, settings: CameraSettings) -> Self {
        let session = CaptureSession {
            id: 0,
            state: SessionState::Idle,
            resolution: None,
        };
        let (status_tx, _) = watch::channel(session.clone());
        Self {
            backend,
            settings,
            session,
            status_tx,
            next_id: 1,
        }
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_streaming(&self) -> bool {
        self.session.state.is_streaming()
    }

    /// Acquire the camera and begin a new session.
    ///
    /// Any session that is still holding the device is stopped first, so two
    /// sessions never stream at once. Failures leave the new session in
    /// `Errored`; nothing is retried.
    pub async fn start(&mut self) -> Result<CaptureSession, CaptureError> {
        if self.holds_device() {
            log::info!(
                "session {} replaced by a new start, stopping it first",
                self.session.id
            );
            self.stop();
        }

        let id = self.next_id;
        self.next_id += 1;
        self.transition(CaptureSession {
            id,
            state: SessionState::Requesting,
            resolution: None,
        });

        match self.backend.open(&self.settings).await {
            Ok(resolution) => {
                log::info!("session {} streaming at {}", id, resolution);
                self.transition(CaptureSession {
                    id,
                    state: SessionState::Streaming,
                    resolution: Some(resolution),
                });
                Ok(self.session.clone())
            }
            Err(e) => {
                log::warn!("session {} failed to start: {}", id, e);
                self.transition(CaptureSession {
                    id,
                    state: SessionState::Errored(e.clone()),
                    resolution: None,
                });
                Err(e)
            }
        }
    }

    /// Release the camera. Safe to call in any state.
    pub fn stop(&mut self) {
        if matches!(self.session.state, SessionState::Idle | SessionState::Stopped) {
            return;
        }
        self.backend.release();
        log::info!("session {} stopped", self.session.id);
        self.transition(CaptureSession {
            id: self.session.id,
            state: SessionState::Stopped,
            resolution: self.session.resolution,
        });
    }

    /// End a streaming session whose backend stopped on its own, e.g. an
    /// unplugged camera. Returns whether the session is still streaming.
    pub fn check_connection(&mut self) -> bool {
        if self.is_streaming() && !self.backend.is_open() {
            let error =
                CaptureError::DeviceUnavailable("camera stopped delivering frames".to_string());
            log::warn!("session {} lost its camera", self.session.id);
            self.backend.release();
            self.transition(CaptureSession {
                id: self.session.id,
                state: SessionState::Errored(error),
                resolution: self.session.resolution,
            });
        }
        self.is_streaming()
    }

    /// Latest decoded frame while streaming.
    pub fn latest_frame(&self) -> Option<Frame> {
        if !self.is_streaming() {
            return None;
        }
        self.backend.latest_frame()
    }

    /// Size of the latest frame while streaming.
    pub fn frame_size(&self) -> Option<(u32, u32)> {
        if !self.is_streaming() {
            return None;
        }
        self.backend.frame_size()
    }

    /// Observer bound to the current session.
    pub fn watch(&self) -> SessionWatch {
        SessionWatch {
            session_id: self.session.id,
            rx: self.status_tx.subscribe(),
        }
    }

    fn holds_device(&self) -> bool {
        matches!(
            self.session.state,
            SessionState::Requesting | SessionState::Streaming
        ) || self.backend.is_open()
    }

    fn transition(&mut self, next: CaptureSession) {
        self.session = next;
        self.status_tx.send_replace(self.session.clone());
    }
}

impl<B: CameraBackend> Drop for CaptureDevice<B> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Read-only view of one particular session's liveness.
///
/// Becomes permanently "not streaming" once that session stops, errors, is
/// replaced by a newer session, or the device is dropped.
#[derive(Debug, Clone)]
pub struct SessionWatch {
    session_id: u64,
    rx: watch::Receiver<CaptureSession>,
}

impl SessionWatch {
    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    pub fn is_streaming(&self) -> bool {
        let current = self.rx.borrow();
        current.id == self.session_id && current.state.is_streaming()
    }

    /// Current published session, whichever it is.
    pub fn current(&self) -> CaptureSession {
        self.rx.borrow().clone()
    }

    /// Resolve once the watched session is no longer streaming.
    pub async fn ended(&mut self) {
        let id = self.session_id;
        // An Err here means the device was dropped, which also ends the session.
        let _ = self
            .rx
            .wait_for(|s| s.id != id || !s.state.is_streaming())
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::backend::SyntheticBackend;
    use crate::camera::types::Resolution;

    fn device() -> (CaptureDevice<SyntheticBackend>, SyntheticBackend) {
        let backend = SyntheticBackend::new(Resolution::VGA);
        let camera = backend.clone();
        (CaptureDevice::new(backend, CameraSettings::default()), camera)
    }

    #[tokio::test]
    async fn test_start_streams_and_reports_dimensions() {
        let (mut device, _) = device();
        assert_eq!(device.session().state, SessionState::Idle);

        let session = device.start().await.unwrap();
        assert_eq!(session.state, SessionState::Streaming);
        assert_eq!(session.frame_width(), Some(640));
        assert_eq!(session.frame_height(), Some(480));
        assert!(device.latest_frame().is_some());
    }

    #[tokio::test]
    async fn test_second_start_stops_first() {
        let (mut device, camera) = device();
        let first = device.start().await.unwrap();
        let first_watch = device.watch();
        let second = device.start().await.unwrap();

        assert_ne!(first.id, second.id);
        assert!(!first_watch.is_streaming());
        assert!(device.watch().is_streaming());
        assert_eq!(camera.open_count(), 2);
        assert_eq!(camera.release_count(), 1);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let (mut device, camera) = device();
        device.stop();
        assert_eq!(device.session().state, SessionState::Idle);

        device.start().await.unwrap();
        device.stop();
        device.stop();
        assert_eq!(device.session().state, SessionState::Stopped);
        assert_eq!(camera.release_count(), 1);
        assert!(device.latest_frame().is_none());
    }

    #[tokio::test]
    async fn test_permission_denied_marks_errored() {
        let backend = SyntheticBackend::failing(CaptureError::PermissionDenied);
        let mut device = CaptureDevice::new(backend, CameraSettings::default());

        let err = device.start().await.unwrap_err();
        assert_eq!(err, CaptureError::PermissionDenied);
        assert_eq!(
            device.session().error_reason(),
            Some(&CaptureError::PermissionDenied)
        );

        device.stop();
        assert_eq!(device.session().state, SessionState::Stopped);
    }

    #[tokio::test]
    async fn test_lost_camera_ends_session_as_errored() {
        let (mut device, camera) = device();
        device.start().await.unwrap();
        let mut watch = device.watch();
        assert!(device.check_connection());

        camera.disconnect();
        assert!(!device.check_connection());
        assert!(matches!(
            device.session().error_reason(),
            Some(CaptureError::DeviceUnavailable(_))
        ));
        assert!(device.latest_frame().is_none());
        watch.ended().await;

        // The device can be started again afterwards
        device.start().await.unwrap();
        assert!(device.check_connection());
    }

    #[tokio::test]
    async fn test_watch_ended_resolves_on_stop() {
        let (mut device, _) = device();
        device.start().await.unwrap();
        let mut watch = device.watch();
        device.stop();
        watch.ended().await;
        assert!(!watch.is_streaming());
        assert_eq!(watch.current().state, SessionState::Stopped);
    }
}
