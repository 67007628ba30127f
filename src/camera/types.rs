//! Camera types and data structures.

use std::fmt;
use std::time::Instant;

/// Information about an available camera device.
#[derive(Debug, Clone)]
pub struct CameraInfo {
    /// Device index for selection
    pub index: u32,
    /// Human-readable device name
    pub name: String,
    /// Device description
    pub description: String,
}

impl CameraInfo {
    /// Whether the device name suggests a user-facing (selfie) sensor.
    pub fn looks_front_facing(&self) -> bool {
        const HINTS: &[&str] = &["front", "facetime", "user", "integrated"];
        let name = self.name.to_lowercase();
        let description = self.description.to_lowercase();
        HINTS
            .iter()
            .any(|hint| name.contains(hint) || description.contains(hint))
    }
}

impl fmt::Display for CameraInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.index, self.name, self.description)
    }
}

/// Camera resolution settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// 640x480, the try-on target resolution.
    pub const VGA: Resolution = Resolution {
        width: 640,
        height: 480,
    };
}

impl Default for Resolution {
    fn default() -> Self {
        Self::VGA
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A decoded camera frame in packed RGB.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw pixel data, 3 bytes per pixel, row-major
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// When the frame was decoded
    pub timestamp: Instant,
}

impl Frame {
    pub const BYTES_PER_PIXEL: usize = 3;

    /// Build a frame filled with a single color. Mostly useful for tests and
    /// synthetic backends.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * Self::BYTES_PER_PIXEL);
        for _ in 0..pixels {
            data.extend_from_slice(&rgb);
        }
        Self {
            data,
            width,
            height,
            timestamp: Instant::now(),
        }
    }

    pub fn resolution(&self) -> Resolution {
        Resolution {
            width: self.width,
            height: self.height,
        }
    }
}

/// Which sensor to prefer when no explicit device index is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    /// User-facing sensor (selfie)
    #[default]
    Front,
    /// Whatever the system lists first
    Any,
}

/// Settings for camera capture.
#[derive(Debug, Clone)]
pub struct CameraSettings {
    /// Explicit device index; `None` picks by `facing`
    pub device_index: Option<u32>,
    pub facing: Facing,
    /// Requested resolution (actual may differ)
    pub resolution: Resolution,
    /// Target FPS (actual may vary)
    pub fps: u32,
    /// Mirror horizontally (selfie mode)
    pub mirror: bool,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            device_index: None,
            facing: Facing::Front,
            resolution: Resolution::default(),
            fps: 30,
            mirror: true,
        }
    }
}

/// Why a capture session could not be started.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    #[error(
        "Camera permission denied. Grant camera access to this terminal in your system privacy settings and start again"
    )]
    PermissionDenied,

    #[error("Camera unavailable: {0}")]
    DeviceUnavailable(String),
}

/// Lifecycle state of a [`CaptureSession`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Requesting,
    Streaming,
    Stopped,
    Errored(CaptureError),
}

impl SessionState {
    pub fn is_streaming(&self) -> bool {
        matches!(self, SessionState::Streaming)
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Requesting => "requesting",
            SessionState::Streaming => "streaming",
            SessionState::Stopped => "stopped",
            SessionState::Errored(_) => "errored",
        }
    }
}

/// Snapshot of one camera acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSession {
    /// Monotonic id; a new `start()` always gets a fresh one
    pub id: u64,
    pub state: SessionState,
    /// Populated once streaming
    pub resolution: Option<Resolution>,
}

impl CaptureSession {
    pub fn frame_width(&self) -> Option<u32> {
        self.resolution.map(|r| r.width)
    }

    pub fn frame_height(&self) -> Option<u32> {
        self.resolution.map(|r| r.height)
    }

    /// Populated only in `Errored`.
    pub fn error_reason(&self) -> Option<&CaptureError> {
        match &self.state {
            SessionState::Errored(e) => Some(e),
            _ => None,
        }
    }
}
