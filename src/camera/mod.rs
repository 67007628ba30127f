//! Camera capture: device enumeration, backends and the session lifecycle.
//!
//! - Device enumeration via [`list_devices`]
//! - Frame sources behind [`CameraBackend`] ([`NokhwaBackend`] for real
//!   webcams, [`SyntheticBackend`] for headless runs)
//! - Exclusive session ownership via [`CaptureDevice`]

mod backend;
mod capture;
mod capture_loop;
mod device;
mod frame_utils;
mod session;
mod types;

pub use backend::{CameraBackend, SyntheticBackend};
pub use capture::NokhwaBackend;
pub use device::{list_devices, select_device};
pub use frame_utils::mirror_horizontal;
pub use session::{CaptureDevice, SessionWatch};
pub use types::{
    CameraInfo, CameraSettings, CaptureError, CaptureSession, Facing, Frame, Resolution,
    SessionState,
};
