//! Camera device enumeration and sensor selection.

use nokhwa::query;
use nokhwa::utils::ApiBackend;

use super::types::{CameraInfo, CameraSettings, CaptureError, Facing};

/// List all camera devices on the system.
///
/// An empty list is not an error here; [`select_device`] decides that.
pub fn list_devices() -> Result<Vec<CameraInfo>, CaptureError> {
    let devices = query(ApiBackend::Auto)
        .map_err(|e| classify_backend_error(&e.to_string()))?;

    Ok(devices
        .into_iter()
        .map(|d| CameraInfo {
            index: d.index().as_index().unwrap_or(0),
            name: d.human_name(),
            description: d.description().to_string(),
        })
        .collect())
}

/// Pick the device index to open.
///
/// An explicit index must exist. Otherwise a front-facing sensor is preferred
/// when `facing` asks for one, falling back to the first listed device.
pub fn select_device(
    devices: &[CameraInfo],
    settings: &CameraSettings,
) -> Result<u32, CaptureError> {
    if devices.is_empty() {
        return Err(CaptureError::DeviceUnavailable(
            "no cameras found".to_string(),
        ));
    }

    if let Some(index) = settings.device_index {
        return devices
            .iter()
            .find(|d| d.index == index)
            .map(|d| d.index)
            .ok_or_else(|| {
                CaptureError::DeviceUnavailable(format!(
                    "camera {} not found, run 'list-cameras' to see available devices",
                    index
                ))
            });
    }

    let front = match settings.facing {
        Facing::Front => devices.iter().find(|d| d.looks_front_facing()),
        Facing::Any => None,
    };
    Ok(front.unwrap_or(&devices[0]).index)
}

/// Map a backend error message onto the two start failure kinds.
pub fn classify_backend_error(message: &str) -> CaptureError {
    let msg = message.to_lowercase();
    if msg.contains("permission")
        || msg.contains("denied")
        || msg.contains("authorization")
        || msg.contains("not authorized")
    {
        CaptureError::PermissionDenied
    } else {
        CaptureError::DeviceUnavailable(message.to_string())
    }
}
