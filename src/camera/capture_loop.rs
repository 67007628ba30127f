//! Background decode thread for the nokhwa backend.

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat as NokhwaFrameFormat, RequestedFormat,
    RequestedFormatType,
};
use nokhwa::Camera;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

use super::device::classify_backend_error;
use super::frame_utils::{convert_to_rgb, mirror_horizontal};
use super::types::{CameraSettings, CaptureError, Frame, Resolution};

/// How long `frame()` may fail without a single success before the camera
/// is treated as gone (unplugged, claimed by the OS).
const LOST_AFTER: Duration = Duration::from_secs(2);

/// Tracks an unbroken run of failed reads.
#[derive(Debug, Default)]
struct DecodeHealth {
    failing_since: Option<Instant>,
}

impl DecodeHealth {
    fn record_success(&mut self) {
        self.failing_since = None;
    }

    /// Returns true once reads have failed continuously for [`LOST_AFTER`].
    fn record_failure(&mut self, now: Instant) -> bool {
        let since = *self.failing_since.get_or_insert(now);
        now.duration_since(since) >= LOST_AFTER
    }
}

/// Open the camera and keep the newest decoded frame in `slot` until `stop`
/// is raised, or until reads keep failing and the device is considered lost.
/// Either way the slot is emptied and the thread ends, which the backend
/// reports through `is_open`.
///
/// The camera is created on this thread because `nokhwa::Camera` is not
/// `Send`. The outcome of opening is reported once through `ready`.
pub fn run_capture_loop(
    device_index: u32,
    settings: CameraSettings,
    slot: Arc<Mutex<Option<Frame>>>,
    stop: Arc<AtomicBool>,
    ready: oneshot::Sender<Result<Resolution, CaptureError>>,
) {
    let index = CameraIndex::Index(device_index);

    let mut camera = match open_camera_with_fallback(&index, &settings) {
        Ok(cam) => cam,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    if let Err(e) = camera.open_stream() {
        let _ = ready.send(Err(classify_backend_error(&e.to_string())));
        return;
    }

    let res = camera.resolution();
    let negotiated = Resolution {
        width: res.width(),
        height: res.height(),
    };
    log::debug!(
        "camera {} streaming at {} @ {} fps",
        device_index,
        negotiated,
        camera.frame_rate()
    );
    if ready.send(Ok(negotiated)).is_err() {
        // Requester went away before we finished opening.
        let _ = camera.stop_stream();
        return;
    }

    let mut health = DecodeHealth::default();
    while !stop.load(Ordering::Relaxed) {
        match camera.frame().ok().and_then(|raw| convert_to_rgb(&raw)) {
            Some(mut frame) => {
                health.record_success();
                if settings.mirror {
                    mirror_horizontal(&mut frame);
                }
                if let Ok(mut latest) = slot.lock() {
                    *latest = Some(frame);
                }
            }
            None if health.record_failure(Instant::now()) => {
                log::warn!(
                    "camera {} delivered no frames for {:?}, giving it up",
                    device_index,
                    LOST_AFTER
                );
                break;
            }
            None => {}
        }
        thread::sleep(Duration::from_millis(1));
    }

    let _ = camera.stop_stream();
    if let Ok(mut latest) = slot.lock() {
        *latest = None;
    }
}

/// Try NV12, then MJPEG at the requested size, then whatever the camera
/// offers at its highest resolution.
fn open_camera_with_fallback(
    index: &CameraIndex,
    settings: &CameraSettings,
) -> Result<Camera, CaptureError> {
    let wanted = nokhwa::utils::Resolution::new(
        settings.resolution.width,
        settings.resolution.height,
    );
    let attempts = [
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            wanted,
            NokhwaFrameFormat::NV12,
            settings.fps,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            wanted,
            NokhwaFrameFormat::MJPEG,
            settings.fps,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution),
    ];

    let mut last_error = String::from("no usable camera format");
    for requested in attempts {
        match Camera::new(index.clone(), requested) {
            Ok(cam) => return Ok(cam),
            Err(e) => last_error = e.to_string(),
        }
    }

    Err(classify_backend_error(&last_error))
}
