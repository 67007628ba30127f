//! Async event loop for the interactive try-on session.
//!
//! Three concurrent concerns, one task:
//! 1. Terminal events (keys, resize) via crossterm `EventStream`
//! 2. The render tick, standing in for the display refresh
//! 3. The capture session ending underneath us

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;

use crate::camera::{CameraBackend, SessionWatch};
use crate::export::{Delivery, ExportSink};
use crate::input::{control_for_key, Control};
use crate::landmarks::LandmarkEstimator;
use crate::preview::{PreviewSink, PreviewUpdate, TerminalPreview};
use crate::render::TickTimer;
use crate::tryon::{TryOnError, TryOnSession};

/// First status line notice, until an action replaces it.
const KEY_HINT: &str =
    "arrows move, +/- scale, r reset, n/p frame, space capture, d/s/x photo, c camera, q quit";

/// What applying a control asks of the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Continue and show this message on the status line
    Notice(String),
    Quit,
}

/// Apply one control to the session.
///
/// Failures of individual actions are reported as notices; they never end the
/// session.
pub async fn apply_control<B, S, E>(session: &mut TryOnSession<B, S, E>, control: Control) -> Flow
where
    B: CameraBackend,
    S: ExportSink,
    E: LandmarkEstimator,
{
    match control {
        Control::Nudge(direction) => session.nudge(direction),
        Control::Scale(steps) => session.step_scale(steps),
        Control::Reset => session.reset_adjustment(),
        Control::NextAsset => session.next_asset(),
        Control::PreviousAsset => session.previous_asset(),
        Control::Capture => {
            return match session.capture().await {
                Ok(_) => Flow::Notice("captured".to_string()),
                Err(e) => failure("capture", e),
            };
        }
        Control::Download => {
            return match session.download() {
                Ok(path) => Flow::Notice(format!("saved {}", path.display())),
                Err(e) => failure("download", e),
            };
        }
        Control::Share => {
            return match session.share() {
                Ok(Delivery::Shared) => Flow::Notice("shared".to_string()),
                Ok(Delivery::Saved(path)) => {
                    Flow::Notice(format!("sharing unavailable, saved {}", path.display()))
                }
                Err(e) => failure("share", e),
            };
        }
        Control::Discard => {
            session.discard_photo();
            return Flow::Notice("photo discarded".to_string());
        }
        Control::ToggleCamera => {
            if session.session().state.is_streaming() {
                session.stop_camera();
                return Flow::Notice("camera off".to_string());
            }
            return match session.start_camera().await {
                Ok(_) => Flow::Notice("camera on".to_string()),
                Err(e) => failure("camera", TryOnError::Capture(e)),
            };
        }
        Control::Quit => return Flow::Quit,
    }
    Flow::Continue
}

fn failure(action: &str, e: TryOnError) -> Flow {
    log::warn!("{} failed: {}", action, e);
    Flow::Notice(format!("{} failed: {}", action, e))
}

/// Run the interactive session until the user quits or the terminal closes.
pub async fn run<B, S, E>(
    session: &mut TryOnSession<B, S, E>,
    preview: &mut TerminalPreview<std::io::Stdout>,
    render_fps: u32,
) -> Result<(), std::io::Error>
where
    B: CameraBackend,
    S: ExportSink,
    E: LandmarkEstimator,
{
    let mut event_stream = EventStream::new();
    let mut timer = TickTimer::new(render_fps);
    let mut watch: SessionWatch = session.device().watch();
    let mut notice: Option<String> = Some(KEY_HINT.to_string());

    loop {
        let live = watch.is_streaming();

        tokio::select! {
            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        let Some(control) = control_for_key(key_event) else {
                            continue;
                        };
                        match apply_control(session, control).await {
                            Flow::Quit => break,
                            Flow::Notice(message) => notice = Some(message),
                            Flow::Continue => {}
                        }
                        // A camera toggle replaces the session we watch
                        watch = session.device().watch();
                    }
                    Some(Ok(Event::Resize(cols, rows))) => preview.resize(cols, rows),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e),
                    None => break,
                }
            }

            _ = timer.tick() => {
                let outcome = session.tick();
                let frame = session.device().latest_frame();
                let frame_size = frame.as_ref().map(|f| (f.width, f.height));
                let selected = session.selected_asset().cloned();
                let image = session.ready_asset();
                let display_placement = preview.project(frame_size, &outcome);
                let update = PreviewUpdate {
                    outcome: &outcome,
                    frame: frame.as_ref(),
                    frame_size,
                    display_placement,
                    asset: image.as_deref(),
                    camera: session.session().state.name(),
                    asset_name: selected.as_ref().map(|a| a.display_name.as_str()),
                    asset_state: session.selected_state(),
                    delta: session.adjustment(),
                    has_photo: session.photo().is_some(),
                    notice: notice.as_deref(),
                };
                preview.present(&update)?;
            }

            _ = watch.ended(), if live => {
                log::info!("session {} ended", watch.session_id());
            }
        }
    }

    Ok(())
}
