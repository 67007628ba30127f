//! End-to-end try-on flow over the in-process camera and a local catalog.

use image::{Rgba, RgbaImage};
use tempfile::TempDir;

use tryon_overlay::camera::{Resolution, SessionState, SyntheticBackend};
use tryon_overlay::cli;
use tryon_overlay::config::Config;
use tryon_overlay::event_loop::{apply_control, Flow};
use tryon_overlay::export::DiskExportSink;
use tryon_overlay::input::Control;
use tryon_overlay::overlay::{Direction, OverlayPlacement};
use tryon_overlay::render::TickOutcome;
use tryon_overlay::tryon::{TryOnError, TryOnSession};

const BLUE: [u8; 3] = [0, 0, 255];
const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// Writes a 200x100 red frame plus a manifest listing it (and a second,
/// missing one) and returns a config pointing at them.
fn fixture(dir: &TempDir) -> Config {
    let frames = dir.path().join("frames");
    std::fs::create_dir_all(&frames).unwrap();
    RgbaImage::from_pixel(200, 100, RED)
        .save(frames.join("red.png"))
        .unwrap();
    let manifest = serde_json::json!([
        { "id": "red", "image_url": "red.png", "display_name": "Red Frame" },
        { "id": "gone", "image_url": "gone.png", "display_name": "Missing Frame" }
    ]);
    std::fs::write(frames.join("frames.json"), manifest.to_string()).unwrap();

    let mut config = Config::default();
    config.catalog.path = Some(frames.join("frames.json"));
    config.catalog.cache_dir = Some(dir.path().join("cache"));
    config.export.dir = Some(dir.path().join("photos"));
    config
}

async fn session(config: &Config) -> TryOnSession<SyntheticBackend, DiskExportSink> {
    let backend = SyntheticBackend::new(Resolution::VGA).with_color(BLUE);
    let mut session = cli::build_session(config, backend).unwrap();
    session.set_catalog(cli::load_catalog(config).await.unwrap());
    session
}

/// Tick until the selected frame has loaded and been placed.
async fn placed(session: &mut TryOnSession<SyntheticBackend, DiskExportSink>) -> OverlayPlacement {
    for _ in 0..200 {
        if let TickOutcome::Placed(placement) = session.tick() {
            return placement;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    panic!("overlay never placed");
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[tokio::test]
async fn test_overlay_placed_over_eye_line_and_captured_where_shown() {
    let dir = TempDir::new().unwrap();
    let config = fixture(&dir);
    let mut session = session(&config).await;

    let camera = session.start_camera().await.unwrap();
    assert_eq!(camera.state, SessionState::Streaming);

    let placement = placed(&mut session).await;
    assert!(approx(placement.x, 224.0));
    assert!(approx(placement.y, 158.4));
    assert!(approx(placement.width, 192.0));
    assert!(approx(placement.height, 96.0));

    let photo = session.capture().await.unwrap();
    assert_eq!(photo.raster().dimensions(), (640, 480));
    let photo = photo.clone();
    // The capture-time tick reproduced the preview's placement
    assert_eq!(
        session.render_loop().last_published().unwrap().placement,
        Some(placement)
    );
    assert_eq!(photo.frame_name(), Some("Red Frame"));
    assert_eq!(*photo.raster().get_pixel(320, 200), RED);
    assert_eq!(*photo.raster().get_pixel(10, 10), Rgba([0, 0, 255, 255]));
    assert_eq!(*photo.raster().get_pixel(220, 200), Rgba([0, 0, 255, 255]));
}

#[tokio::test]
async fn test_manual_adjustment_moves_capture() {
    let dir = TempDir::new().unwrap();
    let config = fixture(&dir);
    let mut session = session(&config).await;
    session.start_camera().await.unwrap();

    session.nudge(Direction::Right);
    session.nudge(Direction::Right);
    session.set_scale(1.5);

    let placement = placed(&mut session).await;
    assert!(approx(placement.x, 196.0));
    assert!(approx(placement.y, 136.8));
    assert!(approx(placement.width, 288.0));
    assert!(approx(placement.height, 144.0));

    let photo = session.capture().await.unwrap();
    assert_eq!(*photo.raster().get_pixel(200, 140), RED);
    assert_eq!(*photo.raster().get_pixel(190, 140), Rgba([0, 0, 255, 255]));
}

#[tokio::test]
async fn test_stopped_session_halts_render_loop() {
    let dir = TempDir::new().unwrap();
    let config = fixture(&dir);
    let mut session = session(&config).await;
    session.start_camera().await.unwrap();
    placed(&mut session).await;
    let ticks_before = session.render_loop().tick_count();

    session.stop_camera();
    assert_eq!(session.tick(), TickOutcome::Halted);
    assert_eq!(session.render_loop().tick_count(), ticks_before);
    assert!(matches!(
        session.capture().await,
        Err(TryOnError::NotStreaming)
    ));

    let restarted = session.start_camera().await.unwrap();
    assert_eq!(restarted.id, 2);
    assert!(matches!(session.tick(), TickOutcome::Placed(_)));
}

#[tokio::test]
async fn test_unplugged_camera_halts_render_loop() {
    let dir = TempDir::new().unwrap();
    let config = fixture(&dir);
    let mut session = session(&config).await;
    session.start_camera().await.unwrap();
    placed(&mut session).await;

    session.device().backend().clone().disconnect();
    assert_eq!(session.tick(), TickOutcome::Halted);
    assert_eq!(session.session().state.name(), "errored");
    assert!(matches!(
        session.capture().await,
        Err(TryOnError::NotStreaming)
    ));
}

#[tokio::test]
async fn test_restart_keeps_single_session() {
    let dir = TempDir::new().unwrap();
    let config = fixture(&dir);
    let mut session = session(&config).await;

    session.start_camera().await.unwrap();
    let first_watch = session.device().watch();
    session.start_camera().await.unwrap();

    assert!(!first_watch.is_streaming());
    assert!(session.device().watch().is_streaming());
    assert_eq!(session.device().backend().open_count(), 2);
    assert_eq!(session.device().backend().release_count(), 1);
}

#[tokio::test]
async fn test_missing_frame_captures_base_only() {
    let dir = TempDir::new().unwrap();
    let config = fixture(&dir);
    let mut session = session(&config).await;
    session.start_camera().await.unwrap();

    session.next_asset();
    assert_eq!(session.selected_asset().unwrap().id, "gone");

    let photo = session.capture().await.unwrap();
    assert!(photo.frame_name().is_none());
    assert_eq!(*photo.raster().get_pixel(320, 200), Rgba([0, 0, 255, 255]));
}

#[tokio::test]
async fn test_controls_capture_share_fallback_and_discard() {
    let dir = TempDir::new().unwrap();
    let config = fixture(&dir);
    let mut session = session(&config).await;
    session.start_camera().await.unwrap();

    assert!(matches!(
        apply_control(&mut session, Control::Download).await,
        Flow::Notice(message) if message.contains("download failed")
    ));

    assert_eq!(
        apply_control(&mut session, Control::Capture).await,
        Flow::Notice("captured".to_string())
    );
    assert!(session.photo().is_some());

    // No share command configured: the photo is saved instead
    let flow = apply_control(&mut session, Control::Share).await;
    assert!(matches!(&flow, Flow::Notice(m) if m.starts_with("sharing unavailable, saved")));

    apply_control(&mut session, Control::Download).await;
    let saved: Vec<_> = std::fs::read_dir(dir.path().join("photos"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(saved.len(), 2);
    assert!(saved
        .iter()
        .all(|p| p.file_name().unwrap().to_string_lossy().starts_with("tryon-")));

    apply_control(&mut session, Control::Discard).await;
    assert!(session.photo().is_none());

    assert_eq!(apply_control(&mut session, Control::ToggleCamera).await, Flow::Notice("camera off".to_string()));
    assert!(!session.session().state.is_streaming());
    assert_eq!(apply_control(&mut session, Control::Quit).await, Flow::Quit);
}

#[tokio::test]
async fn test_snapshot_saves_photo() {
    let dir = TempDir::new().unwrap();
    let mut config = fixture(&dir);
    config.render.fps = 200;

    let backend = SyntheticBackend::new(Resolution::VGA).with_color(BLUE);
    let path = cli::run_snapshot(&config, backend, Some("red"), 3).await.unwrap();

    let photo = image::open(&path).unwrap().to_rgba8();
    assert_eq!(photo.dimensions(), (640, 480));
    assert_eq!(*photo.get_pixel(320, 200), RED);
}

#[tokio::test]
async fn test_snapshot_unknown_frame() {
    let dir = TempDir::new().unwrap();
    let config = fixture(&dir);
    let backend = SyntheticBackend::new(Resolution::VGA);
    let result = cli::run_snapshot(&config, backend, Some("nope"), 1).await;
    assert!(matches!(result, Err(cli::CommandError::UnknownFrame(id)) if id == "nope"));
}
