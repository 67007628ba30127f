//! Subcommand handlers and session wiring.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use super::args::{CacheAction, ConfigAction};
use crate::camera::{self, CameraBackend, CaptureDevice, CaptureError};
use crate::catalog::{
    AssetCache, AssetLoader, AssetShelf, Catalog, CatalogError, CatalogSource, FileCatalog,
    FrameAsset, HttpCatalog,
};
use crate::config::{self, Config, ConfigError};
use crate::event_loop;
use crate::export::{DiskExportSink, ExportAdapter};
use crate::landmarks::HeuristicEstimator;
use crate::overlay::{AdjustmentController, OverlayPositioner};
use crate::preview::{LogPreview, PreviewSink, PreviewUpdate, TerminalPreview};
use crate::render::{RenderLoop, TickTimer};
use crate::terminal::ScreenGuard;
use crate::tryon::{TryOnError, TryOnSession};

/// Set by the Ctrl+C handler; checked between snapshot ticks.
static CTRLC_RECEIVED: AtomicBool = AtomicBool::new(false);

pub fn setup_ctrlc_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        CTRLC_RECEIVED.store(true, Ordering::SeqCst);
        eprintln!("\nReceived Ctrl+C, shutting down...");
    })
}

pub fn ctrlc_received() -> bool {
    CTRLC_RECEIVED.load(Ordering::SeqCst)
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Camera(#[from] CaptureError),

    #[error(transparent)]
    TryOn(#[from] TryOnError),

    #[error("Failed to create HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("No frame with id '{0}' in the catalog")]
    UnknownFrame(String),

    #[error("Interrupted")]
    Interrupted,
}

/// List available cameras and print them to stdout.
pub fn list_cameras() -> Result<(), CaptureError> {
    let devices = camera::list_devices()?;
    if devices.is_empty() {
        println!("No cameras found.");
        println!();
        println!("Make sure your camera is connected and permissions are granted.");
        println!("On macOS, grant access in System Settings > Privacy & Security > Camera.");
    } else {
        println!("Available cameras:");
        for device in devices {
            let marker = if device.looks_front_facing() { " (front)" } else { "" };
            println!("  {}{}", device, marker);
        }
        println!();
        println!("Use --camera <index> to select a camera.");
    }
    Ok(())
}

/// Handle config subcommand actions.
pub fn handle_config_action(
    action: ConfigAction,
    config: &Config,
    config_path: &Path,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Show => {
            if config_path.exists() {
                println!("# Config file: {} (exists)", config_path.display());
            } else {
                println!("# Config file: {} (not found)", config_path.display());
            }
            println!();
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Init => {
            config::write_default(config_path)?;
            println!("Created config file: {}", config_path.display());
        }
    }
    Ok(())
}

/// The frame image cache the configuration points at.
pub fn asset_cache(config: &Config) -> AssetCache {
    config
        .catalog
        .cache_dir
        .clone()
        .map(AssetCache::new)
        .unwrap_or_else(AssetCache::with_default_dir)
}

/// Handle cache subcommand actions.
pub fn handle_cache_action(action: CacheAction, config: &Config) -> Result<(), CommandError> {
    let cache = asset_cache(config);
    match action {
        CacheAction::Path => println!("{}", cache.cache_dir().display()),
        CacheAction::Clear => {
            let removed = cache.clear()?;
            println!(
                "Removed {} cached frame image(s) from {}",
                removed,
                cache.cache_dir().display()
            );
        }
    }
    Ok(())
}

/// The catalog the configuration points at.
pub fn build_catalog(config: &Config) -> Result<Catalog, CatalogError> {
    if let Some(url) = &config.catalog.url {
        return Ok(Catalog::Http(HttpCatalog::new(url.clone())?));
    }
    if let Some(path) = &config.catalog.path {
        return Ok(Catalog::File(FileCatalog::new(path.clone())));
    }
    Err(CatalogError::NotConfigured)
}

pub async fn load_catalog(config: &Config) -> Result<Vec<FrameAsset>, CatalogError> {
    let catalog = build_catalog(config)?;
    catalog.list_frame_assets(config.catalog.limit).await
}

pub async fn print_catalog(config: &Config) -> Result<(), CommandError> {
    let assets = load_catalog(config).await?;
    if assets.is_empty() {
        println!("The catalog is empty.");
        return Ok(());
    }
    println!("Frames:");
    for asset in assets {
        println!("  {:<16} {}", asset.id, asset.display_name);
    }
    Ok(())
}

/// Wire a try-on session from configuration around `backend`.
pub fn build_session<B: CameraBackend>(
    config: &Config,
    backend: B,
) -> Result<TryOnSession<B, DiskExportSink>, CommandError> {
    let cache = asset_cache(config);
    let export_dir = config
        .export
        .dir
        .clone()
        .unwrap_or_else(DiskExportSink::default_dir);

    Ok(TryOnSession::new(
        CaptureDevice::new(backend, config.camera_settings()),
        RenderLoop::new(
            HeuristicEstimator::new(config.calibration.framing),
            OverlayPositioner::new(config.calibration.placement),
        ),
        AssetShelf::new(AssetLoader::new(Some(cache))?),
        AdjustmentController::new(config.controls.nudge_step, config.controls.scale_step),
        ExportAdapter::new(DiskExportSink::new(
            export_dir,
            config.export.share_command.clone(),
        )),
    ))
}

/// Select the asset with `id`, or fail if the catalog has none.
fn select_by_id<B: CameraBackend>(
    session: &mut TryOnSession<B, DiskExportSink>,
    id: &str,
) -> Result<(), CommandError> {
    let index = session
        .assets()
        .iter()
        .position(|a| a.id == id)
        .ok_or_else(|| CommandError::UnknownFrame(id.to_string()))?;
    session.select(index);
    Ok(())
}

/// Headless capture: returns where the photo was saved.
pub async fn run_snapshot<B: CameraBackend>(
    config: &Config,
    backend: B,
    frame: Option<&str>,
    ticks: u32,
) -> Result<PathBuf, CommandError> {
    let mut session = build_session(config, backend)?;
    match load_catalog(config).await {
        Ok(assets) => session.set_catalog(assets),
        Err(CatalogError::NotConfigured) if frame.is_none() => {
            log::warn!("no catalog configured, capturing without a frame");
        }
        Err(e) => return Err(e.into()),
    }
    if let Some(id) = frame {
        select_by_id(&mut session, id)?;
    }

    session.start_camera().await?;

    let mut preview = LogPreview::default();
    let mut timer = TickTimer::new(config.render.fps);
    for _ in 0..ticks {
        if ctrlc_received() {
            session.teardown();
            return Err(CommandError::Interrupted);
        }
        timer.tick().await;
        let outcome = session.tick();
        let frame_size = session.device().frame_size();
        let display_placement = preview.project(frame_size, &outcome);
        preview.present(&PreviewUpdate {
            outcome: &outcome,
            frame: None,
            frame_size,
            display_placement,
            asset: None,
            camera: session.session().state.name(),
            asset_name: None,
            asset_state: session.selected_state(),
            delta: session.adjustment(),
            has_photo: false,
            notice: None,
        })?;
    }

    session.capture().await?;
    let path = session.download()?;
    session.teardown();
    Ok(path)
}

/// The interactive terminal session.
pub async fn run_interactive<B: CameraBackend>(
    config: &Config,
    backend: B,
    start_camera: bool,
    show_status: bool,
) -> Result<(), CommandError> {
    let mut session = build_session(config, backend)?;
    match load_catalog(config).await {
        Ok(assets) => session.set_catalog(assets),
        Err(CatalogError::NotConfigured) => {
            eprintln!("Warning: no catalog configured (--catalog-url or --catalog-path).");
            eprintln!("Continuing without frames.\n");
        }
        Err(e) => return Err(e.into()),
    }

    if start_camera {
        session.start_camera().await?;
    }

    let mut preview = TerminalPreview::stdout();
    if !show_status {
        preview.status_bar_mut().toggle();
    }

    let mut guard = ScreenGuard::enter()?;
    let result = event_loop::run(&mut session, &mut preview, config.render.fps).await;
    guard.exit()?;

    session.teardown();
    Ok(result?)
}
