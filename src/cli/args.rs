//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::enums::CameraSource;
use crate::config::Config;

/// Real-time virtual try-on: places an eyewear frame over the live camera
#[derive(Parser, Debug)]
#[command(name = "tryon-overlay")]
#[command(version, about = "Virtual eyewear try-on over a live camera", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Camera device index (from list-cameras)
    #[arg(long)]
    pub camera: Option<u32>,

    /// Frame source
    #[arg(long, default_value = "webcam")]
    pub source: CameraSource,

    /// Requested capture resolution (WIDTHxHEIGHT)
    #[arg(long, value_parser = parse_resolution)]
    pub resolution: Option<(u32, u32)>,

    /// Do not mirror the camera horizontally
    #[arg(long)]
    pub no_mirror: bool,

    /// Start with the camera off
    #[arg(long)]
    pub no_camera: bool,

    /// HTTP catalog base URL
    #[arg(long, conflicts_with = "catalog_path")]
    pub catalog_url: Option<String>,

    /// Local JSON catalog manifest
    #[arg(long)]
    pub catalog_path: Option<PathBuf>,

    /// Maximum number of frames to list
    #[arg(long)]
    pub limit: Option<usize>,

    /// Directory for downloaded photos
    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    /// Program that receives the photo path when sharing
    #[arg(long)]
    pub share_command: Option<String>,

    /// Hide status bar
    #[arg(long)]
    pub no_status: bool,

    /// Config file path
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List available cameras
    ListCameras,
    /// Print the frame catalog
    Catalog,
    /// Headless: start the camera, place the frame, capture and save one photo
    Snapshot {
        /// Frame id to try on (default: first in the catalog)
        #[arg(long)]
        frame: Option<String>,
        /// Render ticks to run before capturing
        #[arg(long, default_value = "10")]
        ticks: u32,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Manage downloaded frame images
    #[command(after_help = "Examples:
    tryon-overlay cache path     # Print the cache directory
    tryon-overlay cache clear    # Remove all cached frame images")]
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show effective configuration
    Show,
    /// Create default config file
    Init,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CacheAction {
    /// Print the cache directory
    Path,
    /// Remove all cached frame images
    Clear,
}

impl Args {
    /// Merge flags over the loaded config: CLI > config file > defaults.
    pub fn apply(&self, config: &mut Config) {
        if let Some(index) = self.camera {
            config.camera.device = Some(index);
        }
        if let Some((width, height)) = self.resolution {
            config.camera.width = width;
            config.camera.height = height;
        }
        if self.no_mirror {
            config.camera.mirror = false;
        }
        if let Some(url) = &self.catalog_url {
            config.catalog.url = Some(url.clone());
            config.catalog.path = None;
        }
        if let Some(path) = &self.catalog_path {
            config.catalog.path = Some(path.clone());
            config.catalog.url = None;
        }
        if let Some(limit) = self.limit {
            config.catalog.limit = limit;
        }
        if let Some(dir) = &self.export_dir {
            config.export.dir = Some(dir.clone());
        }
        if let Some(command) = &self.share_command {
            config.export.share_command = Some(command.clone());
        }
    }
}

/// Parse and validate resolution (WIDTHxHEIGHT format)
fn parse_resolution(s: &str) -> Result<(u32, u32), String> {
    let Some((w, h)) = s.split_once('x') else {
        return Err(format!(
            "Invalid resolution format '{}'. Use WIDTHxHEIGHT (e.g., 1280x720)",
            s
        ));
    };
    let width: u32 = w
        .parse()
        .map_err(|_| format!("Invalid width '{}' in resolution", w))?;
    let height: u32 = h
        .parse()
        .map_err(|_| format!("Invalid height '{}' in resolution", h))?;
    if width == 0 || height == 0 {
        return Err("Resolution must be non-zero".to_string());
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["tryon-overlay"]);
        assert!(args.command.is_none());
        assert!(args.camera.is_none());
        assert_eq!(args.source, CameraSource::Webcam);
        assert!(args.resolution.is_none());
        assert!(!args.no_mirror);
        assert!(!args.no_camera);
        assert!(!args.no_status);
        assert!(args.config.is_none());
    }

    #[test]
    fn test_args_resolution() {
        let args = Args::parse_from(["tryon-overlay", "--resolution", "1280x720"]);
        assert_eq!(args.resolution, Some((1280, 720)));
        assert!(Args::try_parse_from(["tryon-overlay", "--resolution", "1280"]).is_err());
        assert!(Args::try_parse_from(["tryon-overlay", "--resolution", "0x720"]).is_err());
    }

    #[test]
    fn test_catalog_sources_conflict() {
        let result = Args::try_parse_from([
            "tryon-overlay",
            "--catalog-url",
            "http://x",
            "--catalog-path",
            "frames.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_args_snapshot_subcommand() {
        let args = Args::parse_from(["tryon-overlay", "snapshot", "--frame", "aviator"]);
        match args.command {
            Some(Command::Snapshot { frame, ticks }) => {
                assert_eq!(frame.as_deref(), Some("aviator"));
                assert_eq!(ticks, 10);
            }
            _ => panic!("Expected Snapshot subcommand"),
        }
    }

    #[test]
    fn test_args_config_subcommands() {
        let args = Args::parse_from(["tryon-overlay", "config", "show"]);
        assert!(matches!(
            args.command,
            Some(Command::Config {
                action: ConfigAction::Show
            })
        ));
        let args = Args::parse_from(["tryon-overlay", "config", "init"]);
        assert!(matches!(
            args.command,
            Some(Command::Config {
                action: ConfigAction::Init
            })
        ));
    }

    #[test]
    fn test_args_cache_subcommands() {
        let args = Args::parse_from(["tryon-overlay", "cache", "clear"]);
        assert!(matches!(
            args.command,
            Some(Command::Cache {
                action: CacheAction::Clear
            })
        ));
        assert!(Args::try_parse_from(["tryon-overlay", "cache"]).is_err());
    }

    #[test]
    fn test_apply_overrides_config() {
        let args = Args::parse_from([
            "tryon-overlay",
            "--camera",
            "1",
            "--no-mirror",
            "--catalog-url",
            "http://localhost:8080",
            "--limit",
            "5",
            "--share-command",
            "xdg-open",
        ]);
        let mut config = Config::default();
        config.catalog.path = Some(PathBuf::from("frames.json"));
        args.apply(&mut config);

        assert_eq!(config.camera.device, Some(1));
        assert!(!config.camera.mirror);
        assert_eq!(config.catalog.url.as_deref(), Some("http://localhost:8080"));
        assert!(config.catalog.path.is_none());
        assert_eq!(config.catalog.limit, 5);
        assert_eq!(config.export.share_command.as_deref(), Some("xdg-open"));
    }
}
