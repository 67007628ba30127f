//! Configuration file handling for tryon-overlay.
//!
//! Loads configuration from `~/.config/tryon-overlay/config.toml` or a custom path.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::camera::{CameraSettings, Facing, Resolution};
use crate::landmarks::FramingRatios;
use crate::overlay::PlacementCalibration;

/// Configuration file structure for tryon-overlay.
/// Loaded from ~/.config/tryon-overlay/config.toml (or custom path via --config).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub controls: ControlsConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Explicit device index; absent prefers a front-facing camera
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<u32>,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub mirror: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: None,
            width: Resolution::VGA.width,
            height: Resolution::VGA.height,
            fps: 30,
            mirror: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct CalibrationConfig {
    #[serde(flatten)]
    pub framing: FramingRatios,
    #[serde(flatten)]
    pub placement: PlacementCalibration,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    /// Pixels moved per arrow-key press
    pub nudge_step: f64,
    /// Scale change per +/- press
    pub scale_step: f64,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            nudge_step: 10.0,
            scale_step: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub fps: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { fps: 30 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: None,
            path: None,
            limit: 20,
            cache_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ExportConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_command: Option<String>,
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
                path: path.clone(),
                source: e,
            })?;
            Self::parse(&content).map_err(|e| ConfigError::ParseError {
                path: path.clone(),
                source: e,
            })
        } else {
            Ok(Config::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Effective configuration rendered back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::SerializeError)
    }

    pub fn camera_settings(&self) -> CameraSettings {
        CameraSettings {
            device_index: self.camera.device,
            facing: Facing::Front,
            resolution: Resolution {
                width: self.camera.width,
                height: self.camera.height,
            },
            fps: self.camera.fps,
            mirror: self.camera.mirror,
        }
    }
}

/// Errors that can occur when loading or writing configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to render configuration: {0}")]
    SerializeError(toml::ser::Error),

    #[error("Config file already exists: {0}")]
    AlreadyExists(PathBuf),
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("tryon-overlay").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/tryon-overlay/config.toml")
        })
}

/// Commented default written by `config init`.
pub const DEFAULT_CONFIG: &str = r#"# tryon-overlay configuration

[camera]
# Camera device index (default: first front-facing camera)
# device = 0
# Requested capture resolution
width = 640
height = 480
fps = 30
# Mirror horizontally (selfie mode)
mirror = true

[calibration]
# Eye line as a fraction of frame height
eye_line_ratio = 0.42
# Inter-eye span as a fraction of frame width
span_ratio = 0.12
# Frame width as a multiple of the inter-eye span
span_multiplier = 2.5
# Fraction of the frame's height above the eye line
vertical_anchor = 0.45

[controls]
# Pixels per arrow-key nudge
nudge_step = 10.0
# Scale change per +/- press (scale is clamped to 0.5..2.0)
scale_step = 0.1

[render]
# Placement updates per second
fps = 30

[catalog]
# HTTP catalog base URL (serves GET /frames?limit=N)
# url = "https://example.com/api"
# Or a local JSON manifest
# path = "~/frames/frames.json"
limit = 20
# cache_dir = "~/.cache/tryon-overlay/frames"

[export]
# Where downloaded photos go (default: Pictures/tryon-overlay)
# dir = "~/Pictures/tryon-overlay"
# Program that receives the photo path when sharing
# share_command = "xdg-open"
"#;

/// Write [`DEFAULT_CONFIG`] to `path`, refusing to overwrite.
pub fn write_default(path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        return Err(ConfigError::AlreadyExists(path.to_path_buf()));
    }
    let io_error = |source| ConfigError::IoError {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    std::fs::write(path, DEFAULT_CONFIG).map_err(io_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(Some(&dir.path().join("nope.toml"))).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.catalog.limit, 20);
        assert_eq!(config.calibration.framing.eye_line_ratio, 0.42);
        assert_eq!(config.calibration.placement.span_multiplier, 2.5);
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config = Config::parse(
            r#"
[camera]
device = 2
mirror = false

[calibration]
span_multiplier = 3.0

[export]
share_command = "open"
"#,
        )
        .unwrap();

        assert_eq!(config.camera.device, Some(2));
        assert!(!config.camera.mirror);
        assert_eq!(config.camera.width, 640);
        assert_eq!(config.calibration.placement.span_multiplier, 3.0);
        assert_eq!(config.calibration.placement.vertical_anchor, 0.45);
        assert_eq!(config.calibration.framing.span_ratio, 0.12);
        assert_eq!(config.export.share_command.as_deref(), Some("open"));

        let settings = config.camera_settings();
        assert_eq!(settings.device_index, Some(2));
        assert_eq!(settings.resolution, Resolution::VGA);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[camera\nwidth = ").unwrap();
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_default_template_matches_defaults() {
        assert_eq!(Config::parse(DEFAULT_CONFIG).unwrap(), Config::default());
    }

    #[test]
    fn test_show_output_parses_back() {
        let mut config = Config::default();
        config.catalog.url = Some("http://localhost:9000".to_string());
        let rendered = config.to_toml().unwrap();
        assert_eq!(Config::parse(&rendered).unwrap(), config);
    }

    #[test]
    fn test_write_default_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        write_default(&path).unwrap();
        assert!(path.exists());
        assert!(matches!(
            write_default(&path),
            Err(ConfigError::AlreadyExists(_))
        ));
    }
}
