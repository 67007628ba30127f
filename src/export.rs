//! Handing finished photos to the outside world.

use image::{ImageFormat, RgbaImage};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::compositor::CapturedPhoto;

pub const SHARE_TITLE: &str = "Virtual try-on";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to create export directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write '{path}': {source}")]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    /// No share capability on this platform/configuration. Not fatal.
    #[error("Sharing is not supported here")]
    SharingUnsupported,

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Share command '{command}' failed: {reason}")]
    CommandFailed { command: String, reason: String },
}

/// The file export sink.
pub trait ExportSink {
    /// Persist `raster`; returns where it went.
    fn save_file(&self, raster: &RgbaImage, suggested_name: &str) -> Result<PathBuf, ExportError>;

    fn share_file(&self, raster: &RgbaImage, title: &str, message: &str) -> Result<(), ShareError>;
}

/// Writes PNGs into a directory; shares by handing the file to an external
/// command (for example `open` or `xdg-open`).
#[derive(Debug, Clone)]
pub struct DiskExportSink {
    dir: PathBuf,
    share_command: Option<String>,
}

impl DiskExportSink {
    pub fn new(dir: PathBuf, share_command: Option<String>) -> Self {
        Self { dir, share_command }
    }

    /// The user's Pictures directory, or the working directory.
    pub fn default_dir() -> PathBuf {
        dirs::picture_dir()
            .map(|d| d.join("tryon-overlay"))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write_png(&self, raster: &RgbaImage, name: &str) -> Result<PathBuf, ExportError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| ExportError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;
        let path = unique_path(&self.dir, name);
        raster
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|source| ExportError::Encode {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}

impl ExportSink for DiskExportSink {
    fn save_file(&self, raster: &RgbaImage, suggested_name: &str) -> Result<PathBuf, ExportError> {
        let path = self.write_png(raster, suggested_name)?;
        log::info!("saved photo to {}", path.display());
        Ok(path)
    }

    fn share_file(&self, raster: &RgbaImage, title: &str, message: &str) -> Result<(), ShareError> {
        let Some(command) = self.share_command.as_deref() else {
            return Err(ShareError::SharingUnsupported);
        };
        let path = self.write_png(raster, "tryon-share.png")?;

        let status = Command::new(command)
            .arg(&path)
            .env("TRYON_SHARE_TITLE", title)
            .env("TRYON_SHARE_MESSAGE", message)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| ShareError::CommandFailed {
                command: command.to_string(),
                reason: e.to_string(),
            })?;
        if !status.success() {
            return Err(ShareError::CommandFailed {
                command: command.to_string(),
                reason: status.to_string(),
            });
        }
        log::info!("shared {} via {}", path.display(), command);
        Ok(())
    }
}

/// `dir/name`, or `dir/stem-2.ext`, `dir/stem-3.ext`, ... if taken.
fn unique_path(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }
    let path = Path::new(name);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("tryon");
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("png");
    (2..)
        .map(|n| dir.join(format!("{}-{}.{}", stem, n, ext)))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

/// How a photo ended up leaving the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Shared,
    Saved(PathBuf),
}

/// Download/share actions on a [`CapturedPhoto`].
#[derive(Debug, Clone)]
pub struct ExportAdapter<S: ExportSink> {
    sink: S,
}

impl<S: ExportSink> ExportAdapter<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn download(&self, photo: &CapturedPhoto) -> Result<PathBuf, ExportError> {
        self.sink.save_file(photo.raster(), &photo.suggested_name())
    }

    pub fn share(&self, photo: &CapturedPhoto) -> Result<(), ShareError> {
        let message = match photo.frame_name() {
            Some(name) => format!("Trying on {}", name),
            None => "My try-on photo".to_string(),
        };
        self.sink.share_file(photo.raster(), SHARE_TITLE, &message)
    }

    /// Share, falling back to a download when sharing is unsupported.
    pub fn share_or_download(&self, photo: &CapturedPhoto) -> Result<Delivery, ShareError> {
        match self.share(photo) {
            Ok(()) => Ok(Delivery::Shared),
            Err(ShareError::SharingUnsupported) => {
                log::info!("sharing unsupported, saving instead");
                Ok(Delivery::Saved(self.download(photo)?))
            }
            Err(e) => Err(e),
        }
    }
}
