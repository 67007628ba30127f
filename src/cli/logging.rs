//! Logger setup.
//!
//! Logs go to stderr, except while the full-screen preview owns the terminal:
//! then they are appended to a file so they cannot tear the display.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use env_logger::{Builder, Env, Target};
use log::LevelFilter;

const LOG_FILE: &str = "tryon-overlay.log";

/// `~/.cache/tryon-overlay/tryon-overlay.log`
pub fn default_log_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("tryon-overlay")
        .join(LOG_FILE)
}

/// Open `path` for appending, creating parent directories.
pub fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Initialize the global logger. `RUST_LOG` picks the level (default warn).
///
/// With `to_file` set, logs are appended to the default log file, or switched
/// off if it cannot be opened. Returns the file in use.
pub fn init_logging(to_file: bool) -> Option<PathBuf> {
    let mut builder = Builder::from_env(Env::default().default_filter_or("warn"));
    if !to_file {
        builder.init();
        return None;
    }

    let path = default_log_path();
    match open_log_file(&path) {
        Ok(file) => {
            builder.target(Target::Pipe(Box::new(file)));
            builder.init();
            Some(path)
        }
        Err(_) => {
            builder.filter_level(LevelFilter::Off);
            builder.init();
            None
        }
    }
}
