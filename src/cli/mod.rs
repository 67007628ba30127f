//! Command-line interface definitions and helpers.
//!
//! This module contains all CLI argument parsing, enums, and subcommand handlers.

mod args;
mod commands;
mod enums;
mod logging;

pub use args::{Args, CacheAction, Command, ConfigAction};
pub use commands::{
    asset_cache, build_catalog, build_session, ctrlc_received, handle_cache_action,
    handle_config_action, list_cameras,
    load_catalog, print_catalog, run_interactive, run_snapshot, setup_ctrlc_handler,
    CommandError,
};
pub use enums::CameraSource;
pub use logging::{default_log_path, init_logging, open_log_file};
