use clap::Parser;

use tryon_overlay::camera::{NokhwaBackend, Resolution, SyntheticBackend};
use tryon_overlay::cli::{self, Args, CameraSource, Command, CommandError};
use tryon_overlay::config::{self, Config};

fn main() {
    // Load .env file, don't override existing env vars
    // dotenv::dotenv() returns Err if .env doesn't exist, which is fine
    let _ = dotenv::dotenv();

    let args = Args::parse();

    // The interactive preview owns the terminal, so its logs go to a file
    let log_file = cli::init_logging(args.command.is_none());

    let config_path = args.config.clone().unwrap_or_else(config::default_path);
    let mut config = match Config::load(Some(&config_path)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    args.apply(&mut config);

    let source = args.source;
    let start_camera = !args.no_camera;
    let show_status = !args.no_status;

    let result = match args.command {
        Some(Command::ListCameras) => cli::list_cameras().map_err(CommandError::from),
        Some(Command::Config { action }) => {
            cli::handle_config_action(action, &config, &config_path).map_err(CommandError::from)
        }
        Some(Command::Cache { action }) => cli::handle_cache_action(action, &config),
        Some(Command::Catalog) => block_on(cli::print_catalog(&config)),
        Some(Command::Snapshot { frame, ticks }) => {
            if let Err(e) = cli::setup_ctrlc_handler() {
                eprintln!("Warning: Could not set up Ctrl+C handler: {}", e);
            }
            block_on(async {
                let path = match source {
                    CameraSource::Webcam => {
                        cli::run_snapshot(&config, NokhwaBackend::new(), frame.as_deref(), ticks)
                            .await?
                    }
                    CameraSource::Synthetic => {
                        cli::run_snapshot(&config, synthetic(&config), frame.as_deref(), ticks)
                            .await?
                    }
                };
                println!("Saved {}", path.display());
                Ok::<(), CommandError>(())
            })
        }
        None => block_on(async {
            match source {
                CameraSource::Webcam => {
                    cli::run_interactive(&config, NokhwaBackend::new(), start_camera, show_status)
                        .await
                }
                CameraSource::Synthetic => {
                    cli::run_interactive(&config, synthetic(&config), start_camera, show_status)
                        .await
                }
            }
        }),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        if let Some(path) = log_file {
            eprintln!("Log: {}", path.display());
        }
        std::process::exit(1);
    }
}

fn synthetic(config: &Config) -> SyntheticBackend {
    SyntheticBackend::new(Resolution {
        width: config.camera.width,
        height: config.camera.height,
    })
}

/// Everything runs on one thread; the camera decodes on its own.
fn block_on<F>(future: F) -> Result<(), CommandError>
where
    F: std::future::Future<Output = Result<(), CommandError>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(future)
}
