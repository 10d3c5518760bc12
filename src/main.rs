use clap::Parser;
use std::time::Duration;

use vision_cam::cli::{self, Args, Command};
use vision_cam::config::{self, Config};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), String> {
    let config_path = config::resolve_path(args.config.as_deref());
    let config = Config::load(Some(&config_path)).map_err(|e| e.to_string())?;

    let mut options = config.session_options();
    if let Some(lens) = args.lens {
        options.lens_direction = lens.into();
    }
    if let Some(resolution) = args.resolution {
        options.resolution = resolution.into();
    }
    if let Some(orientation) = args.orientation {
        options.device_orientation = orientation.into();
    }

    let provider = cli::provider_from_config(&config);

    if let Command::Config { action } = &args.command {
        return cli::handle_config_action(action.clone(), &config, &config_path);
    }

    if let Err(e) = cli::setup_ctrlc_handler() {
        log::warn!("Could not install Ctrl+C handler: {}", e);
    }

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| format!("Failed to create async runtime: {}", e))?;

    rt.block_on(async move {
        match args.command {
            Command::ListCameras => cli::list_cameras(&provider).await,
            Command::Run {
                duration,
                threshold,
            } => cli::run(provider, options, Duration::from_secs(duration), threshold).await,
            Command::Snapshot { output } => cli::snapshot(provider, options, &output).await,
            Command::Record { output, seconds } => {
                cli::record(provider, options, &output, Duration::from_secs(seconds)).await
            }
            Command::Config { .. } => Ok(()),
        }
    })
}
