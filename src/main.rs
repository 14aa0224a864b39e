//! ScreenReel CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use screenreel::cli::{
    app::{load_merged_config, run_monitors, run_record, EXIT_ERROR, EXIT_USAGE_ERROR},
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    presenter::Presenter,
    RecordOptions,
};
use screenreel::domain::capture::{CaptureMode, Region};
use screenreel::domain::config::AppConfig;
use screenreel::domain::encoding::{ContainerFamily, QualityTier};
use screenreel::domain::recording::Duration;
use screenreel::infrastructure::XdgConfigStore;

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("screenreel=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("screenreel=warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let presenter = Presenter::new();

    // Handle subcommands
    match cli.command {
        Some(Commands::Config { action }) => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            return ExitCode::SUCCESS;
        }
        Some(Commands::Monitors { test_pattern }) => {
            return run_monitors(test_pattern || cli.test_pattern).await;
        }
        None => {}
    }

    // A region on the command line implies region mode unless a mode is given
    let capture_mode = match (cli.mode, cli.region.is_some()) {
        (Some(mode), _) => Some(CaptureMode::from(mode).as_str().to_string()),
        (None, true) => Some(CaptureMode::CustomRegion.as_str().to_string()),
        (None, false) => None,
    };

    // Build CLI config from args
    let cli_config = AppConfig {
        output_dir: cli.output_dir.clone(),
        file_name: cli.name.clone(),
        container: cli.format.map(|f| ContainerFamily::from(f).to_string()),
        frame_rate: cli.fps,
        quality: cli.quality.map(|q| QualityTier::from(q).as_str().to_string()),
        capture_mode,
        monitor: cli.monitor,
        region: cli.region.clone(),
        duration: cli.duration.clone(),
        notify: if cli.notify { Some(true) } else { None },
        external_encoder: if cli.external_encoder { Some(true) } else { None },
    };

    // Merge config
    let config = load_merged_config(cli_config).await;

    // Values that would otherwise be dropped silently by to_settings
    if let Some(s) = config.duration.as_ref() {
        if let Err(e) = s.parse::<Duration>() {
            presenter.error(&format!("Invalid duration: {}", e));
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    }
    if let Some(s) = config.region.as_ref() {
        if let Err(e) = s.parse::<Region>() {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    }
    if let Some(s) = config.container.as_ref() {
        if let Err(e) = s.parse::<ContainerFamily>() {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    }

    let options = RecordOptions {
        settings: config.to_settings(),
        notify: config.notify_or_default(),
        test_pattern: cli.test_pattern,
    };

    run_record(options).await
}
