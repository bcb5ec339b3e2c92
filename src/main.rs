//! weather-cache - cached OpenWeatherMap readings
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use weather_cache::cli::{commands, Cli, Commands};
use weather_cache::config::ConfigManager;
use weather_cache::error::CacheResult;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> CacheResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let mut config = config_manager.load().await?;

    // 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("weather_cache=warn"),
        1 => EnvFilter::new("weather_cache=info"),
        _ => EnvFilter::new("weather_cache=debug"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if config.general.log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.without_time().init();
    }

    debug!("Using config at {}", config_manager.path().display());

    if let Some(key) = cli.api_key.filter(|k| !k.trim().is_empty()) {
        config.api.api_key = Some(key);
    }

    match cli.command {
        Commands::Get(args) => commands::get(args, &config).await,
        Commands::Config(args) => commands::config(args, &config, &config_manager).await,
    }
}
