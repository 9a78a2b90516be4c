use anyhow::{Context, Result};
use backdrop::config::{ConfigLoadResult, init_config};
use backdrop::{AppError, app, logger};
use clap::Parser;
use std::path::PathBuf;
use tokio::io::BufReader;

/// Theme-aware image/video background controller
#[derive(Debug, Parser)]
#[command(name = "backdrop", version, about)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// File holding the current theme (`light`, `dark` or a class list);
    /// overrides `theme.file` from the configuration
    #[arg(short, long)]
    theme_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match init_config(&args.config) {
        ConfigLoadResult::Success(config) => config,
        ConfigLoadResult::LoadError(e) | ConfigLoadResult::DeserializeError(e) => {
            return Err(AppError::Config(e.clone()).into());
        }
    };

    logger::setup_logger(config.logging()).context("Failed to initialize logger")?;
    log::info!("Starting backdrop with {}", args.config.display());

    let runtime = app::start(config, args.theme_file)?;
    println!("Commands: toggle, status, quit");

    let result = app::command_loop(&runtime.handle, BufReader::new(tokio::io::stdin())).await;
    runtime.shutdown().await?;
    result?;
    Ok(())
}
