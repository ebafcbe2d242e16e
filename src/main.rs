//! ReelTrim command-line entry point
//!
//! # Usage
//!
//! ```bash
//! reeltrim trim --input holiday.mp4 --start 25 --end 75
//! reeltrim info --input holiday.mp4 --json
//! reeltrim shell --input holiday.mp4
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use reeltrim::cli::{commands, Cli, Commands};
use reeltrim::{AppConfig, ConfigOverrides, DefaultAppContainer};

/// Main entry point for the ReelTrim CLI application
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let overrides = ConfigOverrides {
        log_level: cli.log_level.clone(),
        output_dir: cli.output_dir(),
    };
    let config = AppConfig::load(cli.config.as_deref(), &overrides)
        .context("Failed to load configuration")?;

    init_logging(&config.log_level, cli.json_logs);
    info!("Starting ReelTrim");

    let interactive = !matches!(cli.command, Commands::Info(_));
    let container = DefaultAppContainer::new(&config, interactive)
        .context("Failed to initialize application")?;

    match cli.command {
        Commands::Trim(args) => commands::trim(&container, args).await?,
        Commands::Info(args) => commands::info(&container, args).await?,
        Commands::Shell(args) => commands::shell(&container, args).await?,
    }

    info!("ReelTrim finished");
    Ok(())
}

/// `RUST_LOG` wins over the configured level
fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
