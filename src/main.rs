use clap::Parser;
use eyre::{Context, Result};
use log::info;
use std::io;

use orion::cli::{Cli, LoggingConfig, RunContext, execute};
use orion::config::{DefaultPaths, ProcessEnv};

fn setup_logging(logging: &LoggingConfig) -> Result<()> {
    env_logger::Builder::new()
        .filter_level(logging.level)
        .target(env_logger::Target::Stderr)
        .try_init()
        .context("Failed to initialize logger")?;

    info!("Logging initialized at level {}", logging.level);
    Ok(())
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Logging level comes from -v/-vv only
    let logging = cli.logging();
    setup_logging(&logging)?;

    let ctx = RunContext {
        paths: DefaultPaths::standard(),
        env: &ProcessEnv,
        logging,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(&cli.command, &ctx, &mut out).context("Command failed")?;

    Ok(())
}
