//! Subcommand handlers.
//!
//! Each handler receives its parsed arguments and the invocation context,
//! resolves the experiment configuration and reports it to `out`.

use std::io::Write;

use colored::*;
use eyre::{Context, Result};
use serde_yaml::Value;

use super::commands::{Commands, ExperimentArgs, LoggingConfig};
use crate::config::{CmdlineArgs, DefaultPaths, EnvSource, ExperimentConfig, Metadata, PoolSize, resolve_experiment_config};

/// Everything a handler needs beyond its own arguments.
pub struct RunContext<'a> {
    pub paths: DefaultPaths,
    pub env: &'a dyn EnvSource,
    pub logging: LoggingConfig,
}

/// Dispatch a parsed subcommand to its handler.
pub fn execute(command: &Commands, ctx: &RunContext<'_>, out: &mut dyn Write) -> Result<()> {
    if ctx.logging.is_verbose() {
        writeln!(out, "{}", "Default config files:".yellow())?;
        for path in ctx.paths.paths() {
            writeln!(out, "  {}", path.display())?;
        }
    }

    match command {
        Commands::Hunt(args) => handle_hunt(args, ctx, out),
        Commands::InitOnly(args) => handle_init_only(args, ctx, out),
    }
}

fn handle_hunt(args: &ExperimentArgs, ctx: &RunContext<'_>, out: &mut dyn Write) -> Result<()> {
    let config = resolve(args, ctx)?;
    let name = config.require_name()?;
    log::info!("Hunting with experiment '{}'", name);

    writeln!(out, "{} {}", "Experiment:".green(), name)?;
    write_config(&config, args.json, out)?;

    writeln!(out, "{} {}", "User command:".cyan(), args.user.command.join(" "))?;
    Ok(())
}

fn handle_init_only(args: &ExperimentArgs, ctx: &RunContext<'_>, out: &mut dyn Write) -> Result<()> {
    let config = resolve(args, ctx)?;
    let name = config.require_name()?;
    log::info!("Initialized experiment '{}'", name);

    writeln!(out, "{} {}", "Initialized:".green(), name)?;
    write_config(&config, args.json, out)
}

fn resolve(args: &ExperimentArgs, ctx: &RunContext<'_>) -> Result<ExperimentConfig> {
    let cmdline = cmdline_args(args, ctx.env);
    let config = resolve_experiment_config(&ctx.paths, ctx.env, args.basic.config.as_ref(), &cmdline)
        .context("Failed to resolve experiment configuration")?;
    log::debug!("Resolved configuration: {:?}", config);
    Ok(config)
}

fn write_config(config: &ExperimentConfig, json: bool, out: &mut dyn Write) -> Result<()> {
    if json {
        let text = serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;
        writeln!(out, "{}", text)?;
    } else {
        let text = serde_yaml::to_string(config).context("Failed to serialize configuration")?;
        write!(out, "{}", text)?;
    }
    Ok(())
}

/// Convert parsed arguments into the command-line resolution layer.
pub fn cmdline_args(args: &ExperimentArgs, env: &dyn EnvSource) -> CmdlineArgs {
    CmdlineArgs {
        name: args.basic.name.clone(),
        max_trials: args.max_trials,
        pool_size: args.pool_size.map(PoolSize::Workers),
        metadata: Some(run_metadata(args, env)),
        ..Default::default()
    }
}

fn run_metadata(args: &ExperimentArgs, env: &dyn EnvSource) -> Metadata {
    let mut metadata = Metadata::new();
    if let Some(user) = env.var("USER") {
        metadata.insert("user".to_string(), Value::String(user));
    }
    metadata.insert(
        "datetime".to_string(),
        Value::String(chrono::Utc::now().to_rfc3339()),
    );
    metadata.insert(
        "orion_version".to_string(),
        Value::String(env!("CARGO_PKG_VERSION").to_string()),
    );
    metadata.insert(
        "user_script".to_string(),
        Value::String(args.user.user_script().to_string()),
    );
    metadata.insert(
        "user_args".to_string(),
        Value::Sequence(args.user.user_args().iter().cloned().map(Value::String).collect()),
    );
    metadata
}
