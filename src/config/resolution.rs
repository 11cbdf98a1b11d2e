//! Configuration resolution (4-layer merge).
//!
//! Resolves the effective ExperimentConfig from, low to high precedence:
//! 1. Default config (built-in values + default files)
//! 2. Environment config (env-augmented defaults, or a resumed experiment)
//! 3. User config file (`--config`)
//! 4. Command-line arguments
//!
//! `database` merges field by field at layers 2 and 3. `metadata` merges key
//! by key at layer 4 only.

use std::fmt;

use super::defaults::{DefaultPaths, load_default_config};
use super::env::{EnvSource, merge_env_vars};
use super::experiment::ExperimentConfig;
use super::file::{ConfigFile, fetch_config};
use super::partial::{CmdlineArgs, PartialConfig};
use crate::error::Result;

/// Merge every layer into a fresh configuration.
///
/// None of the inputs are modified. No validation is done here; callers
/// check the experiment name with [`ExperimentConfig::require_name`].
pub fn resolve(
    default_config: &ExperimentConfig,
    env_config: &PartialConfig,
    file_config: &PartialConfig,
    cmdline_args: &CmdlineArgs,
) -> ExperimentConfig {
    log::debug!("Starting from {} layer", ConfigSource::Default);
    let mut config = default_config.clone();

    for (source, layer) in [(ConfigSource::Environment, env_config), (ConfigSource::File, file_config)] {
        if !layer.is_empty() {
            log::debug!("Applying {} layer", source);
            config.apply(layer);
        }
    }

    log::debug!("Applying {} layer", ConfigSource::CommandLine);
    config.apply_cmdline(cmdline_args);

    config
}

/// Resolve the configuration for one invocation, end to end.
///
/// Fails on an unreadable or malformed user file, and when no source named
/// the experiment.
pub fn resolve_experiment_config(
    paths: &DefaultPaths,
    env: &dyn EnvSource,
    config_file: Option<&ConfigFile>,
    cmdline_args: &CmdlineArgs,
) -> Result<ExperimentConfig> {
    let default_config = load_default_config(paths);
    let env_config = merge_env_vars(&default_config, env);
    let file_config = fetch_config(config_file)?;

    let config = resolve(&default_config, &env_config.to_partial(), &file_config, cmdline_args);
    let name = config.require_name()?;
    log::info!("Resolved configuration for experiment '{}'", name);

    Ok(config)
}

/// Source of a configuration layer (for logging/introspection).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Built-in values and default files.
    Default,
    /// Environment variables (or a resumed experiment).
    Environment,
    /// User config file.
    File,
    /// Command-line arguments.
    CommandLine,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::Environment => write!(f, "environment"),
            ConfigSource::File => write!(f, "config file"),
            ConfigSource::CommandLine => write!(f, "command line"),
        }
    }
}
