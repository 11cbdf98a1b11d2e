//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - hunt: resolve an experiment's configuration and print the run plan
//! - init-only: resolve and validate an experiment's configuration

use clap::{ArgAction, Args, Parser, Subcommand};
use log::LevelFilter;

use crate::config::{ConfigFile, MaxTrials, parse_config_file};

/// Orion - asynchronous distributed hyperparameter optimization
#[derive(Parser, Debug)]
#[command(name = "orion")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Logging levels of information about the process (-v: INFO, -vv: DEBUG)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Logging settings selected by the verbosity count
    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig::from_verbosity(self.verbose)
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve the experiment and print how the user script would be run
    Hunt(ExperimentArgs),

    /// Resolve and validate the experiment's configuration only
    InitOnly(ExperimentArgs),
}

/// Arguments shared by every experiment subcommand.
#[derive(Args, Debug, Clone)]
pub struct ExperimentArgs {
    #[command(flatten)]
    pub basic: BasicArgs,

    /// Number of trials to be completed for the experiment ('inf' for no limit)
    #[arg(long, value_name = "#", help_heading = "Orion arguments")]
    pub max_trials: Option<MaxTrials>,

    /// Number of workers evaluating in parallel
    #[arg(long, value_name = "#", help_heading = "Orion arguments")]
    pub pool_size: Option<u32>,

    /// Print the resolved configuration as JSON instead of YAML
    #[arg(long, help_heading = "Orion arguments")]
    pub json: bool,

    #[command(flatten)]
    pub user: UserArgs,
}

/// Experiment identification.
#[derive(Args, Debug, Clone)]
#[command(next_help_heading = "Orion arguments")]
pub struct BasicArgs {
    /// Experiment's unique name (given here or in a config file)
    #[arg(short, long, value_name = "stringID")]
    pub name: Option<String>,

    /// User provided orion configuration file
    #[arg(short, long, value_name = "path-to-config", value_parser = parse_config_file)]
    pub config: Option<ConfigFile>,
}

/// The user's script and its own arguments.
///
/// Everything from the script path onward lands here verbatim, orion's own
/// flag names included.
#[derive(Args, Debug, Clone)]
#[command(next_help_heading = "User script related arguments")]
pub struct UserArgs {
    /// Your experiment's script, then any arguments to pass it untouched
    #[arg(
        value_name = "path-to-script",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        num_args = 1..,
        required = true
    )]
    pub command: Vec<String>,
}

impl UserArgs {
    /// Path of the user's script.
    pub fn user_script(&self) -> &str {
        self.command.first().map_or("", String::as_str)
    }

    /// Arguments following the script.
    pub fn user_args(&self) -> &[String] {
        self.command.split_first().map_or(&[], |(_, rest)| rest)
    }
}

/// Logging settings for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: LevelFilter,
}

impl LoggingConfig {
    /// 0: warnings only, 1: info, 2 or more: debug.
    pub fn from_verbosity(count: u8) -> Self {
        let level = match count {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        };
        Self { level }
    }

    pub fn is_verbose(&self) -> bool {
        self.level >= LevelFilter::Info
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::from_verbosity(0)
    }
}
