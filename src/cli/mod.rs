//! CLI module for orion - command-line interface and subcommands.
//!
//! Parses the command line, then hands the chosen subcommand to its handler
//! together with an explicit logging configuration.

pub mod commands;
pub mod handlers;

pub use commands::{BasicArgs, Cli, Commands, ExperimentArgs, LoggingConfig, UserArgs};
pub use handlers::{RunContext, cmdline_args, execute};
