//! Orion - experiment configuration resolution
//!
//! Merges built-in defaults, default config files, environment variables, a
//! user-supplied config file, and command-line arguments into the single
//! configuration used for one experiment run.

pub mod cli;
pub mod config;
pub mod error;

pub use error::{OrionError, Result};
