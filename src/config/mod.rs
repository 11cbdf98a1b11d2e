//! Configuration system for Orion.
//!
//! How settings resolve (high to low):
//! - Experiment name: command-line flag > `--config` file > required
//! - `database` group: `--config` file > environment variables > default
//!   files > built-in defaults
//! - Everything else: command-line flags > `--config` file > resumed
//!   experiment > default files
//!
//! Default files are read in the order of [`DefaultPaths::standard`]:
//! site example file < site-wide config < user config.

pub use self::defaults::{CONFIG_FILE_NAME, DefaultPaths, EXAMPLE_FILE_NAME, load_default_config};
pub use self::env::{
    EnvSource, EnvVar, ProcessEnv, database_env_vars, local_address, merge_env_vars, resolve_local_address,
};
pub use self::experiment::{DatabaseConfig, DatabaseField, ExperimentConfig, MaxTrials, Metadata, PoolSize};
pub use self::file::{ConfigFile, fetch_config, parse_config_file, parse_layer};
pub use self::partial::{CmdlineArgs, DatabasePatch, PartialConfig, PartialConfigBuilder};
pub use self::resolution::{ConfigSource, resolve, resolve_experiment_config};

mod defaults;
mod env;
mod experiment;
mod file;
mod partial;
mod resolution;

/// Default number of parallel workers.
pub const DEFAULT_POOL_SIZE: u32 = 10;

/// Default optimization algorithm.
pub const DEFAULT_ALGORITHM: &str = "random";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_uses_constants() {
        let config = ExperimentConfig::builtin();
        assert_eq!(config.pool_size, PoolSize::Workers(DEFAULT_POOL_SIZE));
        assert_eq!(config.algorithms.as_str(), Some(DEFAULT_ALGORITHM));
    }
}
