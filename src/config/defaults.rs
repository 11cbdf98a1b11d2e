//! Default configuration files.
//!
//! Candidates are read in increasing specificity, later files winning:
//! 1. Example file shipped in the site data dir
//! 2. Site-wide config (e.g. /etc/xdg/orion/orion_config.yaml)
//! 3. User config (~/.config/orion/orion_config.yaml)

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use serde_yaml::Value;

use super::experiment::ExperimentConfig;
use super::partial::PartialConfig;

/// Config file name inside each orion config directory.
pub const CONFIG_FILE_NAME: &str = "orion_config.yaml";

/// Example file name inside the site data directory.
pub const EXAMPLE_FILE_NAME: &str = "orion_config.yaml.example";

/// Ordered list of default config file candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultPaths {
    paths: Vec<PathBuf>,
}

impl DefaultPaths {
    /// Use exactly these paths, lowest precedence first.
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// The standard site data, site config, and user config locations.
    pub fn standard() -> Self {
        let project = env!("CARGO_PKG_NAME");
        let mut paths = vec![
            site_dir("XDG_DATA_DIRS", "/usr/local/share")
                .join(project)
                .join(EXAMPLE_FILE_NAME),
            site_dir("XDG_CONFIG_DIRS", "/etc/xdg")
                .join(project)
                .join(CONFIG_FILE_NAME),
        ];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join(project).join(CONFIG_FILE_NAME));
        }
        Self { paths }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl Default for DefaultPaths {
    fn default() -> Self {
        Self::standard()
    }
}

// First entry of a colon-separated XDG search path.
fn site_dir(var: &str, fallback: &str) -> PathBuf {
    std::env::var(var)
        .ok()
        .and_then(|dirs| dirs.split(':').find(|d| !d.is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(fallback))
}

/// Build the default configuration from built-in values and the default files.
///
/// Missing files are skipped. Malformed files are logged and skipped. A
/// default file never sets the experiment name.
pub fn load_default_config(paths: &DefaultPaths) -> ExperimentConfig {
    let mut config = ExperimentConfig::builtin();

    for path in paths.paths() {
        match load_default_file(path) {
            Ok(Some(mut layer)) => {
                layer.name = None;
                config.apply(&layer);
                log::debug!("Applied default config from {}", path.display());
            }
            Ok(None) => {}
            Err(e) => {
                log::warn!("Problem parsing file: {}", path.display());
                log::warn!("{:#}", e);
            }
        }
    }

    config
}

/// Read one default file. `Ok(None)` when it is missing or empty.
fn load_default_file(path: &Path) -> Result<Option<PartialConfig>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::debug!("Default config {} not found", path.display());
            return Ok(None);
        }
        Err(e) => return Err(e).context(format!("Failed to read {}", path.display())),
    };

    if content.trim().is_empty() {
        return Ok(None);
    }

    let document: Value = serde_yaml::from_str(&content).context("Failed to parse config file")?;
    match document {
        Value::Null => Ok(None),
        Value::Mapping(_) => {
            let layer = serde_yaml::from_value(document).context("Unexpected config layout")?;
            Ok(Some(layer))
        }
        _ => eyre::bail!("top level of {} is not a mapping", path.display()),
    }
}
