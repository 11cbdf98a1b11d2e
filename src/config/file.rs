//! User-provided config file (`--config`).
//!
//! Unlike default files, problems here are surfaced to the caller.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde_yaml::Value;

use super::partial::PartialConfig;
use crate::error::{OrionError, Result};

/// A config file opened and read when the command line is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    path: PathBuf,
    contents: String,
}

impl ConfigFile {
    /// Read `path` now, failing fast if it cannot be accessed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let contents = fs::read_to_string(&path).map_err(|source| OrionError::ConfigAccess {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path, contents })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reader over the file's contents.
    pub fn reader(&self) -> &[u8] {
        self.contents.as_bytes()
    }

    /// Parse the file into a resolution layer.
    pub fn fetch(&self) -> Result<PartialConfig> {
        log::debug!(
            "Found orion configuration file at: {}",
            fs::canonicalize(&self.path).unwrap_or_else(|_| self.path.clone()).display()
        );
        parse_layer(self.reader()).map_err(|e| match e {
            OrionError::ConfigParse { path: None, source } => OrionError::ConfigParse {
                path: Some(self.path.clone()),
                source,
            },
            other => other,
        })
    }
}

/// Value parser for clap: open the file as soon as the flag is parsed.
pub fn parse_config_file(s: &str) -> std::result::Result<ConfigFile, String> {
    ConfigFile::open(s).map_err(|e| e.to_string())
}

/// Return the layer held by the user's config file, or an empty layer if
/// none was given.
pub fn fetch_config(file: Option<&ConfigFile>) -> Result<PartialConfig> {
    match file {
        Some(file) => file.fetch(),
        None => Ok(PartialConfig::none()),
    }
}

/// Parse a YAML document into a layer. Empty documents give an empty layer.
pub fn parse_layer<R: Read>(mut reader: R) -> Result<PartialConfig> {
    let mut content = String::new();
    reader.read_to_string(&mut content)?;
    if content.trim().is_empty() {
        return Ok(PartialConfig::none());
    }

    let document: Value =
        serde_yaml::from_str(&content).map_err(|source| OrionError::ConfigParse { path: None, source })?;

    match document {
        Value::Null => Ok(PartialConfig::none()),
        Value::Mapping(_) => {
            serde_yaml::from_value(document).map_err(|source| OrionError::ConfigParse { path: None, source })
        }
        other => Err(OrionError::MalformedConfig(format!(
            "expected a mapping at the top level, found {}",
            kind(&other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolSize;
    use tempfile::TempDir;

    #[test]
    fn test_no_file_is_empty() {
        let layer = fetch_config(None).unwrap();
        assert!(layer.is_empty());
    }

    #[test]
    fn test_fetch_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("exp.yaml");
        fs::write(&path, "name: exp\npool_size: 5\n").unwrap();

        let file = ConfigFile::open(&path).unwrap();
        assert_eq!(file.path(), path.as_path());
        let layer = fetch_config(Some(&file)).unwrap();
        assert_eq!(layer.name.as_deref(), Some("exp"));
        assert_eq!(layer.pool_size, Some(PoolSize::Workers(5)));
    }

    #[test]
    fn test_open_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        let err = ConfigFile::open(temp.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, OrionError::ConfigAccess { .. }));
    }

    #[test]
    fn test_malformed_yaml_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.yaml");
        fs::write(&path, "name: [unclosed\n").unwrap();

        let file = ConfigFile::open(&path).unwrap();
        match fetch_config(Some(&file)) {
            Err(OrionError::ConfigParse { path: Some(p), .. }) => assert_eq!(p, path),
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_mapping_is_malformed() {
        let err = parse_layer("- a\n- b\n".as_bytes()).unwrap_err();
        assert!(matches!(err, OrionError::MalformedConfig(_)));
        assert!(err.to_string().contains("a sequence"));
    }

    #[test]
    fn test_empty_document() {
        let layer = parse_layer("".as_bytes()).unwrap();
        assert!(layer.is_empty());
    }

    #[test]
    fn test_parse_config_file_reports_path() {
        let err = parse_config_file("/definitely/not/here.yaml").unwrap_err();
        assert!(err.contains("/definitely/not/here.yaml"));
    }
}
