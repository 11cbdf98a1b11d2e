//! Error types for Orion
//!
//! Centralized error handling using thiserror.

use std::path::PathBuf;

use thiserror::Error;

/// All error types that can occur while resolving an experiment configuration
#[derive(Debug, Error)]
pub enum OrionError {
    /// User config file could not be opened or read
    #[error("Cannot access config file {}: {source}", .path.display())]
    ConfigAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// User config file is not valid YAML or does not match the expected shape
    #[error("Cannot parse config file{}: {source}", describe(.path))]
    ConfigParse {
        path: Option<PathBuf>,
        #[source]
        source: serde_yaml::Error,
    },

    /// Config document parsed, but its top level is not a mapping
    #[error("Malformed config: {0}")]
    MalformedConfig(String),

    /// Experiment name missing after every source was merged
    #[error("Experiment name is required: pass it with --name or set `name` in the file given to --config")]
    MissingName,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn describe(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(" {}", path.display()),
        None => String::new(),
    }
}

/// Result type alias for Orion operations
pub type Result<T> = std::result::Result<T, OrionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_name_error() {
        let err = OrionError::MissingName;
        let msg = err.to_string();
        assert!(msg.contains("--name"));
        assert!(msg.contains("--config"));
    }

    #[test]
    fn test_malformed_config_error() {
        let err = OrionError::MalformedConfig("top level is a sequence".to_string());
        assert_eq!(err.to_string(), "Malformed config: top level is a sequence");
    }

    #[test]
    fn test_config_access_error_names_path() {
        let err = OrionError::ConfigAccess {
            path: PathBuf::from("/nope/orion.yaml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/nope/orion.yaml"));
        assert!(msg.contains("file not found"));
    }

    #[test]
    fn test_config_parse_error_without_path() {
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>("key: [unclosed").unwrap_err();
        let err = OrionError::ConfigParse {
            path: None,
            source: yaml_err,
        };
        assert!(err.to_string().starts_with("Cannot parse config file: "));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: OrionError = io_err.into();
        assert!(matches!(err, OrionError::Io(_)));
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(OrionError::MissingName)
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }
}
