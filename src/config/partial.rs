//! Resolution layers.
//!
//! A layer only carries the settings its source actually provides. Unset
//! fields leave the accumulated configuration alone.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;

use super::experiment::{MaxTrials, Metadata, PoolSize};

/// Settings read from a config file or carried over from another source.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PartialConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_trials: Option<MaxTrials>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_size: Option<PoolSize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithms: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabasePatch>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl PartialConfig {
    /// Create an empty layer (changes nothing when applied).
    pub fn none() -> Self {
        Self::default()
    }

    /// Check if the layer sets anything.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.max_trials.is_none()
            && self.pool_size.is_none()
            && self.algorithms.is_none()
            && self.database.is_none()
            && self.resources.is_none()
            && self.metadata.is_none()
            && self.extra.is_empty()
    }
}

/// Field-by-field update of the `database` group.
///
/// Outer `None`: key absent, field untouched. `Some(None)`: explicit null,
/// field cleared. Keys without a field of their own land in `extra`, nulls
/// included.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabasePatch {
    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub name: Option<Option<String>>,

    #[serde(rename = "type", deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub db_type: Option<Option<String>>,

    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub host: Option<Option<String>>,

    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub port: Option<Option<u16>>,

    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub username: Option<Option<String>>,

    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub password: Option<Option<String>>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

// Only called when the key is present; absent keys fall back to `default`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Settings given on the command line for this invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CmdlineArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_trials: Option<MaxTrials>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_size: Option<PoolSize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Builder for PartialConfig.
#[derive(Debug, Default)]
pub struct PartialConfigBuilder {
    layer: PartialConfig,
}

impl PartialConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.layer.name = Some(name.into());
        self
    }

    pub fn max_trials(mut self, value: MaxTrials) -> Self {
        self.layer.max_trials = Some(value);
        self
    }

    pub fn pool_size(mut self, workers: u32) -> Self {
        self.layer.pool_size = Some(PoolSize::Workers(workers));
        self
    }

    pub fn algorithms(mut self, value: impl Into<Value>) -> Self {
        self.layer.algorithms = Some(value.into());
        self
    }

    /// Set `database.host`.
    pub fn database_host(mut self, host: impl Into<String>) -> Self {
        self.layer.database.get_or_insert_with(DatabasePatch::default).host = Some(Some(host.into()));
        self
    }

    /// Set `database.name`.
    pub fn database_name(mut self, name: impl Into<String>) -> Self {
        self.layer.database.get_or_insert_with(DatabasePatch::default).name = Some(Some(name.into()));
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.layer
            .metadata
            .get_or_insert_with(Metadata::new)
            .insert(key.into(), value.into());
        self
    }

    /// Set any other top-level key.
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.layer.extra.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> PartialConfig {
        self.layer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_layer() {
        assert!(PartialConfig::none().is_empty());
        let layer: PartialConfig = serde_yaml::from_str("{}").unwrap();
        assert!(layer.is_empty());
    }

    #[test]
    fn test_deserialize_full_document() {
        let yaml = r#"
name: voice-reco
max_trials: 100
pool_size: 4
algorithms:
  gradient_descent:
    learning_rate: 0.1
database:
  type: mongodb
  host: db.example.com
  port: 27017
resources:
  local: [localhost, none, {}]
metadata:
  VCS: git
working_dir: /tmp/runs
"#;
        let layer: PartialConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(layer.name.as_deref(), Some("voice-reco"));
        assert_eq!(layer.max_trials, Some(MaxTrials::Limited(100)));
        assert_eq!(layer.pool_size, Some(PoolSize::Workers(4)));
        assert!(layer.algorithms.as_ref().unwrap().is_mapping());
        let database = layer.database.as_ref().unwrap();
        assert_eq!(database.db_type, Some(Some("mongodb".to_string())));
        assert_eq!(database.port, Some(Some(27017)));
        assert!(database.name.is_none());
        assert!(layer.resources.is_some());
        assert!(layer.metadata.as_ref().unwrap().contains_key("VCS"));
        assert_eq!(
            layer.extra.get("working_dir"),
            Some(&Value::String("/tmp/runs".to_string()))
        );
    }

    #[test]
    fn test_database_null_is_distinct_from_absent() {
        let layer: PartialConfig = serde_yaml::from_str("database:\n  host: null\n").unwrap();
        let database = layer.database.unwrap();

        assert_eq!(database.host, Some(None));
        assert_eq!(database.name, None);
    }

    #[test]
    fn test_database_unknown_keys_kept() {
        let layer: PartialConfig = serde_yaml::from_str("database:\n  uri: mongodb://x\n  host: h\n").unwrap();
        let database = layer.database.unwrap();

        assert_eq!(database.host, Some(Some("h".to_string())));
        assert_eq!(
            database.extra.get("uri"),
            Some(&Value::String("mongodb://x".to_string()))
        );
        assert!(!database.extra.contains_key("host"));
    }

    #[test]
    fn test_top_level_null_is_unset() {
        let layer: PartialConfig = serde_yaml::from_str("max_trials: null\nname: null\n").unwrap();
        assert!(layer.max_trials.is_none());
        assert!(layer.name.is_none());
    }

    #[test]
    fn test_builder() {
        let layer = PartialConfigBuilder::new()
            .name("exp")
            .pool_size(3)
            .database_host("10.0.0.2")
            .metadata("VCS", "git")
            .build();

        assert_eq!(layer.name.as_deref(), Some("exp"));
        assert_eq!(layer.pool_size, Some(PoolSize::Workers(3)));
        assert_eq!(layer.database.unwrap().host, Some(Some("10.0.0.2".to_string())));
        assert_eq!(
            layer.metadata.unwrap().get("VCS"),
            Some(&Value::String("git".to_string()))
        );
        assert!(layer.max_trials.is_none());
    }

    #[test]
    fn test_serialize_skips_unset() {
        let layer = PartialConfigBuilder::new().pool_size(5).build();
        let yaml = serde_yaml::to_string(&layer).unwrap();
        assert!(yaml.contains("pool_size: 5"));
        assert!(!yaml.contains("max_trials"));
    }
}
