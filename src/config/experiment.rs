//! Effective experiment configuration (resolved from all layers).
//!
//! This is the record every source is merged into.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};
use serde_yaml::Value;

use super::env::database_env_vars;
use super::partial::{CmdlineArgs, DatabasePatch, PartialConfig};
use crate::error::{OrionError, Result};

/// Free-form run metadata (user, script, VCS info, ...).
pub type Metadata = BTreeMap<String, Value>;

/// Effective configuration for one experiment run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentConfig {
    /// Experiment's unique name. Required once resolution completes.
    pub name: Option<String>,

    /// Maximum number of trial evaluations.
    pub max_trials: MaxTrials,

    /// Number of workers evaluating in parallel.
    pub pool_size: PoolSize,

    /// Optimizer name, or `{optimizer: method-specific config}`.
    pub algorithms: Value,

    /// Database settings (grouped key, merged field by field).
    pub database: DatabaseConfig,

    /// `{resource_alias: (entry_address, scheduler, scheduler_ops)}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Value>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,

    /// Any other top-level setting.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ExperimentConfig {
    /// Built-in defaults, seeded before any default file is read.
    pub fn builtin() -> Self {
        let mut database = DatabaseConfig::default();
        for var in database_env_vars() {
            database.set(var.field, Some(var.default));
        }

        Self {
            name: None,
            max_trials: MaxTrials::Unbounded,
            pool_size: PoolSize::Workers(super::DEFAULT_POOL_SIZE),
            algorithms: Value::String(super::DEFAULT_ALGORITHM.to_string()),
            database,
            resources: None,
            metadata: Metadata::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Overlay one file-shaped layer.
    ///
    /// `database` merges field by field and does not null-check. Every other
    /// key is replaced wholesale, and only when the layer sets it.
    pub fn apply(&mut self, layer: &PartialConfig) {
        if let Some(name) = &layer.name {
            self.name = Some(name.clone());
        }
        if let Some(max_trials) = layer.max_trials {
            self.max_trials = max_trials;
        }
        if let Some(pool_size) = &layer.pool_size {
            self.pool_size = pool_size.clone();
        }
        if let Some(algorithms) = &layer.algorithms {
            self.algorithms = algorithms.clone();
        }
        if let Some(patch) = &layer.database {
            self.database.apply(patch);
        }
        if let Some(resources) = &layer.resources {
            self.resources = Some(resources.clone());
        }
        if let Some(metadata) = &layer.metadata {
            self.metadata = metadata.clone();
        }
        for (key, value) in &layer.extra {
            if !value.is_null() {
                self.extra.insert(key.clone(), value.clone());
            }
        }
    }

    /// Overlay the command-line layer. `metadata` merges key by key here.
    pub fn apply_cmdline(&mut self, args: &CmdlineArgs) {
        if let Some(name) = &args.name {
            self.name = Some(name.clone());
        }
        if let Some(max_trials) = args.max_trials {
            self.max_trials = max_trials;
        }
        if let Some(pool_size) = &args.pool_size {
            self.pool_size = pool_size.clone();
        }
        if let Some(metadata) = &args.metadata {
            for (key, value) in metadata {
                self.metadata.insert(key.clone(), value.clone());
            }
        }
        for (key, value) in &args.extra {
            if !value.is_null() {
                self.extra.insert(key.clone(), value.clone());
            }
        }
    }

    /// Express this configuration as a layer that sets every field.
    pub fn to_partial(&self) -> PartialConfig {
        PartialConfig {
            name: self.name.clone(),
            max_trials: Some(self.max_trials),
            pool_size: Some(self.pool_size.clone()),
            algorithms: Some(self.algorithms.clone()),
            database: Some(self.database.to_patch()),
            resources: self.resources.clone(),
            metadata: Some(self.metadata.clone()),
            extra: self.extra.clone(),
        }
    }

    /// The experiment name, or `MissingName` if no source provided one.
    pub fn require_name(&self) -> Result<&str> {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => Ok(name),
            _ => Err(OrionError::MissingName),
        }
    }
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Database settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatabaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub db_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Backend-specific keys (`uri`, `replica_set`, ...).
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// String-valued database fields that environment variables can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseField {
    Name,
    Type,
    Host,
}

impl DatabaseField {
    /// Key of this field inside the `database` mapping.
    pub fn key(&self) -> &'static str {
        match self {
            DatabaseField::Name => "name",
            DatabaseField::Type => "type",
            DatabaseField::Host => "host",
        }
    }
}

impl DatabaseConfig {
    pub fn set(&mut self, field: DatabaseField, value: Option<String>) {
        match field {
            DatabaseField::Name => self.name = value,
            DatabaseField::Type => self.db_type = value,
            DatabaseField::Host => self.host = value,
        }
    }

    /// Merge every field the patch mentions, explicit nulls included.
    pub fn apply(&mut self, patch: &DatabasePatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(db_type) = &patch.db_type {
            self.db_type = db_type.clone();
        }
        if let Some(host) = &patch.host {
            self.host = host.clone();
        }
        if let Some(port) = patch.port {
            self.port = port;
        }
        if let Some(username) = &patch.username {
            self.username = username.clone();
        }
        if let Some(password) = &patch.password {
            self.password = password.clone();
        }
        for (key, value) in &patch.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }

    fn to_patch(&self) -> DatabasePatch {
        DatabasePatch {
            name: Some(self.name.clone()),
            db_type: Some(self.db_type.clone()),
            host: Some(self.host.clone()),
            port: Some(self.port),
            username: Some(self.username.clone()),
            password: Some(self.password.clone()),
            extra: self.extra.clone(),
        }
    }
}

/// Trial budget: unbounded (run until preempted) or a fixed count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawMaxTrials")]
pub enum MaxTrials {
    Unbounded,
    Limited(u64),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMaxTrials {
    Int(u64),
    Float(f64),
    Text(String),
}

impl TryFrom<RawMaxTrials> for MaxTrials {
    type Error = String;

    fn try_from(raw: RawMaxTrials) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawMaxTrials::Int(count) => Ok(MaxTrials::Limited(count)),
            RawMaxTrials::Float(value) if value == f64::INFINITY => Ok(MaxTrials::Unbounded),
            RawMaxTrials::Float(value) if value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 => {
                Ok(MaxTrials::Limited(value as u64))
            }
            RawMaxTrials::Float(value) => Err(format!("invalid max_trials: {}", value)),
            RawMaxTrials::Text(text) => text.parse(),
        }
    }
}

impl FromStr for MaxTrials {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "inf" | ".inf" | "infinity" => Ok(MaxTrials::Unbounded),
            _ => s
                .parse::<u64>()
                .map(MaxTrials::Limited)
                .map_err(|_| format!("invalid max_trials '{}': expected a count or 'inf'", s)),
        }
    }
}

impl Serialize for MaxTrials {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            MaxTrials::Unbounded => serializer.serialize_str("inf"),
            MaxTrials::Limited(count) => serializer.serialize_u64(*count),
        }
    }
}

impl fmt::Display for MaxTrials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxTrials::Unbounded => write!(f, "inf"),
            MaxTrials::Limited(count) => write!(f, "{}", count),
        }
    }
}

/// Worker pool: one count, or a count per resource alias.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PoolSize {
    Workers(u32),
    PerResource(BTreeMap<String, u32>),
}
