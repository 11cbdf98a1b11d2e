//! Environment-variable overrides for managerial settings.
//!
//! Only the `database` group is reachable from the environment.

use std::collections::HashMap;
use std::fs;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::OnceLock;

use super::experiment::{DatabaseField, ExperimentConfig};

/// Fallback when the local hostname cannot be resolved.
pub const LOOPBACK_ADDRESS: &str = "127.0.0.1";

/// One recognized environment variable and where its value lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVar {
    /// Environment variable name.
    pub name: &'static str,
    /// Target field under `database`.
    pub field: DatabaseField,
    /// Built-in default for the target field.
    pub default: String,
}

/// Catalog of environment variables for the `database` group.
pub fn database_env_vars() -> Vec<EnvVar> {
    vec![
        EnvVar {
            name: "ORION_DB_NAME",
            field: DatabaseField::Name,
            default: "orion".to_string(),
        },
        EnvVar {
            name: "ORION_DB_TYPE",
            field: DatabaseField::Type,
            default: "MongoDB".to_string(),
        },
        EnvVar {
            name: "ORION_DB_ADDRESS",
            field: DatabaseField::Host,
            default: local_address(),
        },
    ]
}

/// Read access to environment variables.
pub trait EnvSource {
    fn var(&self, name: &str) -> Option<String>;
}

/// The current process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Return a copy of `config` with every set catalog variable applied.
///
/// Unset variables leave the current value alone. `config` is not modified.
pub fn merge_env_vars(config: &ExperimentConfig, env: &dyn EnvSource) -> ExperimentConfig {
    let mut merged = config.clone();
    for var in database_env_vars() {
        if let Some(value) = env.var(var.name) {
            log::debug!("database.{} taken from {}", var.field.key(), var.name);
            merged.database.set(var.field, Some(value));
        }
    }
    merged
}

/// Address of the local host, as resolved from its hostname.
///
/// Resolved once per process from the process environment; this is the
/// built-in `database.host` default.
pub fn local_address() -> String {
    static ADDRESS: OnceLock<String> = OnceLock::new();
    ADDRESS.get_or_init(|| resolve_local_address(&ProcessEnv)).clone()
}

/// Resolve the hostname found in `env` (`HOSTNAME`, else `/etc/hostname`),
/// preferring an IPv4 address.
pub fn resolve_local_address(env: &dyn EnvSource) -> String {
    let Some(hostname) = local_hostname(env) else {
        return LOOPBACK_ADDRESS.to_string();
    };

    match (hostname.as_str(), 0).to_socket_addrs() {
        Ok(addrs) => {
            let addrs: Vec<SocketAddr> = addrs.collect();
            addrs
                .iter()
                .find(|addr| addr.is_ipv4())
                .or_else(|| addrs.first())
                .map(|addr| addr.ip().to_string())
                .unwrap_or_else(|| LOOPBACK_ADDRESS.to_string())
        }
        Err(e) => {
            log::debug!("Could not resolve hostname {}: {}", hostname, e);
            LOOPBACK_ADDRESS.to_string()
        }
    }
}

fn local_hostname(env: &dyn EnvSource) -> Option<String> {
    env.var("HOSTNAME")
        .or_else(|| fs::read_to_string("/etc/hostname").ok())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_catalog() {
        let vars = database_env_vars();
        let names: Vec<&str> = vars.iter().map(|v| v.name).collect();
        assert_eq!(names, vec!["ORION_DB_NAME", "ORION_DB_TYPE", "ORION_DB_ADDRESS"]);
        assert_eq!(vars[0].default, "orion");
        assert_eq!(vars[1].default, "MongoDB");
        assert!(!vars[2].default.is_empty());
    }

    #[test]
    fn test_merge_sets_present_vars() {
        let config = ExperimentConfig::builtin();
        let env = env_of(&[("ORION_DB_ADDRESS", "10.0.0.9"), ("ORION_DB_TYPE", "PickledDB")]);
        let merged = merge_env_vars(&config, &env);

        assert_eq!(merged.database.host.as_deref(), Some("10.0.0.9"));
        assert_eq!(merged.database.db_type.as_deref(), Some("PickledDB"));
        assert_eq!(merged.database.name.as_deref(), Some("orion"));
    }

    #[test]
    fn test_merge_does_not_mutate_input() {
        let config = ExperimentConfig::builtin();
        let before = config.clone();
        let env = env_of(&[("ORION_DB_NAME", "other")]);
        let merged = merge_env_vars(&config, &env);

        assert_eq!(config, before);
        assert_ne!(merged, config);
    }

    #[test]
    fn test_merge_without_vars_is_identity() {
        let config = ExperimentConfig::builtin();
        let merged = merge_env_vars(&config, &HashMap::<String, String>::new());
        assert_eq!(merged, config);
    }

    #[test]
    fn test_unrelated_vars_ignored() {
        let config = ExperimentConfig::builtin();
        let env = env_of(&[("ORION_DB_PORT", "1234"), ("HOME", "/root")]);
        let merged = merge_env_vars(&config, &env);
        assert_eq!(merged, config);
    }

    #[test]
    fn test_resolve_local_address_reads_hostname_from_source() {
        let env = env_of(&[("HOSTNAME", "10.1.2.3")]);
        assert_eq!(resolve_local_address(&env), "10.1.2.3");

        let env = env_of(&[("HOSTNAME", " 192.168.0.7\n")]);
        assert_eq!(resolve_local_address(&env), "192.168.0.7");
    }

    #[test]
    fn test_local_address_is_ip() {
        let address = local_address();
        assert!(address.parse::<std::net::IpAddr>().is_ok());
    }
}
