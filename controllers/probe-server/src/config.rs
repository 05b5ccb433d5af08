//! Probe server configuration from environment variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use scylla_client::DEFAULT_API_PORT;

use crate::error::ProbeError;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

/// Settings of one probe server, bound to a single ScyllaDB node.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeConfig {
    /// Namespace of the node's pod and member Service
    pub namespace: String,
    /// Name of the node's member Service
    pub service_name: String,
    /// Paths that must exist before the node may report ready
    pub await_paths: Vec<PathBuf>,
    pub addr: SocketAddr,
    /// Per-request deadline
    pub timeout: Duration,
    /// Port of the ScyllaDB REST API on localhost
    pub api_port: u16,
}

impl ProbeConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ProbeError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of
    /// a variable if it is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ProbeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| {
                    ProbeError::InvalidConfig(format!("{} environment variable is required", key))
                })
        };

        let namespace = required("POD_NAMESPACE")?;
        let service_name = required("SERVICE_NAME")?;

        let await_paths = lookup("AWAIT_PATHS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(PathBuf::from)
                    .collect()
            })
            .unwrap_or_default();

        let addr_value = lookup("PROBE_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr_value.parse().map_err(|e| {
            ProbeError::InvalidConfig(format!("PROBE_ADDR {:?} is not a socket address: {}", addr_value, e))
        })?;

        let timeout_seconds = match lookup("PROBE_TIMEOUT_SECONDS") {
            Some(v) => v.parse::<u64>().map_err(|e| {
                ProbeError::InvalidConfig(format!("PROBE_TIMEOUT_SECONDS {:?}: {}", v, e))
            })?,
            None => DEFAULT_TIMEOUT_SECONDS,
        };
        if timeout_seconds == 0 {
            return Err(ProbeError::InvalidConfig(
                "PROBE_TIMEOUT_SECONDS must be greater than zero".to_string(),
            ));
        }

        let api_port = match lookup("SCYLLA_API_PORT") {
            Some(v) => v
                .parse::<u16>()
                .map_err(|e| ProbeError::InvalidConfig(format!("SCYLLA_API_PORT {:?}: {}", v, e)))?,
            None => DEFAULT_API_PORT,
        };

        Ok(Self {
            namespace,
            service_name,
            await_paths,
            addr,
            timeout: Duration::from_secs(timeout_seconds),
            api_port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<ProbeConfig, ProbeError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ProbeConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("POD_NAMESPACE", "scylla"), ("SERVICE_NAME", "basic-dc1-a-0")])
            .unwrap();

        assert_eq!(config.namespace, "scylla");
        assert_eq!(config.service_name, "basic-dc1-a-0");
        assert!(config.await_paths.is_empty());
        assert_eq!(config.addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.api_port, 10000);
    }

    #[test]
    fn test_await_paths_are_comma_separated() {
        let config = config_from(&[
            ("POD_NAMESPACE", "scylla"),
            ("SERVICE_NAME", "svc"),
            ("AWAIT_PATHS", "/mnt/ready, /var/lib/scylla/.prewarmed,,"),
            ("PROBE_TIMEOUT_SECONDS", "5"),
        ])
        .unwrap();

        assert_eq!(
            config.await_paths,
            vec![
                PathBuf::from("/mnt/ready"),
                PathBuf::from("/var/lib/scylla/.prewarmed")
            ]
        );
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_missing_service_name_is_rejected() {
        let err = config_from(&[("POD_NAMESPACE", "scylla")]).unwrap_err();
        assert!(matches!(err, ProbeError::InvalidConfig(ref msg) if msg.contains("SERVICE_NAME")));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let base = [("POD_NAMESPACE", "scylla"), ("SERVICE_NAME", "svc")];

        for (key, value) in [
            ("PROBE_ADDR", "not-an-address"),
            ("PROBE_TIMEOUT_SECONDS", "soon"),
            ("PROBE_TIMEOUT_SECONDS", "0"),
            ("SCYLLA_API_PORT", "70000"),
        ] {
            let mut vars = base.to_vec();
            vars.push((key, value));
            assert!(
                matches!(config_from(&vars), Err(ProbeError::InvalidConfig(_))),
                "{}={} must be rejected",
                key,
                value
            );
        }
    }
}
