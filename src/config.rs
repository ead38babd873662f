//! External configuration surface: TOML in, a validated [`Config`] out.
//!
//! Grounded on `original_source/internal/register/register.go`'s `Config`
//! struct, widened to cover the ring and HTTP settings this crate's discovery
//! and node-client modules need. Parsing itself is a thin `serde` + `toml`
//! pass; this crate does not watch the file for changes (out of scope).

use crate::error::{CacheError, CacheResult};
use serde::{Deserialize, Serialize};

fn default_replicas() -> usize {
    crate::consts::DEFAULT_REPLICAS
}

fn default_lease_ttl_secs() -> u64 {
    10
}

fn default_dial_timeout_secs() -> u64 {
    5
}

fn default_protocol() -> String {
    "http".to_string()
}

fn default_port() -> String {
    "2020".to_string()
}

/// Process-level configuration, typically loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Coordination-service endpoints (e.g. etcd cluster members).
    pub endpoints: Vec<String>,
    /// Virtual replicas per node on the consistent hash ring.
    #[serde(default = "default_replicas")]
    pub replicas: usize,
    /// Seconds between lease renewals with the coordination service.
    #[serde(default = "default_lease_ttl_secs")]
    pub lease_ttl_secs: u64,
    /// Per-request dial/connect timeout for peer transport.
    #[serde(default = "default_dial_timeout_secs")]
    pub dial_timeout_secs: u64,
    /// This node's reachable address, e.g. `192.168.1.11`.
    pub node_addr: String,
    /// This node's logical name, e.g. `node1`.
    pub node_name: String,
    /// Transport protocol; only `http` is currently supported.
    #[serde(default = "default_protocol")]
    pub protocol: String,
    /// Listen port for the serve endpoint.
    #[serde(default = "default_port")]
    pub port: String,
}

impl Config {
    /// Parses and validates a config from TOML text.
    pub fn from_toml(text: &str) -> CacheResult<Self> {
        let config: Config =
            toml::from_str(text).map_err(|e| CacheError::Validation(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the fields the distilled spec calls out as required.
    pub fn validate(&self) -> CacheResult<()> {
        if self.endpoints.is_empty() {
            return Err(CacheError::Validation(
                "endpoints must not be empty".into(),
            ));
        }
        if self.node_addr.is_empty() {
            return Err(CacheError::Validation("node_addr must not be empty".into()));
        }
        if self.node_name.is_empty() {
            return Err(CacheError::Validation("node_name must not be empty".into()));
        }
        if self.protocol != "http" {
            return Err(CacheError::Validation(format!(
                "unsupported protocol {:?}; only \"http\" is implemented",
                self.protocol
            )));
        }
        Ok(())
    }

    /// This node's full reachable endpoint, e.g. `http://192.168.1.11:2020`.
    pub fn self_endpoint(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.node_addr, self.port)
    }
}
