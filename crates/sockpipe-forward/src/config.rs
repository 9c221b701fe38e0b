//! Configuration for the forwarder.
//!
//! ```toml
//! verbose = false
//!
//! [[rules]]
//! name = "web"
//! listen = "127.0.0.1:8080"
//! target = "example.com:80"
//!
//! [endpoint]
//! read_chunk_size = 32768
//! soft_limit = 16384
//!
//! [timeouts]
//! connect_timeout_secs = 10
//! ```

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sockpipe_core::defaults::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_READ_CHUNK_SIZE, DEFAULT_SOFT_LIMIT,
    DEFAULT_TCP_NO_DELAY, DEFAULT_VERBOSE,
};

use crate::error::ConfigError;

/// Top-level forwarder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardConfig {
    /// Forwarding rules: each binds one listen address to one target.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,

    /// Buffer policy for both sides of every relayed connection.
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// Timeout settings.
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Emit per-event relay diagnostic lines.
    #[serde(default = "default_verbose")]
    pub verbose: bool,
}

/// A forwarding rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Human-readable name for logging.
    pub name: String,

    /// Listen address (ip:port).
    pub listen: SocketAddr,

    /// Target address (host:port), resolved per connection.
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default = "default_read_chunk_size")]
    pub read_chunk_size: usize,

    /// Queued output at which the relay pauses the opposite side.
    #[serde(default = "default_soft_limit")]
    pub soft_limit: usize,

    #[serde(default = "default_tcp_nodelay")]
    pub tcp_nodelay: bool,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: default_read_chunk_size(),
            soft_limit: default_soft_limit(),
            tcp_nodelay: default_tcp_nodelay(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

fn default_read_chunk_size() -> usize {
    DEFAULT_READ_CHUNK_SIZE
}

fn default_soft_limit() -> usize {
    DEFAULT_SOFT_LIMIT
}

fn default_tcp_nodelay() -> bool {
    DEFAULT_TCP_NO_DELAY
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_verbose() -> bool {
    DEFAULT_VERBOSE
}

impl ForwardConfig {
    /// One rule named `default`, everything else at defaults.
    pub fn single(listen: SocketAddr, target: impl Into<String>) -> Self {
        Self {
            rules: vec![RuleConfig {
                name: "default".into(),
                listen,
                target: target.into(),
            }],
            endpoint: EndpointConfig::default(),
            timeouts: TimeoutConfig::default(),
            verbose: DEFAULT_VERBOSE,
        }
    }

    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Read and parse a TOML file, then validate it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rules.is_empty() {
            return Err(ConfigError::Validation(
                "at least one [[rules]] entry is required".into(),
            ));
        }

        let mut names = HashSet::new();
        let mut listens = HashSet::new();
        for rule in &self.rules {
            if rule.name.trim().is_empty() {
                return Err(ConfigError::Validation("rules.name is empty".into()));
            }
            if !names.insert(rule.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate rule name: {}",
                    rule.name
                )));
            }
            if !listens.insert(rule.listen) {
                return Err(ConfigError::Validation(format!(
                    "duplicate listen address: {}",
                    rule.listen
                )));
            }
            if rule.target.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "rule {}: target is empty",
                    rule.name
                )));
            }
        }

        if self.endpoint.read_chunk_size == 0 {
            return Err(ConfigError::Validation(
                "endpoint.read_chunk_size must be > 0".into(),
            ));
        }
        if self.endpoint.soft_limit == 0 {
            return Err(ConfigError::Validation(
                "endpoint.soft_limit must be > 0".into(),
            ));
        }
        if self.timeouts.connect_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "timeouts.connect_timeout_secs must be > 0".into(),
            ));
        }
        Ok(())
    }
}
