//! Configuration for store connections and the cursor cache.
//!
//! # Example
//!
//! ```
//! use elastic_model::config::{ElasticConfig, ConnectionConfig};
//!
//! // Minimal config (uses defaults)
//! let config = ElasticConfig::default();
//! assert_eq!(config.cursor_prefix, "elastic");
//!
//! // Full config with a named connection group
//! let mut config = ElasticConfig::default();
//! config.connections.insert("default".into(), ConnectionConfig {
//!     hosts: vec!["http://127.0.0.1:9200".into()],
//!     ..Default::default()
//! });
//! ```

use std::collections::HashMap;

use serde::Deserialize;

/// Configuration for the query layer.
///
/// Connections are named groups (one group per cluster), each carrying its
/// own hosts and credentials. At minimum you should configure the `default`
/// group for production use.
#[derive(Debug, Clone, Deserialize)]
pub struct ElasticConfig {
    /// Named connection groups.
    #[serde(default)]
    pub connections: HashMap<String, ConnectionConfig>,

    /// Key prefix for deep-pagination cursor cache entries.
    #[serde(default = "default_cursor_prefix")]
    pub cursor_prefix: String,
}

/// A single connection group.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    /// Store endpoints (e.g. `http://127.0.0.1:9200`).
    #[serde(default)]
    pub hosts: Vec<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Send basic-auth credentials and pin the CA bundle below.
    #[serde(default)]
    pub enable_ssl: bool,

    /// CA bundle path, used when `enable_ssl` is set.
    #[serde(default)]
    pub ca_cert_path: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
}

fn default_cursor_prefix() -> String {
    "elastic".to_string()
}
fn default_timeout_secs() -> f64 {
    2.0
}

impl Default for ElasticConfig {
    fn default() -> Self {
        Self {
            connections: HashMap::new(),
            cursor_prefix: default_cursor_prefix(),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            hosts: Vec::new(),
            username: None,
            password: None,
            enable_ssl: false,
            ca_cert_path: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ElasticConfig {
    /// Look up a connection group by name.
    pub fn connection(&self, group: &str) -> Option<&ConnectionConfig> {
        self.connections.get(group)
    }
}
