//! HTTP surface configuration. The HTTP/WebSocket transport itself is an
//! out-of-scope collaborator (spec.md §1); this section only carries the
//! bind address and CORS policy `qa-server` needs to stand the router up.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
    #[serde(default)]
    pub cors_origins: Vec<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_true() -> bool {
    true
}
fn default_request_timeout_secs() -> u64 {
    95
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: default_true(),
            cors_origins: Vec::new(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}
