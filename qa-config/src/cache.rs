//! Response cache and failure log configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_db_path")]
    pub sqlite_path: String,
    #[serde(default = "default_ttl_seconds")]
    pub default_ttl_seconds: u64,
    #[serde(default = "default_failure_log_path")]
    pub failure_log_path: String,
}

fn default_db_path() -> String {
    "data/response_cache.sqlite3".to_string()
}
fn default_ttl_seconds() -> u64 {
    3600
}
fn default_failure_log_path() -> String {
    "data/failures.jsonl".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            sqlite_path: default_db_path(),
            default_ttl_seconds: default_ttl_seconds(),
            failure_log_path: default_failure_log_path(),
        }
    }
}
