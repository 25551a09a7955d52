//! LLM Client configuration (spec.md §4.6).

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,

    /// Minimum length for a generated response to be accepted; shorter
    /// output is treated as a validation failure and retried.
    #[serde(default = "default_min_response_chars")]
    pub min_response_chars: usize,

    /// Outbound model concurrency cap (spec.md §5: "no more than 2
    /// in-flight calls" by default).
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,

    /// Per-image size cap before multimodal attachment, in bytes.
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
}

fn default_endpoint() -> String {
    "http://localhost:8000".to_string()
}
fn default_model() -> String {
    "default".to_string()
}
fn default_max_tokens() -> usize {
    512
}
fn default_temperature() -> f32 {
    0.2
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    3
}
fn default_initial_backoff_ms() -> u64 {
    500
}
fn default_max_backoff_secs() -> u64 {
    30
}
fn default_min_response_chars() -> usize {
    20
}
fn default_concurrency_limit() -> usize {
    2
}
fn default_max_image_bytes() -> usize {
    5 * 1024 * 1024
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_secs: default_max_backoff_secs(),
            min_response_chars: default_min_response_chars(),
            concurrency_limit: default_concurrency_limit(),
            max_image_bytes: default_max_image_bytes(),
        }
    }
}

impl LlmConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "llm.concurrency_limit".to_string(),
                message: "must allow at least one in-flight call".to_string(),
            });
        }
        if self.max_retries > 10 {
            return Err(ConfigError::InvalidValue {
                field: "llm.max_retries".to_string(),
                message: "unreasonably large retry count".to_string(),
            });
        }
        Ok(())
    }
}
