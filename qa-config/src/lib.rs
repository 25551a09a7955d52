//! Layered configuration for the document QA orchestrator.
//!
//! Defaults are expressed as `impl Default` on each sub-config (matching
//! every `#[serde(default = "fn")]` with a free function, the teacher's
//! `voice-agent-config` idiom), loaded through the `config` crate with
//! `QA__`-prefixed environment overrides on top.

pub mod artifact;
pub mod cache;
pub mod embedding;
pub mod llm;
pub mod orchestrator;
pub mod reasoning;
pub mod retrieval;
pub mod server;
pub mod settings;
pub mod vector_index;

pub use artifact::ArtifactConfig;
pub use cache::CacheConfig;
pub use embedding::EmbeddingConfig;
pub use llm::LlmConfig;
pub use orchestrator::OrchestratorConfig;
pub use reasoning::ReasoningConfig;
pub use retrieval::{RetrievalConfig, RetrievalWeights};
pub use server::ServerConfig;
pub use settings::{load_settings, Settings};
pub use vector_index::VectorIndexConfig;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
