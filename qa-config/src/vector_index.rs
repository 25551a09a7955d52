//! The vector index collaborator's connection settings (spec.md §6).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndexConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_vector_dim")]
    pub vector_dim: usize,
    #[serde(default)]
    pub api_key: Option<String>,
    /// When true, use the in-process in-memory index instead of connecting
    /// to Qdrant. Convenient for local development and for the test suite;
    /// never the default in a packaged deployment.
    #[serde(default)]
    pub in_memory: bool,
}

fn default_endpoint() -> String {
    "http://localhost:6334".to_string()
}
fn default_collection() -> String {
    "qa_knowledge_base".to_string()
}
fn default_vector_dim() -> usize {
    384
}

impl Default for VectorIndexConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            collection: default_collection(),
            vector_dim: default_vector_dim(),
            api_key: None,
            in_memory: false,
        }
    }
}
