//! Dense embedder configuration for the Hybrid Retrieval Agent's vector
//! sub-search (spec.md §4.3: "Embed the query using the same model used at
//! ingestion").

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_model_repo")]
    pub model_repo: String,
    #[serde(default = "default_revision")]
    pub revision: String,
    #[serde(default)]
    pub cache_dir: Option<String>,
    #[serde(default = "default_max_sequence_length")]
    pub max_sequence_length: usize,
}

fn default_model_repo() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}
fn default_revision() -> String {
    "main".to_string()
}
fn default_max_sequence_length() -> usize {
    256
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_repo: default_model_repo(),
            revision: default_revision(),
            cache_dir: None,
            max_sequence_length: default_max_sequence_length(),
        }
    }
}
