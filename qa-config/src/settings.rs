//! The top-level `Settings` tree and its loader.

use serde::{Deserialize, Serialize};

use crate::artifact::ArtifactConfig;
use crate::cache::CacheConfig;
use crate::embedding::EmbeddingConfig;
use crate::llm::LlmConfig;
use crate::orchestrator::OrchestratorConfig;
use crate::reasoning::ReasoningConfig;
use crate::retrieval::RetrievalConfig;
use crate::server::ServerConfig;
use crate::vector_index::VectorIndexConfig;
use crate::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub reasoning: ReasoningConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub artifact: ArtifactConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub vector_index: VectorIndexConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Settings {
    /// Rejects a configuration no deployment should run with: a fusion
    /// weight vector with no positive entry, a concurrency cap of zero, a
    /// reasoning token budget that leaves no room for evidence, etc.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.retrieval.validate()?;
        self.reasoning.validate()?;
        self.llm.validate()?;
        Ok(())
    }
}

/// Loads layered TOML defaults + `QA_`-prefixed environment overrides,
/// matching the teacher's `Settings` / `load_settings` pattern.
pub fn load_settings(config_path: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = config::Config::builder()
        .add_source(config::Config::try_from(&Settings::default())?);

    if let Some(path) = config_path {
        builder = builder.add_source(config::File::with_name(path).required(false));
    }

    let builder = builder.add_source(
        config::Environment::with_prefix("QA")
            .separator("__")
            .try_parsing(true),
    );

    let settings: Settings = builder.build()?.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_validate() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn load_settings_with_no_file_uses_defaults() {
        let settings = load_settings(None).expect("defaults should load");
        assert_eq!(settings.retrieval.top_k_short, 10);
        assert_eq!(settings.orchestrator.soft_deadline_secs, 90);
    }
}
