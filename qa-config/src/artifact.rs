//! Artifact-generation policy (spec.md §4.1).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Phrases in the raw query that, on match, trigger artifact generation.
    #[serde(default = "default_keywords")]
    pub trigger_keywords: Vec<String>,
    /// Intents that always trigger artifact generation.
    #[serde(default = "default_trigger_intents")]
    pub trigger_intents: Vec<String>,
    /// Answer length above which structural markers alone can trigger it.
    #[serde(default = "default_length_threshold")]
    pub length_threshold_chars: usize,
}

fn default_keywords() -> Vec<String> {
    [
        "create report",
        "generate summary",
        "list all",
        "compare",
        "comprehensive analysis",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_trigger_intents() -> Vec<String> {
    ["report_generation", "data_extraction", "comparison", "analysis"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_length_threshold() -> usize {
    1500
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            trigger_keywords: default_keywords(),
            trigger_intents: default_trigger_intents(),
            length_threshold_chars: default_length_threshold(),
        }
    }
}
