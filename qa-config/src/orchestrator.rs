//! Orchestrator-level policy: the refinement loop and the end-to-end
//! deadline (spec.md §4.1, §5).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Verification confidence below which a refinement attempt is made.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
    /// Maximum number of refinement attempts (spec.md: "< 2").
    #[serde(default = "default_max_refinements")]
    pub max_refinement_attempts: u32,
    /// End-to-end soft deadline; past this the orchestrator short-circuits
    /// to a graceful-fallback Response.
    #[serde(default = "default_deadline_secs")]
    pub soft_deadline_secs: u64,
}

fn default_confidence_threshold() -> f32 {
    0.7
}
fn default_max_refinements() -> u32 {
    2
}
fn default_deadline_secs() -> u64 {
    90
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            max_refinement_attempts: default_max_refinements(),
            soft_deadline_secs: default_deadline_secs(),
        }
    }
}
