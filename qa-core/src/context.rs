//! The execution context: a per-query, append-only bag of agent outputs.
//!
//! Modelled as a struct with `Option<T>` fields populated strictly in
//! pipeline order rather than a stringly-typed map, per the "no hidden
//! aliasing" design note — each agent only ever writes the fields it owns,
//! and nothing downstream can see a write that hasn't happened yet.

use serde::{Deserialize, Serialize};

use crate::answer::{Citation, FallbackLevel, ImageRef};
use crate::artifact::Artifact;
use crate::query::Query;
use crate::search::EvidenceSet;

/// The query's classification, as produced by Query Understanding (§4.2).
///
/// `Comparison` is the classification §4.2's comparator rule actually
/// produces; spec.md §3 names this variant "specialized" without a matching
/// production rule anywhere in §4.2, so the two are reconciled here in
/// favor of the rule that is actually specified (see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    Casual,
    Comparison,
    Research,
    Analytical,
    Factual,
    Extraction,
    Numerical,
}

impl QueryType {
    pub fn is_casual(&self) -> bool {
        matches!(self, QueryType::Casual)
    }
}

/// Intent tags the Orchestrator's artifact rule matches against. Open-ended
/// by design (spec.md never enumerates the full intent vocabulary), but the
/// four names the artifact rule checks are named constants here so a typo
/// can't silently disable the rule.
pub mod intent {
    pub const REPORT_GENERATION: &str = "report_generation";
    pub const DATA_EXTRACTION: &str = "data_extraction";
    pub const COMPARISON: &str = "comparison";
    pub const ANALYSIS: &str = "analysis";
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionContext {
    // Written by the orchestrator's pre-processing step.
    pub user_query: String,
    pub original_query: String,
    pub language: Option<String>,

    // Written by Query Understanding.
    pub intent: Option<String>,
    pub query_type: Option<QueryType>,
    pub keywords: Vec<String>,

    // Written by the orchestrator before Retrieval.
    pub top_k: Option<usize>,

    // Written by Hybrid Retrieval.
    #[serde(skip)]
    pub retrieved: Option<EvidenceSet>,

    // Written by Reasoning.
    pub answer: Option<String>,
    pub fallback_used: Option<FallbackLevel>,
    pub truncated: bool,
    pub sources: Vec<Citation>,
    pub images: Vec<ImageRef>,
    /// How many evidence entries the Reasoning Agent actually drew on for
    /// the current answer. Compared against the full evidence set's length
    /// by the orchestrator's refinement rule ("evidence set is larger than
    /// the slice already used", spec.md §4.1).
    pub evidence_used: usize,

    // Written by Verification.
    pub confidence: Option<f32>,
    pub verified: Option<bool>,

    // Written by the orchestrator's post-processing step.
    pub artifact: Option<Artifact>,
}

impl ExecutionContext {
    pub fn new(query: &Query) -> Self {
        Self {
            user_query: query.text.clone(),
            original_query: query.text.clone(),
            ..Default::default()
        }
    }
}
