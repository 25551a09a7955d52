//! The Reasoning Agent's output before Verification scores it.

use serde::{Deserialize, Serialize};

/// A `(filename, page)` citation. Page is rendered 1-based here; the
/// underlying chunk metadata stores it 0-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Citation {
    pub filename: String,
    pub page: u32,
}

/// An image reference surfaced alongside the answer, drawn only from the
/// top-3 evidence entries and deduplicated by path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    pub path: String,
    pub page: u32,
    pub filename: String,
}

/// Which reasoning fallback level produced the answer, if not the primary path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackLevel {
    SimplifiedReasoning,
    DirectExtraction,
    Graceful,
}

impl FallbackLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackLevel::SimplifiedReasoning => "simplified_reasoning",
            FallbackLevel::DirectExtraction => "direct_extraction",
            FallbackLevel::Graceful => "graceful",
        }
    }
}

impl std::fmt::Display for FallbackLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text plus structured citations plus image references, from at most the
/// top-3 retrieved chunks for images.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerDraft {
    pub text: String,
    pub citations: Vec<Citation>,
    pub images: Vec<ImageRef>,
    pub fallback_used: Option<FallbackLevel>,
    /// Set when a single chunk was truncated to fit the context budget.
    pub truncated: bool,
}

impl AnswerDraft {
    pub fn is_acceptable(&self) -> bool {
        self.text.trim().chars().count() >= 20
    }
}
