//! The terminal record returned to the caller.

use serde::{Deserialize, Serialize};

use crate::answer::{Citation, FallbackLevel, ImageRef};
use crate::artifact::Artifact;
use crate::error::ErrorKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseError {
    pub kind: ErrorKind,
    pub message: String,
}

/// `{ success, answer, confidence, verified, sources, images, artifact,
/// language, fallback_used, from_cache, error? }` of spec.md §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    pub answer: String,
    pub confidence: f32,
    pub verified: bool,
    pub sources: Vec<Citation>,
    pub images: Vec<ImageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<Artifact>,
    pub language: String,
    pub fallback_used: Option<FallbackLevel>,
    pub from_cache: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

impl Response {
    /// Build a terminal failure response. Never carries a stack trace —
    /// only the sanitized `message` and the sources gathered so far, if any.
    pub fn failure(kind: ErrorKind, message: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            success: false,
            answer: String::new(),
            confidence: 0.0,
            verified: false,
            sources: Vec::new(),
            images: Vec::new(),
            artifact: None,
            language: language.into(),
            fallback_used: None,
            from_cache: false,
            error: Some(ResponseError {
                kind,
                message: message.into(),
            }),
        }
    }

    pub fn with_sources(mut self, sources: Vec<Citation>) -> Self {
        self.sources = sources;
        self
    }

    /// Checks the invariants of spec.md §3/§8 that hold regardless of how
    /// the response was assembled. Used by orchestrator tests, not on the
    /// hot path.
    pub fn check_invariants(&self) -> bool {
        if self.success && self.answer.chars().count() < 20 {
            return false;
        }
        if self.verified != (self.confidence >= 0.7) {
            return false;
        }
        if self.images.len() > 3 {
            return false;
        }
        let mut seen = std::collections::HashSet::new();
        for img in &self.images {
            if !seen.insert(&img.path) {
                return false;
            }
        }
        true
    }
}
