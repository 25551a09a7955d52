//! The `/completion` wire contract (spec.md §6). Tolerant of either JSON
//! shape variant the model server may return, as long as it has a `content`
//! field somewhere.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub prompt: String,
    pub max_tokens: usize,
    pub temperature: f32,
}

/// Some deployments nest the text under `choices[0].text`, others return a
/// flat `content` field directly. We read whichever is present and trim.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub text: Option<String>,
}

impl CompletionResponse {
    pub fn text(&self) -> String {
        self.content
            .clone()
            .or_else(|| self.choices.first().and_then(|c| c.text.clone()))
            .unwrap_or_default()
            .trim()
            .to_string()
    }
}

/// Obvious error markers a model sometimes emits instead of a clean
/// rejection. A response starting with one of these is treated as invalid
/// rather than a real answer.
pub const ERROR_MARKERS: &[&str] = &["error:", "[error]", "exception:", "traceback"];

pub fn looks_like_error(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    ERROR_MARKERS.iter().any(|m| lower.starts_with(m))
}
