//! Reasoning Agent configuration: context budget and the fallback ladder
//! (spec.md §4.4).

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningConfig {
    /// The external model's context window, in tokens.
    #[serde(default = "default_context_window")]
    pub context_window_tokens: usize,
    /// Reserved for system directive + query + expected response.
    #[serde(default = "default_reserved_tokens")]
    pub reserved_tokens: usize,
    /// `words -> tokens` estimate multiplier (`ceil(words * factor)`).
    #[serde(default = "default_token_estimate_factor")]
    pub token_estimate_factor: f32,
    /// A single chunk longer than this (in estimated tokens) is truncated,
    /// keeping its leading and trailing sentences.
    #[serde(default = "default_per_chunk_token_cap")]
    pub per_chunk_token_cap: usize,

    /// Level 1's total character budget across at most its top-2 chunks.
    #[serde(default = "default_simplified_char_cap")]
    pub simplified_char_cap: usize,
    /// Level 1 considers at most this many chunks.
    #[serde(default = "default_simplified_chunk_count")]
    pub simplified_chunk_count: usize,
    /// Level 2 returns between this many and `direct_extraction_max_sentences`.
    #[serde(default = "default_direct_extraction_min_sentences")]
    pub direct_extraction_min_sentences: usize,
    #[serde(default = "default_direct_extraction_max_sentences")]
    pub direct_extraction_max_sentences: usize,

    /// An answer shorter than this is treated as a fallback trigger.
    #[serde(default = "default_min_answer_chars")]
    pub min_answer_chars: usize,
}

fn default_context_window() -> usize {
    2048
}
fn default_reserved_tokens() -> usize {
    800
}
fn default_token_estimate_factor() -> f32 {
    1.3
}
fn default_per_chunk_token_cap() -> usize {
    400
}
fn default_simplified_char_cap() -> usize {
    2000
}
fn default_simplified_chunk_count() -> usize {
    2
}
fn default_direct_extraction_min_sentences() -> usize {
    3
}
fn default_direct_extraction_max_sentences() -> usize {
    5
}
fn default_min_answer_chars() -> usize {
    20
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            context_window_tokens: default_context_window(),
            reserved_tokens: default_reserved_tokens(),
            token_estimate_factor: default_token_estimate_factor(),
            per_chunk_token_cap: default_per_chunk_token_cap(),
            simplified_char_cap: default_simplified_char_cap(),
            simplified_chunk_count: default_simplified_chunk_count(),
            direct_extraction_min_sentences: default_direct_extraction_min_sentences(),
            direct_extraction_max_sentences: default_direct_extraction_max_sentences(),
            min_answer_chars: default_min_answer_chars(),
        }
    }
}

impl ReasoningConfig {
    pub fn evidence_token_budget(&self) -> usize {
        self.context_window_tokens.saturating_sub(self.reserved_tokens)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reserved_tokens >= self.context_window_tokens {
            return Err(ConfigError::InvalidValue {
                field: "reasoning.reserved_tokens".to_string(),
                message: "reserved_tokens must leave room for evidence in the context window"
                    .to_string(),
            });
        }
        if self.direct_extraction_min_sentences > self.direct_extraction_max_sentences {
            return Err(ConfigError::InvalidValue {
                field: "reasoning.direct_extraction_min_sentences".to_string(),
                message: "must not exceed direct_extraction_max_sentences".to_string(),
            });
        }
        Ok(())
    }
}
