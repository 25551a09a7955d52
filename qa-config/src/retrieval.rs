//! Hybrid Retrieval Agent configuration (spec.md §4.3).

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Fusion weights across the three sub-searches. Renormalized per-query
/// over whichever sources actually produced results (spec.md §9 Open
/// Question: the default is configurable, not load-bearing).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetrievalWeights {
    #[serde(default = "default_vector_weight")]
    pub vector: f32,
    #[serde(default = "default_keyword_weight")]
    pub keyword: f32,
    #[serde(default = "default_section_weight")]
    pub section: f32,
}

fn default_vector_weight() -> f32 {
    0.6
}
fn default_keyword_weight() -> f32 {
    0.3
}
fn default_section_weight() -> f32 {
    0.1
}

impl Default for RetrievalWeights {
    fn default() -> Self {
        Self {
            vector: default_vector_weight(),
            keyword: default_keyword_weight(),
            section: default_section_weight(),
        }
    }
}

impl RetrievalWeights {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vector < 0.0 || self.keyword < 0.0 || self.section < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "retrieval.weights".to_string(),
                message: "fusion weights must be non-negative".to_string(),
            });
        }
        if self.vector + self.keyword + self.section <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "retrieval.weights".to_string(),
                message: "at least one fusion weight must be positive".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default)]
    pub weights: RetrievalWeights,

    /// `top_k` when the query is short (spec.md §4.1).
    #[serde(default = "default_top_k_short")]
    pub top_k_short: usize,
    /// `top_k` when the query has more than 10 whitespace tokens.
    #[serde(default = "default_top_k_long")]
    pub top_k_long: usize,
    /// Query token-count threshold above which `top_k_long` applies.
    #[serde(default = "default_long_query_threshold")]
    pub long_query_token_threshold: usize,

    /// Multiplier applied to the fused score of `table`-typed chunks when
    /// the query is numerical/extraction or contains a unit token.
    #[serde(default = "default_table_boost")]
    pub table_boost_factor: f32,

    /// Per-sub-search timeout (spec.md §5).
    #[serde(default = "default_sub_search_timeout_secs")]
    pub sub_search_timeout_secs: u64,
}

fn default_top_k_short() -> usize {
    10
}
fn default_top_k_long() -> usize {
    15
}
fn default_long_query_threshold() -> usize {
    10
}
fn default_table_boost() -> f32 {
    1.5
}
fn default_sub_search_timeout_secs() -> u64 {
    10
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            weights: RetrievalWeights::default(),
            top_k_short: default_top_k_short(),
            top_k_long: default_top_k_long(),
            long_query_token_threshold: default_long_query_threshold(),
            table_boost_factor: default_table_boost(),
            sub_search_timeout_secs: default_sub_search_timeout_secs(),
        }
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()
    }

    pub fn top_k_for(&self, query_token_count: usize) -> usize {
        if query_token_count > self.long_query_token_threshold {
            self.top_k_long
        } else {
            self.top_k_short
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_are_the_spec_default() {
        let w = RetrievalWeights::default();
        assert_eq!((w.vector, w.keyword, w.section), (0.6, 0.3, 0.1));
        assert!(w.validate().is_ok());
    }

    #[test]
    fn negative_weight_fails_validation() {
        let w = RetrievalWeights {
            vector: -0.1,
            ..Default::default()
        };
        assert!(w.validate().is_err());
    }

    #[test]
    fn top_k_switches_on_token_threshold() {
        let cfg = RetrievalConfig::default();
        assert_eq!(cfg.top_k_for(5), 10);
        assert_eq!(cfg.top_k_for(11), 15);
    }
}
