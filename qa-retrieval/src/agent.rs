//! The Hybrid Retrieval Agent: runs the three sub-searches concurrently,
//! fuses their results, and returns a deduplicated `EvidenceSet`.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use qa_config::RetrievalConfig;
use qa_core::context::QueryType;
use qa_core::search::EvidenceSet;
use qa_core::traits::{Agent, VectorIndex};
use qa_core::{ExecutionContext, Result};
use regex::Regex;

use crate::embedder::Embedder;
use crate::error::RetrievalError;
use crate::{dense, fusion, lexical, section};

static UNIT_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b\d+(\.\d+)?\s*(%|percent|kg|km|mg|ml|usd|inr|rs|dollars?|rupees?|years?|months?|days?)\b")
        .expect("unit token pattern is valid")
});

pub struct HybridRetrievalAgent {
    config: RetrievalConfig,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl HybridRetrievalAgent {
    pub fn new(config: RetrievalConfig, embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self { config, embedder, index }
    }

    fn wants_table_boost(&self, context: &ExecutionContext) -> bool {
        let typed = matches!(
            context.query_type,
            Some(QueryType::Numerical) | Some(QueryType::Extraction)
        );
        typed || UNIT_TOKEN.is_match(&context.user_query)
    }

    async fn run_sub_searches(
        &self,
        query: &str,
        keywords: &[String],
        top_k: usize,
    ) -> (
        Vec<qa_core::search::SearchResult>,
        Vec<qa_core::search::SearchResult>,
        Vec<qa_core::search::SearchResult>,
    ) {
        let timeout = std::time::Duration::from_secs(self.config.sub_search_timeout_secs);

        let dense_future = tokio::time::timeout(timeout, dense::search(query, top_k, &self.embedder, &self.index));
        let lexical_future = tokio::time::timeout(timeout, lexical::search(keywords, top_k, &self.index));
        let section_future = tokio::time::timeout(timeout, section::search(query, top_k, &self.index));

        let (dense_result, lexical_result, section_result) =
            tokio::join!(dense_future, lexical_future, section_future);

        let log_failure = |name: &str, err: &dyn std::fmt::Display| {
            tracing::warn!(sub_search = name, error = %err, "sub-search degraded, continuing with remaining sources");
        };

        let vector = match dense_result {
            Ok(Ok(results)) => results,
            Ok(Err(e)) => {
                log_failure("dense", &e);
                Vec::new()
            }
            Err(_) => {
                log_failure("dense", &RetrievalError::Timeout(self.config.sub_search_timeout_secs));
                Vec::new()
            }
        };

        let keyword = match lexical_result {
            Ok(Ok(results)) => results,
            Ok(Err(e)) => {
                log_failure("lexical", &e);
                Vec::new()
            }
            Err(_) => {
                log_failure("lexical", &RetrievalError::Timeout(self.config.sub_search_timeout_secs));
                Vec::new()
            }
        };

        let section_results = match section_result {
            Ok(Ok(results)) => results,
            Ok(Err(e)) => {
                log_failure("section", &e);
                Vec::new()
            }
            Err(_) => {
                log_failure("section", &RetrievalError::Timeout(self.config.sub_search_timeout_secs));
                Vec::new()
            }
        };

        (vector, keyword, section_results)
    }
}

#[async_trait]
impl Agent for HybridRetrievalAgent {
    async fn execute(&self, mut context: ExecutionContext) -> Result<ExecutionContext> {
        let top_k = context.top_k.unwrap_or(self.config.top_k_short);
        let query = context.user_query.clone();
        let keywords = context.keywords.clone();

        let indexed_chunks = self
            .index
            .count()
            .await
            .map_err(|e| qa_core::Error::new(qa_core::ErrorKind::Internal, e.to_string()))?;
        if indexed_chunks == 0 {
            context.retrieved = Some(EvidenceSet::new(Vec::new()));
            return Ok(context);
        }

        let (vector_results, keyword_results, section_results) =
            self.run_sub_searches(&query, &keywords, top_k).await;

        if vector_results.is_empty() && keyword_results.is_empty() && section_results.is_empty() {
            return Err(qa_core::Error::new(
                qa_core::ErrorKind::NoEvidence,
                "all three sub-searches failed or returned nothing",
            ));
        }

        let boost_tables = self.wants_table_boost(&context);
        let fused = fusion::fuse(
            vector_results,
            keyword_results,
            section_results,
            &self.config.weights,
            boost_tables,
            self.config.table_boost_factor,
            top_k,
        );

        let evidence = EvidenceSet::new(fused);
        debug_assert!(evidence.check_invariants());
        context.retrieved = Some(evidence);
        Ok(context)
    }

    fn name(&self) -> &'static str {
        "hybrid_retrieval"
    }
}
