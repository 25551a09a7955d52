//! Reasoning Agent (spec.md §4.4): builds a grounded prompt within the
//! context budget, falls back through four levels when the model call
//! fails or underdelivers, and attaches citations/images.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use qa_config::ReasoningConfig;
use qa_core::answer::{Citation, FallbackLevel, ImageRef};
use qa_core::search::SearchResult;
use qa_core::traits::{Agent, FailureLog, FailureRecord};
use qa_core::{ExecutionContext, Result};
use qa_llm::LlmClient;
use unicode_segmentation::UnicodeSegmentation;

use crate::prompt::{build_budgeted_evidence, full_prompt, simplified_prompt};

const GRACEFUL_APOLOGY: &str = "I wasn't able to find a confident answer to that in the available documents. Could you try rephrasing the question, or naming the document or section you're asking about?";

pub struct ReasoningAgent {
    config: ReasoningConfig,
    llm: Arc<LlmClient>,
    failure_log: Arc<dyn FailureLog>,
}

impl ReasoningAgent {
    pub fn new(config: ReasoningConfig, llm: Arc<LlmClient>, failure_log: Arc<dyn FailureLog>) -> Self {
        Self { config, llm, failure_log }
    }

    async fn log_failure(&self, error_type: &str, message: &str, query: &str, context_length: usize, prompt_length: usize) {
        let record = FailureRecord {
            timestamp: chrono::Utc::now(),
            error_type: error_type.to_string(),
            message: message.to_string(),
            query: query.to_string(),
            context_length,
            prompt_length,
        };
        if let Err(e) = self.failure_log.append(record).await {
            tracing::warn!(error = %e, "failed to write failure log record");
        }
    }

    fn citations_for(&self, used: &[SearchResult]) -> Vec<Citation> {
        let mut seen = HashSet::new();
        let mut citations = Vec::new();
        for r in used {
            let key = (r.metadata.filename.clone(), r.metadata.page);
            if seen.insert(key) {
                citations.push(Citation {
                    filename: r.metadata.filename.clone(),
                    page: r.metadata.page + 1,
                });
            }
        }
        citations
    }

    fn images_for(&self, evidence: &[SearchResult]) -> Vec<ImageRef> {
        let mut seen = HashSet::new();
        let mut images = Vec::new();
        for r in evidence.iter().take(3) {
            if let Some(ref path) = r.metadata.image_path {
                if seen.insert(path.clone()) {
                    images.push(ImageRef {
                        path: path.clone(),
                        page: r.metadata.page + 1,
                        filename: r.metadata.filename.clone(),
                    });
                }
            }
        }
        images
    }

    fn append_sources_block(&self, text: &str, citations: &[Citation]) -> String {
        if citations.is_empty() {
            return text.to_string();
        }
        let mut block = String::from("\n\n**Sources:**\n");
        for c in citations {
            block.push_str(&format!("- {} (Page {})\n", c.filename, c.page));
        }
        format!("{text}{block}")
    }

    /// Level 2: rank sentences from the evidence by keyword overlap with the
    /// query, no model call. Returns `None` if no sentence matches at least
    /// one keyword.
    fn direct_extraction(&self, evidence: &[SearchResult], keywords: &[String]) -> Option<(String, Vec<Citation>)> {
        if keywords.is_empty() {
            return None;
        }
        let keyword_set: HashSet<String> = keywords.iter().map(|k| k.to_lowercase()).collect();

        let mut scored: Vec<(f32, String, Citation)> = Vec::new();
        for chunk in evidence {
            for sentence in chunk.document.split_inclusive(['.', '!', '?']) {
                let sentence = sentence.trim();
                if sentence.is_empty() {
                    continue;
                }
                let tokens: HashSet<String> = sentence.unicode_words().map(|w| w.to_lowercase()).collect();
                let overlap = keyword_set.intersection(&tokens).count();
                if overlap > 0 {
                    scored.push((
                        overlap as f32,
                        sentence.to_string(),
                        Citation {
                            filename: chunk.metadata.filename.clone(),
                            page: chunk.metadata.page + 1,
                        },
                    ));
                }
            }
        }

        if scored.is_empty() {
            return None;
        }

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        let take = self.config.direct_extraction_max_sentences.min(scored.len()).max(
            self.config.direct_extraction_min_sentences.min(scored.len()),
        );
        let selected = &scored[..take];

        let mut text = String::new();
        let mut citations = Vec::new();
        let mut seen = HashSet::new();
        for (_, sentence, citation) in selected {
            text.push_str(&format!("{} [{}, Page {}]\n", sentence, citation.filename, citation.page));
            let key = (citation.filename.clone(), citation.page);
            if seen.insert(key) {
                citations.push(citation.clone());
            }
        }

        Some((text.trim_end().to_string(), citations))
    }
}

#[async_trait]
impl Agent for ReasoningAgent {
    async fn execute(&self, mut context: ExecutionContext) -> Result<ExecutionContext> {
        let evidence = context
            .retrieved
            .clone()
            .map(|set| set.into_vec())
            .unwrap_or_default();
        let query = context.user_query.clone();

        // Level 0: full prompt, full in-budget evidence.
        let budgeted = build_budgeted_evidence(&evidence, &self.config);
        let prompt = full_prompt(&budgeted.text, &query);

        match self.llm.generate(&prompt, 512, Vec::new()).await {
            Ok(result) if result.text.trim().chars().count() >= self.config.min_answer_chars => {
                let citations = self.citations_for(&budgeted.used);
                context.answer = Some(self.append_sources_block(result.text.trim(), &citations));
                context.fallback_used = None;
                context.truncated = budgeted.truncated;
                context.sources = citations;
                context.images = self.images_for(&evidence);
                context.evidence_used = budgeted.used.len();
                return Ok(context);
            }
            Ok(result) => {
                self.log_failure(
                    "reasoning_level0_short_output",
                    &format!("output {} chars, below minimum", result.text.chars().count()),
                    &query,
                    evidence.len(),
                    prompt.chars().count(),
                )
                .await;
            }
            Err(e) => {
                self.log_failure("reasoning_level0_model_error", &e.to_string(), &query, evidence.len(), prompt.chars().count())
                    .await;
            }
        }

        // Level 1: simplified prompt, top-2 chunks, 2000-char cap.
        let (simplified, selected) =
            simplified_prompt(&evidence, &query, self.config.simplified_char_cap, self.config.simplified_chunk_count);

        match self.llm.generate(&simplified, 256, Vec::new()).await {
            Ok(result) if result.text.trim().chars().count() >= self.config.min_answer_chars => {
                let citations = self.citations_for(&selected);
                context.answer = Some(self.append_sources_block(result.text.trim(), &citations));
                context.fallback_used = Some(FallbackLevel::SimplifiedReasoning);
                context.truncated = true;
                context.sources = citations;
                context.images = self.images_for(&evidence);
                context.evidence_used = selected.len();
                return Ok(context);
            }
            Ok(result) => {
                self.log_failure(
                    "reasoning_level1_short_output",
                    &format!("output {} chars, below minimum", result.text.chars().count()),
                    &query,
                    evidence.len(),
                    simplified.chars().count(),
                )
                .await;
            }
            Err(e) => {
                self.log_failure("reasoning_level1_model_error", &e.to_string(), &query, evidence.len(), simplified.chars().count())
                    .await;
            }
        }

        // Level 2: direct sentence extraction, no model call.
        if let Some((text, citations)) = self.direct_extraction(&evidence, &context.keywords) {
            context.answer = Some(text);
            context.fallback_used = Some(FallbackLevel::DirectExtraction);
            context.truncated = true;
            context.images = self.images_for(&evidence);
            context.evidence_used = citations.len();
            context.sources = citations;
            return Ok(context);
        }
        self.log_failure("reasoning_level2_no_sentences", "no sentence matched any query keyword", &query, evidence.len(), 0)
            .await;

        // Level 3: graceful apology.
        let citations = self.citations_for(evidence.iter().take(3).cloned().collect::<Vec<_>>().as_slice());
        let filenames: Vec<String> = citations.iter().map(|c| c.filename.clone()).collect();
        let apology = if filenames.is_empty() {
            GRACEFUL_APOLOGY.to_string()
        } else {
            format!("{GRACEFUL_APOLOGY} The closest documents I found were: {}.", filenames.join(", "))
        };
        context.answer = Some(apology);
        context.fallback_used = Some(FallbackLevel::Graceful);
        context.truncated = true;
        context.evidence_used = citations.len();
        context.sources = citations;
        context.images = Vec::new();
        Ok(context)
    }

    fn name(&self) -> &'static str {
        "reasoning"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_config::LlmConfig;
    use qa_core::search::{ChunkMetadata, ChunkType, EvidenceSet, SearchSource};
    use qa_core::Query;

    struct NullFailureLog;

    #[async_trait]
    impl FailureLog for NullFailureLog {
        async fn append(&self, _record: FailureRecord) -> Result<()> {
            Ok(())
        }
    }

    fn evidence_result(filename: &str, text: &str) -> SearchResult {
        SearchResult::new(
            text,
            ChunkMetadata {
                filename: filename.to_string(),
                page: 0,
                chunk_index: 0,
                chunk_type: ChunkType::Text,
                section: None,
                image_path: None,
                has_image: false,
            },
            0.9,
            SearchSource::VECTOR,
        )
    }

    #[tokio::test]
    async fn falls_back_to_direct_extraction_when_model_is_unreachable() {
        let mut config = LlmConfig::default();
        config.endpoint = "http://127.0.0.1:1".to_string();
        config.max_retries = 0;
        config.timeout_secs = 1;
        let llm = Arc::new(LlmClient::new(config).unwrap());
        let failure_log: Arc<dyn FailureLog> = Arc::new(NullFailureLog);
        let agent = ReasoningAgent::new(ReasoningConfig::default(), llm, failure_log);

        let query = Query::new("what is the annual revenue figure");
        let mut context = ExecutionContext::new(&query);
        context.keywords = vec!["annual".to_string(), "revenue".to_string(), "figure".to_string()];
        context.retrieved = Some(EvidenceSet::new(vec![evidence_result(
            "report.pdf",
            "The annual revenue figure grew by ten percent this year.",
        )]));

        let context = agent.execute(context).await.unwrap();
        assert!(context.answer.is_some());
        assert!(context.fallback_used.is_some());
    }

    #[tokio::test]
    async fn graceful_fallback_when_no_keyword_overlap_exists() {
        let mut config = LlmConfig::default();
        config.endpoint = "http://127.0.0.1:1".to_string();
        config.max_retries = 0;
        config.timeout_secs = 1;
        let llm = Arc::new(LlmClient::new(config).unwrap());
        let failure_log: Arc<dyn FailureLog> = Arc::new(NullFailureLog);
        let agent = ReasoningAgent::new(ReasoningConfig::default(), llm, failure_log);

        let query = Query::new("unrelated");
        let mut context = ExecutionContext::new(&query);
        context.keywords = vec![];
        context.retrieved = Some(EvidenceSet::new(vec![evidence_result("report.pdf", "Some text that matches nothing.")]));

        let context = agent.execute(context).await.unwrap();
        assert_eq!(context.fallback_used, Some(FallbackLevel::Graceful));
    }
}
