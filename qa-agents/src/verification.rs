//! Verification Agent (spec.md §4.5): scores the answer's confidence and
//! sets the `verified` flag.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use qa_core::traits::Agent;
use qa_core::{ExecutionContext, Result};
use qa_llm::LlmClient;
use unicode_segmentation::UnicodeSegmentation;

const VERIFIED_THRESHOLD: f32 = 0.7;

fn tokenize(text: &str) -> HashSet<String> {
    text.unicode_words().map(|w| w.to_lowercase()).collect()
}

fn evidence_overlap(answer: &str, context_text: &str) -> f32 {
    let answer_tokens = tokenize(answer);
    if answer_tokens.is_empty() {
        return 0.0;
    }
    let context_tokens = tokenize(context_text);
    let shared = answer_tokens.intersection(&context_tokens).count();
    (shared as f32 / answer_tokens.len() as f32).clamp(0.0, 1.0)
}

fn has_citation_mention(answer: &str) -> bool {
    let lower = answer.to_lowercase();
    lower.contains("source:") || lower.contains("sources:") || lower.contains("page")
}

fn judgement_prompt(answer: &str, context_text: &str) -> String {
    format!(
        "Is the following answer fully supported by the context? Give a single number in [0,1].\n\nContext:\n{context_text}\n\nAnswer:\n{answer}\n\nScore:"
    )
}

fn parse_score(text: &str) -> Option<f32> {
    text.split_whitespace()
        .filter_map(|token| token.trim_matches(|c: char| !c.is_ascii_digit() && c != '.').parse::<f32>().ok())
        .find(|v| (0.0..=1.0).contains(v))
}

pub struct VerificationAgent {
    llm: Arc<LlmClient>,
}

impl VerificationAgent {
    pub fn new(llm: Arc<LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Agent for VerificationAgent {
    async fn execute(&self, mut context: ExecutionContext) -> Result<ExecutionContext> {
        let answer = context.answer.clone().unwrap_or_default();
        let context_text: String = context
            .retrieved
            .as_ref()
            .map(|set| set.iter().map(|r| r.document.clone()).collect::<Vec<_>>().join("\n"))
            .unwrap_or_default();

        let overlap = evidence_overlap(&answer, &context_text);
        let length_penalty = if answer.trim().chars().count() < 50 { 0.8 } else { 1.0 };
        let citation_bonus = if has_citation_mention(&answer) { 1.05 } else { 1.0 };

        let prompt = judgement_prompt(&answer, &context_text);
        let confidence = match self.llm.generate(&prompt, 16, Vec::new()).await {
            Ok(result) => match parse_score(&result.text) {
                Some(judgement) => (judgement * length_penalty * overlap * citation_bonus).clamp(0.0, 1.0),
                None => (0.5 * overlap).min(0.7),
            },
            Err(e) => {
                tracing::warn!(error = %e, "verification model call failed, using heuristic fallback confidence");
                (0.5 * overlap).min(0.7)
            }
        };

        context.verified = Some(confidence >= VERIFIED_THRESHOLD);
        context.confidence = Some(confidence);
        Ok(context)
    }

    fn name(&self) -> &'static str {
        "verification"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_config::LlmConfig;
    use qa_core::Query;

    fn unreachable_llm() -> Arc<LlmClient> {
        let mut config = LlmConfig::default();
        config.endpoint = "http://127.0.0.1:1".to_string();
        config.max_retries = 0;
        config.timeout_secs = 1;
        Arc::new(LlmClient::new(config).unwrap())
    }

    #[tokio::test]
    async fn falls_back_to_heuristic_confidence_on_model_failure() {
        let agent = VerificationAgent::new(unreachable_llm());
        let query = Query::new("what is the figure");
        let mut context = ExecutionContext::new(&query);
        context.answer = Some("the figure was ten percent".to_string());
        let context = agent.execute(context).await.unwrap();
        assert!(context.confidence.unwrap() <= 0.7);
        assert_eq!(context.verified, Some(false));
    }

    #[test]
    fn evidence_overlap_is_one_when_answer_is_subset_of_context() {
        let overlap = evidence_overlap("revenue grew", "revenue grew substantially this year");
        assert!((overlap - 1.0).abs() < 1e-6);
    }

    #[test]
    fn citation_mention_detects_sources_block() {
        assert!(has_citation_mention("answer text\n\n**Sources:**\n- a.pdf (Page 1)"));
        assert!(!has_citation_mention("answer text with no citation"));
    }

    #[test]
    fn parse_score_extracts_the_first_number_in_range() {
        assert_eq!(parse_score("I'd say 0.85 based on the text"), Some(0.85));
        assert_eq!(parse_score("no numeric content here"), None);
    }
}
