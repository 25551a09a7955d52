//! Prompt assembly and the context budget (spec.md §4.4).

use qa_config::ReasoningConfig;
use qa_core::search::{ChunkType, SearchResult};

const SYSTEM_DIRECTIVE: &str = "Answer strictly from the context below. If the answer is not in the context, say so explicitly — \"not in context\" — rather than inventing one.";

fn estimate_tokens(text: &str, factor: f32) -> usize {
    let words = text.split_whitespace().count();
    (words as f32 * factor).ceil() as usize
}

/// Truncates `text` to fit within `token_cap` (estimated), keeping the
/// leading and trailing sentences and dropping the middle.
fn truncate_keeping_ends(text: &str, token_cap: usize, factor: f32) -> (String, bool) {
    if estimate_tokens(text, factor) <= token_cap {
        return (text.to_string(), false);
    }

    let sentences: Vec<&str> = text
        .split_inclusive(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if sentences.len() <= 2 {
        // Nothing sensible to keep both ends of; hard-truncate by word budget.
        let target_words = ((token_cap as f32) / factor).floor() as usize;
        let truncated: String = text.split_whitespace().take(target_words.max(1)).collect::<Vec<_>>().join(" ");
        return (truncated, true);
    }

    let mut kept_front = vec![sentences[0]];
    let mut kept_back = vec![*sentences.last().unwrap()];
    let mut front_idx = 1;
    let mut back_idx = sentences.len() - 2;

    loop {
        let candidate = format!("{} … {}", kept_front.join(" "), kept_back.join(" "));
        if estimate_tokens(&candidate, factor) > token_cap || front_idx > back_idx {
            break;
        }
        if front_idx <= back_idx {
            kept_front.push(sentences[front_idx]);
            front_idx += 1;
        }
        if front_idx <= back_idx {
            kept_back.insert(0, sentences[back_idx]);
            if back_idx == 0 {
                break;
            }
            back_idx -= 1;
        }
    }

    (format!("{} … {}", kept_front.join(" "), kept_back.join(" ")), true)
}

fn format_chunk(result: &SearchResult) -> String {
    let page = result.metadata.page + 1;
    match result.metadata.chunk_type {
        ChunkType::Table => format!(
            "--- TABLE from {} (Page {}) ---\n{}",
            result.metadata.filename, page, result.document
        ),
        _ => format!(
            "--- DOCUMENT: {} (Page {}) ---\n{}",
            result.metadata.filename, page, result.document
        ),
    }
}

/// The evidence actually selected for the prompt, in fused-score order,
/// plus whether any chunk was truncated to fit the budget.
pub struct BudgetedEvidence {
    pub used: Vec<SearchResult>,
    pub text: String,
    pub truncated: bool,
}

/// Fills the evidence budget (`context_window_tokens - reserved_tokens`) by
/// taking chunks in fused-score order, truncating any chunk that alone
/// exceeds the per-chunk cap.
pub fn build_budgeted_evidence(evidence: &[SearchResult], config: &ReasoningConfig) -> BudgetedEvidence {
    let budget = config.evidence_token_budget();
    let mut used = Vec::new();
    let mut pieces = Vec::new();
    let mut spent = 0usize;
    let mut truncated = false;

    for result in evidence {
        let (document, was_truncated) = if estimate_tokens(&result.document, config.token_estimate_factor)
            > config.per_chunk_token_cap
        {
            truncate_keeping_ends(&result.document, config.per_chunk_token_cap, config.token_estimate_factor)
        } else {
            (result.document.clone(), false)
        };
        truncated = truncated || was_truncated;

        let mut shaped = result.clone();
        shaped.document = document;
        let rendered = format_chunk(&shaped);
        let cost = estimate_tokens(&rendered, config.token_estimate_factor);

        if spent + cost > budget && !used.is_empty() {
            break;
        }

        spent += cost;
        pieces.push(rendered);
        used.push(shaped);
    }

    BudgetedEvidence {
        used,
        text: pieces.join("\n\n"),
        truncated,
    }
}

pub fn full_prompt(evidence_text: &str, query: &str) -> String {
    format!(
        "{SYSTEM_DIRECTIVE}\n\n{evidence_text}\n\nQuestion: {query}\n\nAnswer:"
    )
}

/// Level 1's minimal prompt: at most the top-2 chunks truncated to a shared
/// character budget.
pub fn simplified_prompt(evidence: &[SearchResult], query: &str, char_cap: usize, chunk_count: usize) -> (String, Vec<SearchResult>) {
    let selected: Vec<SearchResult> = evidence.iter().take(chunk_count).cloned().collect();
    let mut combined = String::new();
    for chunk in &selected {
        combined.push_str(&chunk.document);
        combined.push(' ');
    }
    let combined: String = combined.chars().take(char_cap).collect();
    (format!("Context: {combined} Question: {query} Answer:"), selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_core::search::ChunkMetadata;

    fn result(text: &str) -> SearchResult {
        SearchResult::new(
            text,
            ChunkMetadata {
                filename: "a.pdf".to_string(),
                page: 0,
                chunk_index: 0,
                chunk_type: ChunkType::Text,
                section: None,
                image_path: None,
                has_image: false,
            },
            0.9,
            qa_core::search::SearchSource::VECTOR,
        )
    }

    #[test]
    fn small_evidence_set_is_not_truncated() {
        let config = ReasoningConfig::default();
        let evidence = vec![result("a short chunk of evidence text")];
        let budgeted = build_budgeted_evidence(&evidence, &config);
        assert!(!budgeted.truncated);
        assert_eq!(budgeted.used.len(), 1);
    }

    #[test]
    fn oversized_chunk_is_truncated_keeping_ends() {
        let config = ReasoningConfig::default();
        let long_text = "First sentence here. ".to_string() + &"middle filler words. ".repeat(200) + "Last sentence here.";
        let evidence = vec![result(&long_text)];
        let budgeted = build_budgeted_evidence(&evidence, &config);
        assert!(budgeted.truncated);
        assert!(budgeted.used[0].document.starts_with("First sentence"));
        assert!(budgeted.used[0].document.ends_with("Last sentence here."));
    }

    #[test]
    fn stops_adding_chunks_once_budget_is_exhausted() {
        let mut config = ReasoningConfig::default();
        config.context_window_tokens = 820;
        config.reserved_tokens = 800;
        let evidence: Vec<SearchResult> = (0..20).map(|_| result(&"word ".repeat(50))).collect();
        let budgeted = build_budgeted_evidence(&evidence, &config);
        assert!(budgeted.used.len() < 20);
    }
}
