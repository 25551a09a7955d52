//! Lexical sub-search: token-overlap scoring over the full indexed corpus.
//!
//! No inverted index is required at this scale; every sub-search scans
//! `VectorIndex::documents()` directly, which keeps the Retrieval Agent's
//! storage surface to the single trait qa-core defines.

use std::collections::HashSet;
use std::sync::Arc;

use once_cell::sync::Lazy;
use qa_core::search::{SearchResult, SearchSource};
use qa_core::traits::VectorIndex;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::RetrievalError;

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "is", "are", "was", "were", "be", "been", "i", "you", "we", "they",
        "it", "this", "that", "what", "which", "who", "whom", "whose", "to", "for", "in", "on",
        "at", "by", "with", "from", "and", "or", "but", "if", "then", "else", "of", "as",
    ]
    .into_iter()
    .collect()
});

/// Lowercased, stopword-filtered word tokens, longer than two characters.
pub fn tokenize(text: &str) -> HashSet<String> {
    text.unicode_words()
        .map(|w| w.to_lowercase())
        .filter(|w| w.len() > 2 && !STOPWORDS.contains(w.as_str()))
        .collect()
}

/// `(matched_keywords / total_keywords) * 0.5 + 0.5` on any match, else 0.
fn overlap_score(query_keywords: &HashSet<String>, doc_tokens: &HashSet<String>) -> f32 {
    if query_keywords.is_empty() {
        return 0.0;
    }
    let matched = query_keywords.intersection(doc_tokens).count();
    if matched == 0 {
        0.0
    } else {
        (matched as f32 / query_keywords.len() as f32) * 0.5 + 0.5
    }
}

/// Scores every chunk by token overlap between `keywords` (the query's
/// extracted keywords, per spec.md §4.2) and the chunk's own tokens.
pub async fn search(
    keywords: &[String],
    top_k: usize,
    index: &Arc<dyn VectorIndex>,
) -> Result<Vec<SearchResult>, RetrievalError> {
    let query_keywords: HashSet<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
    if query_keywords.is_empty() {
        return Ok(Vec::new());
    }

    let documents = index
        .documents()
        .await
        .map_err(|e| RetrievalError::VectorIndex(e.to_string()))?;

    let mut scored: Vec<SearchResult> = documents
        .into_iter()
        .filter_map(|chunk| {
            let doc_tokens = tokenize(&chunk.text);
            let score = overlap_score(&query_keywords, &doc_tokens);
            if score > 0.0 {
                Some(SearchResult::new(chunk.text, chunk.metadata, score, SearchSource::KEYWORD))
            } else {
                None
            }
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(top_k);
    Ok(scored)
}
