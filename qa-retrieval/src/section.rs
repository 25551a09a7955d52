//! Section sub-search: scores chunks by token overlap between the query and
//! the chunk's section header, rather than its body text. Chunks with no
//! `section` metadata never contribute here.

use std::sync::Arc;

use qa_core::search::{SearchResult, SearchSource};
use qa_core::traits::VectorIndex;

use crate::error::RetrievalError;
use crate::lexical::tokenize;

pub async fn search(
    query: &str,
    top_k: usize,
    index: &Arc<dyn VectorIndex>,
) -> Result<Vec<SearchResult>, RetrievalError> {
    let query_tokens = tokenize(query);
    if query_tokens.is_empty() {
        return Ok(Vec::new());
    }

    let documents = index
        .documents()
        .await
        .map_err(|e| RetrievalError::VectorIndex(e.to_string()))?;

    let mut scored: Vec<SearchResult> = documents
        .into_iter()
        .filter_map(|chunk| {
            let section = chunk.metadata.section.as_ref()?;
            let section_tokens = tokenize(section);
            if section_tokens.is_empty() {
                return None;
            }
            let shared = query_tokens.intersection(&section_tokens).count();
            if shared == 0 {
                return None;
            }
            let score = shared as f32 / query_tokens.len() as f32;
            Some(SearchResult::new(chunk.text, chunk.metadata, score, SearchSource::SECTION))
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(top_k);
    Ok(scored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_index::InMemoryVectorIndex;
    use qa_core::search::{ChunkMetadata, ChunkType};

    fn meta(filename: &str, section: Option<&str>) -> ChunkMetadata {
        ChunkMetadata {
            filename: filename.to_string(),
            page: 0,
            chunk_index: 0,
            chunk_type: ChunkType::Text,
            section: section.map(String::from),
            image_path: None,
            has_image: false,
        }
    }

    #[tokio::test]
    async fn matches_on_section_header_not_body() {
        let index = InMemoryVectorIndex::new();
        index.insert("1", "arbitrary body text", vec![], meta("a.pdf", Some("Risk Factors")));
        index.insert("2", "arbitrary body text", vec![], meta("b.pdf", Some("Executive Summary")));
        let index: Arc<dyn VectorIndex> = Arc::new(index);

        let results = search("risk factors", 5, &index).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].metadata.filename, "a.pdf");
    }

    #[tokio::test]
    async fn chunks_without_section_never_match() {
        let index = InMemoryVectorIndex::new();
        index.insert("1", "arbitrary body text", vec![], meta("a.pdf", None));
        let index: Arc<dyn VectorIndex> = Arc::new(index);

        let results = search("anything", 5, &index).await.unwrap();
        assert!(results.is_empty());
    }
}
