//! Dense sub-search: embed the query, run nearest-neighbour search against
//! the vector index.

use std::sync::Arc;

use qa_core::search::{SearchResult, SearchSource};
use qa_core::traits::VectorIndex;

use crate::embedder::Embedder;
use crate::error::RetrievalError;

pub async fn search(
    query: &str,
    top_k: usize,
    embedder: &Arc<dyn Embedder>,
    index: &Arc<dyn VectorIndex>,
) -> Result<Vec<SearchResult>, RetrievalError> {
    let embedding = embedder.embed(query).await?;
    let hits = index
        .search(&embedding, top_k)
        .await
        .map_err(|e| RetrievalError::VectorIndex(e.to_string()))?;

    Ok(hits
        .into_iter()
        .map(|hit| SearchResult::new(hit.chunk, hit.metadata, hit.similarity, SearchSource::VECTOR))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::HashEmbedder;
    use crate::vector_index::InMemoryVectorIndex;
    use qa_core::search::{ChunkMetadata, ChunkType};

    fn meta(filename: &str) -> ChunkMetadata {
        ChunkMetadata {
            filename: filename.to_string(),
            page: 0,
            chunk_index: 0,
            chunk_type: ChunkType::Text,
            section: None,
            image_path: None,
            has_image: false,
        }
    }

    #[tokio::test]
    async fn dense_search_returns_vector_sourced_results() {
        let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(32));
        let index = InMemoryVectorIndex::new();
        let embedding = embedder.embed("annual revenue figures").await.unwrap();
        index.insert("1", "annual revenue figures", embedding, meta("a.pdf"));
        let index: Arc<dyn VectorIndex> = Arc::new(index);

        let results = search("annual revenue figures", 5, &embedder, &index).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].source.contains(SearchSource::VECTOR));
    }
}
