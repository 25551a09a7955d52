//! In-memory `VectorIndex` test double, used by sub-search unit tests and
//! orchestrator integration tests in place of a live Qdrant collection.

use async_trait::async_trait;
use parking_lot::RwLock;
use qa_core::traits::{IndexedChunk, VectorHit, VectorIndex};
use qa_core::search::ChunkMetadata;

struct Entry {
    id: String,
    text: String,
    embedding: Vec<f32>,
    metadata: ChunkMetadata,
}

#[derive(Default)]
pub struct InMemoryVectorIndex {
    entries: RwLock<Vec<Entry>>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: impl Into<String>, text: impl Into<String>, embedding: Vec<f32>, metadata: ChunkMetadata) {
        self.entries.write().push(Entry {
            id: id.into(),
            text: text.into(),
            embedding,
            metadata,
        });
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn search(&self, embedding: &[f32], k: usize) -> qa_core::Result<Vec<VectorHit>> {
        let entries = self.entries.read();
        let mut scored: Vec<VectorHit> = entries
            .iter()
            .map(|e| VectorHit {
                id: e.id.clone(),
                chunk: e.text.clone(),
                metadata: e.metadata.clone(),
                similarity: cosine_similarity(embedding, &e.embedding),
            })
            .collect();
        scored.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    async fn documents(&self) -> qa_core::Result<Vec<IndexedChunk>> {
        Ok(self
            .entries
            .read()
            .iter()
            .map(|e| IndexedChunk {
                text: e.text.clone(),
                metadata: e.metadata.clone(),
            })
            .collect())
    }

    async fn count(&self) -> qa_core::Result<usize> {
        Ok(self.entries.read().len())
    }

    async fn delete_by_file_hash(&self, hash: &str) -> qa_core::Result<bool> {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| e.id != hash && !e.id.starts_with(hash));
        Ok(entries.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_core::search::ChunkType;

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
    async fn search_ranks_by_cosine_similarity() {
        let index = InMemoryVectorIndex::new();
        index.insert("1", "alpha", vec![1.0, 0.0], meta("a.pdf"));
        index.insert("2", "beta", vec![0.0, 1.0], meta("b.pdf"));
        let hits = index.search(&[1.0, 0.0], 1).await.unwrap();
        assert_eq!(hits[0].chunk, "alpha");
    }

    #[tokio::test]
    async fn count_reflects_inserts() {
        let index = InMemoryVectorIndex::new();
        assert_eq!(index.count().await.unwrap(), 0);
        index.insert("1", "alpha", vec![1.0], meta("a.pdf"));
        assert_eq!(index.count().await.unwrap(), 1);
    }
}
