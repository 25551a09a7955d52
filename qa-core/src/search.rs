//! Retrieved chunks and the evidence set assembled from them.

use serde::{Deserialize, Serialize};

/// Chunk type as tagged by the ingestion collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    Text,
    Image,
    Table,
}

/// Metadata for one indexed chunk, as exposed by the vector index collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub filename: String,
    /// 0-based internally; callers render `page + 1` for citations.
    pub page: u32,
    pub chunk_index: u32,
    pub chunk_type: ChunkType,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub has_image: bool,
}

impl ChunkMetadata {
    pub fn key(&self) -> (String, u32, u32) {
        (self.filename.clone(), self.page, self.chunk_index)
    }
}

/// Which sub-searches surfaced this chunk. A bitset, not a plain enum,
/// because fusion can union contributions from more than one sub-search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchSource(u8);

impl SearchSource {
    pub const VECTOR: SearchSource = SearchSource(0b001);
    pub const KEYWORD: SearchSource = SearchSource(0b010);
    pub const SECTION: SearchSource = SearchSource(0b100);
    pub const NONE: SearchSource = SearchSource(0);

    pub fn contains(self, other: SearchSource) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn union(self, other: SearchSource) -> SearchSource {
        SearchSource(self.0 | other.0)
    }
}

impl std::ops::BitOr for SearchSource {
    type Output = SearchSource;
    fn bitor(self, rhs: SearchSource) -> SearchSource {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for SearchSource {
    fn bitor_assign(&mut self, rhs: SearchSource) {
        self.0 |= rhs.0;
    }
}

/// One retrieved chunk, with the fused relevance score already applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub document: String,
    pub metadata: ChunkMetadata,
    pub score: f32,
    pub source: SearchSource,
}

impl SearchResult {
    pub fn new(document: impl Into<String>, metadata: ChunkMetadata, score: f32, source: SearchSource) -> Self {
        Self {
            document: document.into(),
            metadata,
            score: score.clamp(0.0, 1.0),
            source,
        }
    }
}

/// The ordered, deduplicated evidence passed from Retrieval into Reasoning.
///
/// Invariant: no two entries share `(filename, page, chunk_index)`; sorted by
/// fused score descending.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceSet {
    results: Vec<SearchResult>,
}

impl EvidenceSet {
    pub fn new(mut results: Vec<SearchResult>) -> Self {
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Self { results }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SearchResult> {
        self.results.iter()
    }

    pub fn as_slice(&self) -> &[SearchResult] {
        &self.results
    }

    pub fn into_vec(self) -> Vec<SearchResult> {
        self.results
    }

    pub fn top(&self, n: usize) -> &[SearchResult] {
        &self.results[..self.results.len().min(n)]
    }

    /// True when the evidence set is sorted score-descending with no dup keys.
    pub fn check_invariants(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        let mut prev: Option<f32> = None;
        for r in &self.results {
            if !seen.insert(r.metadata.key()) {
                return false;
            }
            if let Some(p) = prev {
                if r.score > p {
                    return false;
                }
            }
            prev = Some(r.score);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(filename: &str, page: u32, chunk: u32) -> ChunkMetadata {
        ChunkMetadata {
            filename: filename.to_string(),
            page,
            chunk_index: chunk,
            chunk_type: ChunkType::Text,
            section: None,
            image_path: None,
            has_image: false,
        }
    }

    #[test]
    fn evidence_set_sorts_descending() {
        let set = EvidenceSet::new(vec![
            SearchResult::new("a", meta("f", 0, 0), 0.2, SearchSource::VECTOR),
            SearchResult::new("b", meta("f", 1, 0), 0.9, SearchSource::VECTOR),
        ]);
        assert_eq!(set.as_slice()[0].document, "b");
        assert!(set.check_invariants());
    }

    #[test]
    fn search_source_is_a_union() {
        let src = SearchSource::VECTOR | SearchSource::KEYWORD;
        assert!(src.contains(SearchSource::VECTOR));
        assert!(src.contains(SearchSource::KEYWORD));
        assert!(!src.contains(SearchSource::SECTION));
    }
}
