//! The vector index collaborator's client-side contract (spec.md §6).
//!
//! The storage engine itself is out of scope; this trait is the seam
//! `qa-retrieval` implements against (once with a real Qdrant client, once
//! with an in-memory test double).

use async_trait::async_trait;

use crate::error::Result;
use crate::search::ChunkMetadata;

/// One stored chunk as exposed by `documents()`.
#[derive(Debug, Clone)]
pub struct IndexedChunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// One nearest-neighbour hit as returned by `search()`.
#[derive(Debug, Clone)]
pub struct VectorHit {
    pub id: String,
    pub chunk: String,
    pub metadata: ChunkMetadata,
    pub similarity: f32,
}

#[async_trait]
pub trait VectorIndex: Send + Sync + 'static {
    /// Nearest-neighbour search over a pre-computed query embedding.
    async fn search(&self, embedding: &[f32], k: usize) -> Result<Vec<VectorHit>>;

    /// Every stored chunk, for sub-searches that scan full text (lexical,
    /// section). Implementations are expected to cache/stream this
    /// efficiently; the contract makes no pagination guarantee.
    async fn documents(&self) -> Result<Vec<IndexedChunk>>;

    /// Total indexed chunk count. Zero means an empty knowledge base.
    async fn count(&self) -> Result<usize>;

    /// Remove every chunk belonging to a given file hash. Returns whether
    /// anything was deleted.
    async fn delete_by_file_hash(&self, hash: &str) -> Result<bool>;
}
