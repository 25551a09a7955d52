//! Core data model and trait seams for the document-grounded QA orchestrator.
//!
//! This crate provides foundational types used across all other crates:
//! - The `Query` / `ExecutionContext` / `Response` data model
//! - `SearchResult` / `EvidenceSet` — retrieval's output shape
//! - `AnswerDraft` / `Artifact` — reasoning's output shapes
//! - The `Error` / `ErrorKind` taxonomy shared by every agent boundary
//! - Trait seams for every external collaborator (`VectorIndex`,
//!   `ResponseCache`, `FailureLog`, `TranslationProvider`, `Agent`)

pub mod answer;
pub mod artifact;
pub mod context;
pub mod error;
pub mod query;
pub mod response;
pub mod search;
pub mod traits;

pub use answer::{AnswerDraft, Citation, FallbackLevel, ImageRef};
pub use artifact::{Artifact, ArtifactKind};
pub use context::{intent, ExecutionContext, QueryType};
pub use error::{Error, ErrorKind, Result};
pub use query::Query;
pub use response::{Response, ResponseError};
pub use search::{ChunkMetadata, ChunkType, EvidenceSet, SearchResult, SearchSource};
pub use traits::{
    Agent, FailureLog, FailureRecord, IndexedChunk, ResponseCache, TranslationProvider,
    VectorHit, VectorIndex,
};
