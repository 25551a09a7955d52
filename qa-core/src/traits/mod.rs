//! Trait seams for every external collaborator named in spec.md §6, plus the
//! shared agent interface of §9.

mod agent;
mod cache;
mod translation;
mod vector_index;

pub use agent::Agent;
pub use cache::{FailureLog, FailureRecord, ResponseCache};
pub use translation::TranslationProvider;
pub use vector_index::{IndexedChunk, VectorHit, VectorIndex};
