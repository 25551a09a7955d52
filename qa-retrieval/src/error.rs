//! Retrieval-local error type, converted into the shared `qa_core::Error` at
//! the Hybrid Retrieval Agent's boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("vector index error: {0}")]
    VectorIndex(String),

    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("sub-search timed out after {0}s")]
    Timeout(u64),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<RetrievalError> for qa_core::Error {
    fn from(err: RetrievalError) -> Self {
        match &err {
            RetrievalError::Timeout(_) => {
                qa_core::Error::new(qa_core::ErrorKind::ModelTimeout, err.to_string())
            }
            _ => qa_core::Error::new(qa_core::ErrorKind::Internal, err.to_string()),
        }
    }
}
