use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("sqlite error: {0}")]
    Sqlite(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<rusqlite::Error> for CacheError {
    fn from(err: rusqlite::Error) -> Self {
        CacheError::Sqlite(err.to_string())
    }
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

/// Cache errors are non-fatal (`cache_io` in spec.md §7): they are logged
/// and ignored by the orchestrator, never surfaced to the caller.
impl From<CacheError> for qa_core::Error {
    fn from(err: CacheError) -> Self {
        qa_core::Error::new(qa_core::ErrorKind::CacheIo, err.to_string())
    }
}
