//! The response cache and failure log collaborators' concrete
//! implementations (spec.md §4.1, §4.4, §6), plus knowledge-base
//! fingerprinting.

pub mod error;
pub mod failure_log;
pub mod fingerprint;
pub mod memory_cache;
pub mod sqlite_cache;

pub use error::CacheError;
pub use failure_log::{InMemoryFailureLog, JsonLinesFailureLog};
pub use fingerprint::{cache_key, knowledge_base_fingerprint, normalize};
pub use memory_cache::InMemoryResponseCache;
pub use sqlite_cache::SqliteResponseCache;
