//! The response cache collaborator's client-side contract (spec.md §6).

use async_trait::async_trait;

use crate::error::Result;
use crate::response::Response;

#[async_trait]
pub trait ResponseCache: Send + Sync + 'static {
    /// Look up a cached response by its `sha256(normalize(query) || 0x00 ||
    /// kb_fingerprint)` key. A stale read is acceptable per spec.md §5.
    async fn get(&self, key: &str) -> Result<Option<Response>>;

    /// Atomic put-by-key with a TTL in seconds. Never called for a
    /// cancelled query or a non-`success` Response (the orchestrator only
    /// writes on `success=true, confidence>=0.7`, per spec.md §4.1).
    async fn put(&self, key: &str, response: &Response, ttl_seconds: u64) -> Result<()>;
}

/// The append-only structured failure log (spec.md §4.4, §7).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FailureRecord {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub error_type: String,
    pub message: String,
    pub query: String,
    pub context_length: usize,
    pub prompt_length: usize,
}

#[async_trait]
pub trait FailureLog: Send + Sync + 'static {
    /// Appends one record. Concurrent appends must be serialized so records
    /// never interleave (spec.md §5).
    async fn append(&self, record: FailureRecord) -> Result<()>;
}
