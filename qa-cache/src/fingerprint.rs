//! Knowledge-base fingerprint: a short digest of the index's observable
//! state, used to invalidate cached responses when the index changes
//! (spec.md §6).

use sha2::{Digest, Sha256};

pub fn knowledge_base_fingerprint(
    document_count: u64,
    sum_of_chunks: u64,
    latest_modification_timestamp: i64,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document_count.to_le_bytes());
    hasher.update(sum_of_chunks.to_le_bytes());
    hasher.update(latest_modification_timestamp.to_le_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..8])
}

/// Cache key: `sha256(normalize(query) || 0x00 || kb_fingerprint)`.
pub fn cache_key(query: &str, kb_fingerprint: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize(query).as_bytes());
    hasher.update([0u8]);
    hasher.update(kb_fingerprint.as_bytes());
    hex::encode(hasher.finalize())
}

/// Case-folds and collapses whitespace so cosmetically-different queries
/// share a cache entry.
pub fn normalize(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}
