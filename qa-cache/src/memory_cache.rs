//! In-memory `ResponseCache` test double, used by orchestrator integration
//! tests in place of SQLite.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use qa_core::{Response, ResponseCache};

struct Entry {
    response: Response,
    expires_at: i64,
}

#[derive(Default)]
pub struct InMemoryResponseCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryResponseCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResponseCache for InMemoryResponseCache {
    async fn get(&self, key: &str) -> qa_core::Result<Option<Response>> {
        let now = chrono::Utc::now().timestamp();
        let entries = self.entries.lock();
        Ok(entries.get(key).and_then(|e| {
            if e.expires_at > now {
                Some(e.response.clone())
            } else {
                None
            }
        }))
    }

    async fn put(&self, key: &str, response: &Response, ttl_seconds: u64) -> qa_core::Result<()> {
        let expires_at = chrono::Utc::now().timestamp() + ttl_seconds as i64;
        self.entries.lock().insert(
            key.to_string(),
            Entry {
                response: response.clone(),
                expires_at,
            },
        );
        Ok(())
    }
}
