//! `SqliteResponseCache`: atomic put-by-key, TTL-aware response cache.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use qa_core::{Response, ResponseCache};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::CacheError;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS response_cache (
    key TEXT PRIMARY KEY,
    response_json TEXT NOT NULL,
    inserted_at INTEGER NOT NULL,
    expires_at INTEGER NOT NULL
);
";

pub struct SqliteResponseCache {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteResponseCache {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn in_memory() -> Result<Self, CacheError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }
}

#[async_trait]
impl ResponseCache for SqliteResponseCache {
    async fn get(&self, key: &str) -> qa_core::Result<Option<Response>> {
        let conn = Arc::clone(&self.conn);
        let key = key.to_string();
        tokio::task::spawn_blocking(move || get_blocking(&conn, &key))
            .await
            .map_err(|e| CacheError::Io(e.to_string()))?
            .map_err(qa_core::Error::from)
    }

    async fn put(&self, key: &str, response: &Response, ttl_seconds: u64) -> qa_core::Result<()> {
        let conn = Arc::clone(&self.conn);
        let key = key.to_string();
        let json = serde_json::to_string(response).map_err(CacheError::from)?;
        let expires_at = Self::now() + ttl_seconds as i64;
        tokio::task::spawn_blocking(move || put_blocking(&conn, &key, &json, expires_at))
            .await
            .map_err(|e| CacheError::Io(e.to_string()))?
            .map_err(qa_core::Error::from)
    }
}

fn get_blocking(conn: &Mutex<Connection>, key: &str) -> Result<Option<Response>, CacheError> {
    let conn = conn.lock();
    let row: Option<(String, i64)> = conn
        .query_row(
            "SELECT response_json, expires_at FROM response_cache WHERE key = ?1",
            params![key],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    match row {
        Some((json, expires_at)) if expires_at > SqliteResponseCache::now() => {
            let response: Response = serde_json::from_str(&json)?;
            Ok(Some(response))
        }
        Some(_) => Ok(None), // expired; left for a future sweep rather than deleted inline
        None => Ok(None),
    }
}

fn put_blocking(
    conn: &Mutex<Connection>,
    key: &str,
    json: &str,
    expires_at: i64,
) -> Result<(), CacheError> {
    let conn = conn.lock();
    conn.execute(
        "INSERT INTO response_cache (key, response_json, inserted_at, expires_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(key) DO UPDATE SET
            response_json = excluded.response_json,
            inserted_at = excluded.inserted_at,
            expires_at = excluded.expires_at",
        params![key, json, SqliteResponseCache::now(), expires_at],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_core::ErrorKind;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let cache = SqliteResponseCache::in_memory().unwrap();
        let response = Response::failure(ErrorKind::NoDocuments, "no docs", "en");
        cache.put("k1", &response, 3600).await.unwrap();
        let fetched = cache.get("k1").await.unwrap();
        assert!(fetched.is_some());
        assert_eq!(fetched.unwrap().error.unwrap().kind, ErrorKind::NoDocuments);
    }

    #[tokio::test]
    async fn expired_entry_is_not_returned() {
        let cache = SqliteResponseCache::in_memory().unwrap();
        let response = Response::failure(ErrorKind::NoDocuments, "no docs", "en");
        cache.put("k1", &response, 0).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
        assert!(cache.get("k1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_is_idempotent_by_key() {
        let cache = SqliteResponseCache::in_memory().unwrap();
        let a = Response::failure(ErrorKind::NoDocuments, "a", "en");
        let b = Response::failure(ErrorKind::Internal, "b", "en");
        cache.put("k1", &a, 3600).await.unwrap();
        cache.put("k1", &b, 3600).await.unwrap();
        let fetched = cache.get("k1").await.unwrap().unwrap();
        assert_eq!(fetched.error.unwrap().kind, ErrorKind::Internal);
    }
}
