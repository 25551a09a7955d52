//! The append-only structured failure log (spec.md §4.4, §5, §7): every
//! reasoning failure is written here with enough context to debug it, and
//! concurrent appends never interleave.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use qa_core::traits::{FailureLog, FailureRecord};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

pub struct JsonLinesFailureLog {
    path: PathBuf,
    // Serializes appends so concurrent writers never interleave a record.
    lock: Arc<Mutex<()>>,
}

impl JsonLinesFailureLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }
}

#[async_trait]
impl FailureLog for JsonLinesFailureLog {
    async fn append(&self, record: FailureRecord) -> qa_core::Result<()> {
        let _guard = self.lock.lock().await;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    qa_core::Error::new(qa_core::ErrorKind::CacheIo, e.to_string())
                })?;
            }
        }
        let mut line = serde_json::to_string(&record)
            .map_err(|e| qa_core::Error::new(qa_core::ErrorKind::CacheIo, e.to_string()))?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| qa_core::Error::new(qa_core::ErrorKind::CacheIo, e.to_string()))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| qa_core::Error::new(qa_core::ErrorKind::CacheIo, e.to_string()))?;
        Ok(())
    }
}

/// In-memory failure log test double.
#[derive(Default)]
pub struct InMemoryFailureLog {
    records: tokio::sync::Mutex<Vec<FailureRecord>>,
}

impl InMemoryFailureLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<FailureRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl FailureLog for InMemoryFailureLog {
    async fn append(&self, record: FailureRecord) -> qa_core::Result<()> {
        self.records.lock().await.push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_log_records_appends() {
        let log = InMemoryFailureLog::new();
        log.append(FailureRecord {
            timestamp: chrono::Utc::now(),
            error_type: "model_timeout".to_string(),
            message: "timed out".to_string(),
            query: "what is x".to_string(),
            context_length: 10,
            prompt_length: 200,
        })
        .await
        .unwrap();
        assert_eq!(log.records().await.len(), 1);
    }
}
