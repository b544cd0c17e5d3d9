//! In-memory storage adapter

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{Record, StorageAdapter, StorageError, StorageResult};

/// Process-local key/value storage
///
/// Writes can be made to fail on demand, which lets callers exercise their
/// behavior when the backing store refuses a write.
#[derive(Default)]
pub struct MemoryAdapter {
    data: Mutex<Record>,
    fail_writes: AtomicBool,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an adapter pre-populated with `record`
    pub fn with_record(record: Record) -> Self {
        Self {
            data: Mutex::new(record),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every subsequent `set` fail (or succeed again)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Copy of everything currently stored
    pub async fn snapshot(&self) -> Record {
        self.data.lock().await.clone()
    }
}

#[async_trait]
impl StorageAdapter for MemoryAdapter {
    async fn get(&self, keys: &[&str]) -> StorageResult<Record> {
        let data = self.data.lock().await;
        Ok(keys
            .iter()
            .filter_map(|key| data.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, record: Record) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Rejected {
                message: "QUOTA_BYTES quota exceeded".to_string(),
            });
        }
        let mut data = self.data.lock().await;
        data.extend(record);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::record_of;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_returns_only_present_keys() {
        let adapter = MemoryAdapter::new();
        adapter
            .set(record_of("theme", json!("light")))
            .await
            .unwrap();

        let record = adapter.get(&["theme", "bookmarks"]).await.unwrap();
        assert_eq!(record.len(), 1);
        assert_eq!(record["theme"], json!("light"));
    }

    #[tokio::test]
    async fn test_set_merges_keys() {
        let adapter = MemoryAdapter::with_record(record_of("a", json!(1)));
        adapter.set(record_of("b", json!(2))).await.unwrap();
        adapter.set(record_of("a", json!(3))).await.unwrap();

        let snapshot = adapter.snapshot().await;
        assert_eq!(snapshot["a"], json!(3));
        assert_eq!(snapshot["b"], json!(2));
    }

    #[tokio::test]
    async fn test_failing_writes_leave_data_untouched() {
        let adapter = MemoryAdapter::with_record(record_of("a", json!(1)));
        adapter.set_fail_writes(true);

        let err = adapter.set(record_of("a", json!(2))).await.unwrap_err();
        assert!(matches!(err, StorageError::Rejected { .. }));
        assert_eq!(adapter.snapshot().await["a"], json!(1));

        adapter.set_fail_writes(false);
        adapter.set(record_of("a", json!(2))).await.unwrap();
        assert_eq!(adapter.snapshot().await["a"], json!(2));
    }
}
