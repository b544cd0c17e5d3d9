//! JSON file storage adapter
//!
//! All keys live in one JSON object on disk. Writes merge the new keys into
//! the current content and replace the file atomically (write to temp file,
//! sync, then rename) so the file is never left partially written.
//!
//! Storage location: `~/.local/share/bingemark/storage.json` (configurable via `Config`)

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use super::{Record, StorageAdapter, StorageError, StorageResult};

/// Key/value storage backed by a single JSON file
pub struct JsonFileAdapter {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl JsonFileAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Read the whole stored object. A missing file is an empty record.
    async fn read_all(&self) -> StorageResult<Record> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Record::new()),
            Err(e) => {
                return Err(StorageError::ReadError {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(record)) => Ok(record),
            Ok(other) => Err(StorageError::CorruptRecord {
                path: self.path.clone(),
                details: format!("expected a JSON object, found {}", json_kind(&other)),
            }),
            Err(e) => Err(StorageError::CorruptRecord {
                path: self.path.clone(),
                details: e.to_string(),
            }),
        }
    }
}

#[async_trait]
impl StorageAdapter for JsonFileAdapter {
    async fn get(&self, keys: &[&str]) -> StorageResult<Record> {
        let mut all = self.read_all().await?;
        Ok(keys
            .iter()
            .filter_map(|key| all.remove(*key).map(|v| (key.to_string(), v)))
            .collect())
    }

    async fn set(&self, record: Record) -> StorageResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut all = self.read_all().await?;
        let written: Vec<String> = record.keys().cloned().collect();
        all.extend(record);

        let bytes = serde_json::to_vec_pretty(&Value::Object(all))?;
        atomic_write(&self.path, &bytes).await?;

        debug!(path = ?self.path, keys = ?written, "Wrote storage file");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("json file {}", self.path.display())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
pub(crate) async fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StorageError::from_io(e, parent.to_path_buf()))?;
    }

    let temp_path = path.with_extension("tmp");

    let mut file = fs::File::create(&temp_path)
        .await
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    file.write_all(data)
        .await
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    file.sync_all()
        .await
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    fs::rename(&temp_path, path)
        .await
        .map_err(|e| StorageError::AtomicWriteFailed {
            from: temp_path.clone(),
            to: path.to_path_buf(),
            source: e,
        })?;

    Ok(())
}
