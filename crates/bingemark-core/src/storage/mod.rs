//! Storage layer
//!
//! The persistent store is a key/value facility modelled on extension-local
//! storage: `get` a set of keys, `set` a record of key/value pairs. Values
//! are JSON documents.
//!
//! ## Backends
//!
//! - **MemoryAdapter**: process-local map, used by tests
//! - **JsonFileAdapter**: a single JSON object file written atomically
//! - **SqliteAdapter**: a key/value table in SQLite
//!
//! The store wraps every call in a timeout (`get_with_timeout`,
//! `set_with_timeout`) so a stuck backend surfaces as an error.

pub mod error;
pub mod file;
pub mod memory;
pub mod schema;
pub mod sqlite;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::config::{Config, StorageBackend};

pub use error::{StorageError, StorageResult};
pub use file::JsonFileAdapter;
pub use memory::MemoryAdapter;
pub use sqlite::SqliteAdapter;

/// A set of key/value pairs read from or written to storage
pub type Record = Map<String, Value>;

/// Keys used in storage
pub mod keys {
    pub const BOOKMARKS: &str = "bookmarks";
    pub const CATEGORIES: &str = "categories";
    pub const DISPLAY_SETTINGS: &str = "displaySettings";
    pub const HIDDEN_CATEGORIES: &str = "hiddenCategories";
    pub const THEME: &str = "theme";

    /// Every key the state store loads at startup
    pub const ALL: [&str; 5] = [BOOKMARKS, CATEGORIES, DISPLAY_SETTINGS, HIDDEN_CATEGORIES, THEME];
}

/// Asynchronous key/value storage
///
/// `get` returns only the keys that exist; a missing key is not an error.
/// `set` writes every key in the record and leaves other keys untouched.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    async fn get(&self, keys: &[&str]) -> StorageResult<Record>;

    async fn set(&self, record: Record) -> StorageResult<()>;

    /// Short description of the backend for status output
    fn describe(&self) -> String;
}

/// `get` bounded by `timeout`
pub async fn get_with_timeout(
    adapter: &dyn StorageAdapter,
    keys: &[&str],
    timeout: Duration,
) -> StorageResult<Record> {
    match tokio::time::timeout(timeout, adapter.get(keys)).await {
        Ok(result) => result,
        Err(_) => Err(StorageError::Timeout {
            operation: "get",
            after: timeout,
        }),
    }
}

/// `set` bounded by `timeout`
pub async fn set_with_timeout(
    adapter: &dyn StorageAdapter,
    record: Record,
    timeout: Duration,
) -> StorageResult<()> {
    match tokio::time::timeout(timeout, adapter.set(record)).await {
        Ok(result) => result,
        Err(_) => Err(StorageError::Timeout {
            operation: "set",
            after: timeout,
        }),
    }
}

/// Build a single-key record
pub fn record_of(key: &str, value: Value) -> Record {
    let mut record = Record::new();
    record.insert(key.to_string(), value);
    record
}

/// Open the adapter selected by the configuration
pub fn open_adapter(config: &Config) -> StorageResult<Arc<dyn StorageAdapter>> {
    let adapter: Arc<dyn StorageAdapter> = match config.storage_backend {
        StorageBackend::Json => Arc::new(JsonFileAdapter::new(config.json_store_path())),
        StorageBackend::Sqlite => Arc::new(SqliteAdapter::open(&config.sqlite_path())?),
    };
    Ok(adapter)
}
