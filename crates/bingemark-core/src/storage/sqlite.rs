//! SQLite storage adapter
//!
//! Stores each key as a row in the `kv` table. A `set` writes all of its
//! keys in a single transaction.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use super::schema::{init_schema, needs_init};
use super::{Record, StorageAdapter, StorageError, StorageResult};

/// Key/value storage backed by SQLite
pub struct SqliteAdapter {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteAdapter {
    /// Open or create the database at `path`
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::from_io(e, parent.to_path_buf()))?;
        }

        let conn = Connection::open(path)?;
        Self::from_connection(conn, Some(path.to_path_buf()))
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?, None)
    }

    fn from_connection(conn: Connection, path: Option<PathBuf>) -> StorageResult<Self> {
        if needs_init(&conn) {
            init_schema(&conn)?;
        }
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> StorageResult<T>) -> StorageResult<T> {
        let mut conn = self.conn.lock().map_err(|_| StorageError::Rejected {
            message: "database connection lock poisoned".to_string(),
        })?;
        f(&mut conn)
    }
}

#[async_trait]
impl StorageAdapter for SqliteAdapter {
    async fn get(&self, keys: &[&str]) -> StorageResult<Record> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached("SELECT value FROM kv WHERE key = ?1")?;
            let mut record = Record::new();
            for key in keys {
                let text: Option<String> = stmt
                    .query_row([key], |row| row.get(0))
                    .optional()?;
                if let Some(text) = text {
                    record.insert(key.to_string(), serde_json::from_str::<Value>(&text)?);
                }
            }
            Ok(record)
        })
    }

    async fn set(&self, record: Record) -> StorageResult<()> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare_cached(
                    "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                )?;
                let now = Utc::now().timestamp_millis();
                for (key, value) in &record {
                    stmt.execute(params![key, serde_json::to_string(value)?, now])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
    }

    fn describe(&self) -> String {
        match &self.path {
            Some(path) => format!("sqlite {}", path.display()),
            None => "sqlite (in memory)".to_string(),
        }
    }
}
