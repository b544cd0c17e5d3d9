//! SQLite schema for the key/value backend
//!
//! One row per storage key; values are JSON text.

use rusqlite::{Connection, OptionalExtension, Result};

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Schema version tracking
        CREATE TABLE IF NOT EXISTS schema_info (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        -- Stored values, keyed like extension storage
        CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR REPLACE INTO schema_info (key, value) VALUES ('version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

/// Check whether the schema still has to be created
pub fn needs_init(conn: &Connection) -> bool {
    schema_version(conn).map_or(true, |v| v.is_none())
}

/// Read the stored schema version, if any
pub fn schema_version(conn: &Connection) -> Result<Option<i32>> {
    let table_exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = 'schema_info'",
        [],
        |row| row.get(0),
    )?;
    if !table_exists {
        return Ok(None);
    }

    let version: Option<String> = conn
        .query_row(
            "SELECT value FROM schema_info WHERE key = 'version'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    Ok(version.and_then(|v| v.parse().ok()))
}
