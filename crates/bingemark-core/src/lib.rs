//! Bingemark Core Library
//!
//! This crate provides the core of Bingemark, a visual bookmark manager:
//! the bookmark/category state store, the import/export reconciler and the
//! query/filter engine.
//!
//! # Architecture
//!
//! - **Storage adapter**: asynchronous key/value storage (JSON file, SQLite
//!   or memory). It is the durable system of record.
//! - **State store**: holds the loaded collections and writes every change
//!   through the adapter before applying it in memory.
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let mut store = BookmarkStore::open_with_config(&config).await?;
//!
//! // Add a bookmark
//! store.add_bookmark(Bookmark::new("Rust", "https://www.rust-lang.org/")).await?;
//!
//! // Query bookmarks
//! store.set_search_term("rust");
//! let visible = store.filtered_bookmarks();
//! ```
//!
//! # Modules
//!
//! - `store`: State store (main entry point)
//! - `models`: Bookmarks, categories and display preferences
//! - `import`: Import payloads, merge policies and export documents
//! - `query`: Bookmark filtering and tag enumeration
//! - `native`: The browser's own bookmark tree
//! - `bridge`: Messages exchanged with the background service
//! - `storage`: Storage adapters
//! - `config`: Application configuration

pub mod bridge;
pub mod config;
pub mod error;
pub mod id;
pub mod import;
pub mod models;
pub mod native;
pub mod query;
pub mod storage;
pub mod store;

pub use bridge::{BridgeError, BridgeRequest, BridgeResponse, LocalBridge, MessageBridge};
pub use config::{Config, StorageBackend};
pub use error::{ImportError, StoreError};
pub use import::{ExportDocument, ImportOutcome, ImportPayload, ImportPolicy};
pub use models::{Bookmark, CardSize, Category, CategoryLayout, DisplaySettings, Theme};
pub use native::{BookmarkFile, BookmarkNode, NativeBookmark, NativeBookmarkSource};
pub use query::BookmarkFilter;
pub use storage::{StorageAdapter, StorageError};
pub use store::{BookmarkStore, StoreEvent, StoreState};
