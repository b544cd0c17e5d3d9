//! Errors raised by the state store and the import reconciler

use thiserror::Error;

use crate::bridge::BridgeError;
use crate::storage::StorageError;

/// Errors from state-store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The adapter refused or failed a write; in-memory state is unchanged
    #[error("Failed to save {key}: {source}")]
    Save {
        key: &'static str,
        #[source]
        source: StorageError,
    },

    /// Loading persisted state failed
    #[error("Failed to load stored data: {0}")]
    Load(#[source] StorageError),

    /// A persisted value does not have the expected shape
    #[error("Stored {key} could not be decoded: {source}")]
    Decode {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Bookmark not found: {0}")]
    BookmarkNotFound(String),

    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    #[error("Category already exists: {0}")]
    DuplicateCategory(String),

    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    #[error("The default category cannot be deleted")]
    ProtectedCategory,

    #[error("Category list must keep the default category")]
    MissingDefaultCategory,
}

impl StoreError {
    /// The underlying adapter failure, if this error came from storage
    pub fn storage_error(&self) -> Option<&StorageError> {
        match self {
            StoreError::Save { source, .. } | StoreError::Load(source) => Some(source),
            _ => None,
        }
    }
}

/// Errors from import operations. None of them leave partial state behind.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The file is not valid JSON
    #[error("Failed to parse import file: {0}")]
    Parse(#[from] serde_json::Error),

    /// Valid JSON, but neither a bookmark array nor an object with a `bookmarks` array
    #[error("Invalid bookmark file format")]
    InvalidFormat,

    /// One entry of the payload is not a bookmark
    #[error("Invalid bookmark at position {index}: {source}")]
    InvalidBookmark {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    /// The browser returned nothing to import
    #[error("No bookmarks found to import")]
    NoNativeBookmarks,

    /// No bridge was configured for native imports
    #[error("No background service is available for native imports")]
    NoBridge,

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
