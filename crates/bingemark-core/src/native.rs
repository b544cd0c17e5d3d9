//! Native bookmark sources
//!
//! The browser keeps its own bookmark tree outside of Bingemark's storage.
//! A source exposes that tree read-only; `flatten_tree` turns it into the
//! flat list of `{title, url}` entries that imports work from.
//!
//! `BookmarkFile` reads the tree from disk, either a Chrome/Chromium profile
//! `Bookmarks` file or a dump of `chrome.bookmarks.getTree()`.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Roots of a Chrome profile `Bookmarks` file, in the order the browser shows them
const CHROME_ROOTS: [&str; 3] = ["bookmark_bar", "other", "synced"];

/// A node of the browser's bookmark tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BookmarkNode>,
}

impl BookmarkNode {
    pub fn leaf(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            url: Some(url.into()),
            children: Vec::new(),
        }
    }

    pub fn folder(title: impl Into<String>, children: Vec<BookmarkNode>) -> Self {
        Self {
            title: Some(title.into()),
            url: None,
            children,
        }
    }
}

/// A bookmark as reported by the browser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeBookmark {
    #[serde(default)]
    pub title: String,
    pub url: String,
}

/// Flatten a bookmark tree in pre-order.
///
/// A node with a non-empty url is emitted before its children are visited,
/// so a node that is both a bookmark and a container precedes its contents.
pub fn flatten_tree(nodes: &[BookmarkNode]) -> Vec<NativeBookmark> {
    let mut out = Vec::new();
    collect(nodes, &mut out);
    out
}

fn collect(nodes: &[BookmarkNode], out: &mut Vec<NativeBookmark>) {
    for node in nodes {
        if let Some(url) = node.url.as_deref().filter(|u| !u.is_empty()) {
            out.push(NativeBookmark {
                title: node.title.clone().unwrap_or_default(),
                url: url.to_string(),
            });
        }
        collect(&node.children, out);
    }
}

/// Errors reading a native bookmark source
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Bookmark file not found: '{path}'")]
    NotFound { path: PathBuf },

    #[error("Failed to read bookmark file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Bookmark file '{path}' is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unrecognised bookmark file layout in '{path}'")]
    UnknownLayout { path: PathBuf },
}

/// Read-only access to the browser's bookmark tree
#[async_trait]
pub trait NativeBookmarkSource: Send + Sync {
    async fn get_tree(&self) -> Result<Vec<BookmarkNode>, SourceError>;
}

/// A bookmark tree held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticTree(pub Vec<BookmarkNode>);

#[async_trait]
impl NativeBookmarkSource for StaticTree {
    async fn get_tree(&self) -> Result<Vec<BookmarkNode>, SourceError> {
        Ok(self.0.clone())
    }
}

/// Bookmark tree read from a file on disk
#[derive(Debug, Clone)]
pub struct BookmarkFile {
    path: PathBuf,
}

impl BookmarkFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Parse file content in either supported layout
    pub fn parse(&self, content: &str) -> Result<Vec<BookmarkNode>, SourceError> {
        let value: Value = serde_json::from_str(content).map_err(|e| SourceError::Parse {
            path: self.path.clone(),
            source: e,
        })?;

        match value {
            Value::Object(map) if map.contains_key("roots") => {
                let roots = map.get("roots").and_then(Value::as_object);
                let Some(roots) = roots else {
                    return Err(SourceError::UnknownLayout {
                        path: self.path.clone(),
                    });
                };
                Ok(CHROME_ROOTS
                    .iter()
                    .filter_map(|name| roots.get(*name))
                    .filter_map(chrome_node)
                    .collect())
            }
            Value::Array(_) => serde_json::from_value(value).map_err(|e| SourceError::Parse {
                path: self.path.clone(),
                source: e,
            }),
            _ => Err(SourceError::UnknownLayout {
                path: self.path.clone(),
            }),
        }
    }
}

#[async_trait]
impl NativeBookmarkSource for BookmarkFile {
    async fn get_tree(&self) -> Result<Vec<BookmarkNode>, SourceError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SourceError::NotFound {
                    path: self.path.clone(),
                })
            }
            Err(e) => {
                return Err(SourceError::Read {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };
        self.parse(&content)
    }
}

/// Convert a node of Chrome's profile format (`name`, `url`, `children`)
fn chrome_node(value: &Value) -> Option<BookmarkNode> {
    let obj = value.as_object()?;
    let children = obj
        .get("children")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(chrome_node).collect())
        .unwrap_or_default();

    Some(BookmarkNode {
        title: obj.get("name").and_then(Value::as_str).map(str::to_string),
        url: obj.get("url").and_then(Value::as_str).map(str::to_string),
        children,
    })
}
