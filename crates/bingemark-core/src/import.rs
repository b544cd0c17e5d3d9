//! Import/export reconciliation
//!
//! Combines an existing bookmark collection with an incoming one under an
//! explicit policy and keeps categories consistent with what the incoming
//! bookmarks reference.
//!
//! ## Payloads
//!
//! An import file is either a bare array of bookmarks or an object
//! `{"bookmarks": [...], "categories": [...]}`. The shape is resolved once,
//! at the boundary, into `ImportPayload`.
//!
//! ## Policies
//!
//! - `Replace`: the incoming collection becomes the collection
//! - `Add`: incoming bookmarks whose URL already exists are dropped, the
//!   rest are appended. Incoming entries are only checked against the
//!   existing collection, not against each other.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ImportError;
use crate::id::generate_import_id;
use crate::models::{category_name_for, favicon_url, Bookmark, Category, DEFAULT_CATEGORY_ID};
use crate::native::NativeBookmark;

/// Title given to native bookmarks that have none
pub const UNTITLED: &str = "Untitled";

/// How incoming bookmarks combine with existing ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportPolicy {
    /// Discard existing bookmarks
    Replace,
    /// Append bookmarks whose URL is not already saved
    Add,
}

impl FromStr for ImportPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replace" => Ok(ImportPolicy::Replace),
            "add" => Ok(ImportPolicy::Add),
            other => Err(format!("unknown import mode '{}' (expected add or replace)", other)),
        }
    }
}

impl fmt::Display for ImportPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportPolicy::Replace => f.write_str("replace"),
            ImportPolicy::Add => f.write_str("add"),
        }
    }
}

/// A parsed import file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportPayload {
    /// A bare array of bookmarks
    BareList(Vec<Bookmark>),
    /// `{bookmarks, categories?}`
    Envelope {
        bookmarks: Vec<Bookmark>,
        categories: Option<Vec<Category>>,
    },
}

impl ImportPayload {
    /// Parse file content. Nothing is mutated on failure.
    pub fn parse(text: &str) -> Result<Self, ImportError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Resolve the payload shape from a JSON value
    pub fn from_value(value: Value) -> Result<Self, ImportError> {
        match value {
            Value::Array(items) => Ok(ImportPayload::BareList(parse_bookmarks(items)?)),
            Value::Object(mut map) => {
                let bookmarks = match map.remove("bookmarks") {
                    Some(Value::Array(items)) => parse_bookmarks(items)?,
                    _ => return Err(ImportError::InvalidFormat),
                };
                // A categories field that is not a list is ignored, like a missing one
                let categories = match map.remove("categories") {
                    Some(value @ Value::Array(_)) => Some(serde_json::from_value(value)?),
                    _ => None,
                };
                Ok(ImportPayload::Envelope {
                    bookmarks,
                    categories,
                })
            }
            _ => Err(ImportError::InvalidFormat),
        }
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        match self {
            ImportPayload::BareList(bookmarks) => bookmarks,
            ImportPayload::Envelope { bookmarks, .. } => bookmarks,
        }
    }

    pub fn categories(&self) -> Option<&[Category]> {
        match self {
            ImportPayload::BareList(_) => None,
            ImportPayload::Envelope { categories, .. } => categories.as_deref(),
        }
    }

    /// Split into bookmarks and the optional parallel category list
    pub fn into_parts(self) -> (Vec<Bookmark>, Option<Vec<Category>>) {
        match self {
            ImportPayload::BareList(bookmarks) => (bookmarks, None),
            ImportPayload::Envelope {
                bookmarks,
                categories,
            } => (bookmarks, categories),
        }
    }
}

fn parse_bookmarks(items: Vec<Value>) -> Result<Vec<Bookmark>, ImportError> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| -> Result<Bookmark, ImportError> {
            let mut bookmark: Bookmark = serde_json::from_value(item)
                .map_err(|source| ImportError::InvalidBookmark { index, source })?;
            let tags = std::mem::take(&mut bookmark.tags);
            bookmark.set_tags(tags);
            Ok(bookmark)
        })
        .collect()
}

/// Give every bookmark without an id a fresh one
pub fn assign_missing_ids(bookmarks: &mut [Bookmark]) {
    for (index, bookmark) in bookmarks.iter_mut().enumerate() {
        if bookmark.id.trim().is_empty() {
            bookmark.id = generate_import_id(index);
        }
    }
}

/// Turn entries reported by the browser into bookmarks
pub fn bookmarks_from_native(entries: &[NativeBookmark]) -> Vec<Bookmark> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| Bookmark {
            id: generate_import_id(index),
            title: if entry.title.is_empty() {
                UNTITLED.to_string()
            } else {
                entry.title.clone()
            },
            url: entry.url.clone(),
            description: String::new(),
            image_url: favicon_url(&entry.url),
            tags: Vec::new(),
            category_id: DEFAULT_CATEGORY_ID.to_string(),
        })
        .collect()
}

/// Result of merging two bookmark collections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merge {
    /// The collection to persist
    pub bookmarks: Vec<Bookmark>,
    /// Incoming bookmarks that made it into the collection
    pub added: usize,
    /// Incoming bookmarks dropped because their URL was already saved
    pub skipped: usize,
}

/// Merge `incoming` into `existing` under `policy`.
///
/// Under `Add`, an incoming bookmark whose id is already taken gets a
/// fresh import id.
pub fn merge_bookmarks(existing: &[Bookmark], incoming: Vec<Bookmark>, policy: ImportPolicy) -> Merge {
    match policy {
        ImportPolicy::Replace => Merge {
            added: incoming.len(),
            skipped: 0,
            bookmarks: incoming,
        },
        ImportPolicy::Add => {
            let existing_urls: HashSet<&str> = existing.iter().map(|b| b.url.as_str()).collect();
            let mut taken_ids: HashSet<String> = existing.iter().map(|b| b.id.clone()).collect();
            let total = incoming.len();
            let fresh: Vec<Bookmark> = incoming
                .into_iter()
                .enumerate()
                .filter(|(_, b)| !existing_urls.contains(b.url.as_str()))
                .map(|(index, mut b)| {
                    while !taken_ids.insert(b.id.clone()) {
                        b.id = generate_import_id(index);
                    }
                    b
                })
                .collect();

            let added = fresh.len();
            let mut bookmarks = existing.to_vec();
            bookmarks.extend(fresh);

            Merge {
                bookmarks,
                added,
                skipped: total - added,
            }
        }
    }
}

/// Categories referenced by `incoming` that `existing` lacks.
///
/// Names come from `incoming_categories` when it lists the id, otherwise
/// the id with its first character upper-cased. The default category is
/// never created here. Order follows first reference.
pub fn missing_categories(
    existing: &[Category],
    incoming: &[Bookmark],
    incoming_categories: Option<&[Category]>,
) -> Vec<Category> {
    let known: HashSet<&str> = existing.iter().map(|c| c.id.as_str()).collect();
    let mut seen = HashSet::new();

    incoming
        .iter()
        .map(|b| b.category_id.as_str())
        .filter(|id| !id.is_empty() && *id != DEFAULT_CATEGORY_ID)
        .filter(|id| !known.contains(id))
        .filter(|id| seen.insert(*id))
        .map(|id| {
            let name = incoming_categories
                .and_then(|cats| cats.iter().find(|c| c.id == id))
                .map(|c| c.name.clone())
                .unwrap_or_else(|| category_name_for(id));
            Category::new(id, name)
        })
        .collect()
}

/// What an import did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub policy: ImportPolicy,
    /// Bookmarks written by the import (all of them under `Replace`)
    pub added: usize,
    /// Incoming bookmarks skipped as duplicates
    pub skipped: usize,
    /// Size of the bookmark collection afterwards
    pub total: usize,
    /// Categories created for the incoming bookmarks
    pub new_categories: Vec<Category>,
    /// Set when saving the new categories failed; the bookmark save still ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_error: Option<String>,
}

impl ImportOutcome {
    /// True when nothing was written
    pub fn is_noop(&self) -> bool {
        self.policy == ImportPolicy::Add && self.added == 0
    }
}

impl fmt::Display for ImportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.policy {
            ImportPolicy::Replace => write!(f, "Replaced with {} imported bookmarks", self.added)?,
            ImportPolicy::Add if self.added == 0 => f.write_str("No new bookmarks to add")?,
            ImportPolicy::Add => write!(f, "Added {} new bookmarks", self.added)?,
        }
        if !self.new_categories.is_empty() {
            write!(f, " and {} new categories", self.new_categories.len())?;
        }
        Ok(())
    }
}

/// The export file: always both fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub bookmarks: Vec<Bookmark>,
    pub categories: Vec<Category>,
}

impl ExportDocument {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::seed_categories;

    fn saved(url: &str) -> Bookmark {
        Bookmark::new(url.trim_start_matches("https://"), url)
    }

    #[test]
    fn test_parse_bare_list() {
        let payload =
            ImportPayload::parse(r#"[{"id": "1", "title": "A", "url": "https://a.example"}]"#)
                .unwrap();
        assert!(matches!(payload, ImportPayload::BareList(_)));
        assert_eq!(payload.bookmarks().len(), 1);
        assert!(payload.categories().is_none());
    }

    #[test]
    fn test_parse_envelope() {
        let payload = ImportPayload::parse(
            r#"{"bookmarks": [{"title": "A", "url": "https://a.example", "categoryId": "movies"}],
                "categories": [{"id": "movies", "name": "Movies"}]}"#,
        )
        .unwrap();
        assert_eq!(payload.bookmarks()[0].category_id, "movies");
        assert_eq!(payload.categories().unwrap()[0].name, "Movies");
    }

    #[test]
    fn test_parse_envelope_without_categories() {
        let payload = ImportPayload::parse(r#"{"bookmarks": [], "categories": "nope"}"#).unwrap();
        assert_eq!(
            payload,
            ImportPayload::Envelope {
                bookmarks: vec![],
                categories: None
            }
        );
    }

    #[test]
    fn test_parse_rejects_other_shapes() {
        for text in [r#"{"items": []}"#, r#"{"bookmarks": {}}"#, "42", r#""bookmarks""#, "null"] {
            assert!(
                matches!(ImportPayload::parse(text), Err(ImportError::InvalidFormat)),
                "{} should be an invalid format",
                text
            );
        }
    }

    #[test]
    fn test_parse_reports_syntax_errors() {
        assert!(matches!(
            ImportPayload::parse("[{"),
            Err(ImportError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_reports_bad_entry_position() {
        let err = ImportPayload::parse(r#"[{"url": "https://a.example"}, {"title": "no url"}]"#)
            .unwrap_err();
        assert!(matches!(err, ImportError::InvalidBookmark { index: 1, .. }));
    }

    #[test]
    fn test_assign_missing_ids() {
        let mut bookmarks = vec![saved("https://a.example"), saved("https://b.example")];
        bookmarks[0].id = "keep".to_string();
        bookmarks[1].id = String::new();

        assign_missing_ids(&mut bookmarks);
        assert_eq!(bookmarks[0].id, "keep");
        assert!(bookmarks[1].id.starts_with("imported-"));
    }

    #[test]
    fn test_bookmarks_from_native() {
        let entries = vec![
            NativeBookmark {
                title: String::new(),
                url: "https://docs.rs/serde".to_string(),
            },
            NativeBookmark {
                title: "Crates".to_string(),
                url: "https://crates.io/".to_string(),
            },
        ];

        let bookmarks = bookmarks_from_native(&entries);
        assert_eq!(bookmarks[0].title, UNTITLED);
        assert_eq!(bookmarks[1].title, "Crates");
        assert_eq!(
            bookmarks[0].image_url,
            "https://www.google.com/s2/favicons?domain=docs.rs&sz=128"
        );
        assert!(bookmarks.iter().all(|b| b.category_id == DEFAULT_CATEGORY_ID));
        assert!(bookmarks.iter().all(|b| b.tags.is_empty()));
        assert_ne!(bookmarks[0].id, bookmarks[1].id);
    }

    #[test]
    fn test_replace_discards_existing() {
        let x = saved("https://x.example");
        let y = saved("https://y.example");

        let merge = merge_bookmarks(&[x], vec![y.clone()], ImportPolicy::Replace);
        assert_eq!(merge.bookmarks, vec![y]);
        assert_eq!(merge.added, 1);
    }

    #[test]
    fn test_add_appends_unseen_urls_in_order() {
        let existing = vec![saved("https://a.example"), saved("https://b.example")];
        let incoming = vec![
            saved("https://c.example"),
            saved("https://a.example"),
            saved("https://d.example"),
        ];

        let merge = merge_bookmarks(&existing, incoming, ImportPolicy::Add);
        let urls: Vec<_> = merge.bookmarks.iter().map(|b| b.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://a.example",
                "https://b.example",
                "https://c.example",
                "https://d.example"
            ]
        );
        assert_eq!(merge.added, 2);
        assert_eq!(merge.skipped, 1);
    }

    #[test]
    fn test_add_is_idempotent() {
        let incoming = vec![saved("https://a.example"), saved("https://b.example")];

        let first = merge_bookmarks(&[], incoming.clone(), ImportPolicy::Add);
        assert_eq!(first.added, 2);

        let second = merge_bookmarks(&first.bookmarks, incoming, ImportPolicy::Add);
        assert_eq!(second.added, 0);
        assert_eq!(second.bookmarks, first.bookmarks);
    }

    #[test]
    fn test_add_keeps_duplicates_within_incoming_batch() {
        // Incoming entries are only deduplicated against existing bookmarks
        let incoming = vec![saved("https://same.example"), saved("https://same.example")];
        let merge = merge_bookmarks(&[], incoming, ImportPolicy::Add);
        assert_eq!(merge.added, 2);
        assert_eq!(merge.bookmarks.len(), 2);
    }

    #[test]
    fn test_add_reissues_colliding_ids() {
        let mut existing = saved("https://a.example");
        existing.id = "1".to_string();
        let mut incoming = saved("https://b.example");
        incoming.id = "1".to_string();
        let mut twin = saved("https://c.example");
        twin.id = "2".to_string();
        let mut twin_again = saved("https://d.example");
        twin_again.id = "2".to_string();

        let merge = merge_bookmarks(
            &[existing],
            vec![incoming, twin, twin_again],
            ImportPolicy::Add,
        );
        let ids: Vec<_> = merge.bookmarks.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids[0], "1");
        assert!(ids[1].starts_with("imported-"));
        assert_eq!(ids[2], "2");
        assert!(ids[3].starts_with("imported-"));
        assert_eq!(merge.bookmarks[1].url, "https://b.example");
        assert_eq!(merge.added, 3);
    }

    #[test]
    fn test_replace_keeps_incoming_ids() {
        let mut existing = saved("https://a.example");
        existing.id = "1".to_string();
        let mut incoming = saved("https://b.example");
        incoming.id = "1".to_string();

        let merge = merge_bookmarks(&[existing], vec![incoming], ImportPolicy::Replace);
        assert_eq!(merge.bookmarks[0].id, "1");
    }

    #[test]
    fn test_parse_normalises_tags() {
        let payload = ImportPayload::parse(
            r#"[{"url": "https://a.example", "tags": ["x", "x", " ", " y "]}]"#,
        )
        .unwrap();
        assert_eq!(payload.bookmarks()[0].tags, vec!["x", "y"]);
    }

    #[test]
    fn test_missing_categories_uses_supplied_names() {
        let mut movie = saved("https://film.example");
        movie.set_category("movies");

        let created = missing_categories(
            &seed_categories(),
            &[movie],
            Some(&[Category::new("movies", "Movies & TV")]),
        );
        assert_eq!(created, vec![Category::new("movies", "Movies & TV")]);
    }

    #[test]
    fn test_missing_categories_derives_names() {
        let mut a = saved("https://a.example");
        a.set_category("reading");
        let mut b = saved("https://b.example");
        b.set_category("work");
        let mut c = saved("https://c.example");
        c.set_category("reading");
        let d = saved("https://d.example");

        let created = missing_categories(&seed_categories(), &[a, b, c, d], None);
        assert_eq!(created, vec![Category::new("reading", "Reading")]);
    }

    #[test]
    fn test_missing_categories_never_creates_default() {
        let mut bookmark = saved("https://a.example");
        bookmark.set_category(DEFAULT_CATEGORY_ID);
        assert!(missing_categories(&[], &[bookmark], None).is_empty());
    }

    #[test]
    fn test_outcome_messages() {
        let mut outcome = ImportOutcome {
            policy: ImportPolicy::Add,
            added: 0,
            skipped: 3,
            total: 3,
            new_categories: vec![],
            category_error: None,
        };
        assert!(outcome.is_noop());
        assert_eq!(outcome.to_string(), "No new bookmarks to add");

        outcome.added = 2;
        outcome.new_categories = vec![Category::new("movies", "Movies")];
        assert_eq!(outcome.to_string(), "Added 2 new bookmarks and 1 new categories");

        outcome.policy = ImportPolicy::Replace;
        outcome.new_categories.clear();
        assert_eq!(outcome.to_string(), "Replaced with 2 imported bookmarks");
    }

    #[test]
    fn test_export_document_always_has_both_fields() {
        let json = ExportDocument::default().to_json_pretty().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["bookmarks"], serde_json::json!([]));
        assert_eq!(value["categories"], serde_json::json!([]));

        // An export can be imported back as an envelope
        let payload = ImportPayload::parse(&json).unwrap();
        assert!(matches!(payload, ImportPayload::Envelope { categories: Some(_), .. }));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("add".parse::<ImportPolicy>().unwrap(), ImportPolicy::Add);
        assert_eq!("replace".parse::<ImportPolicy>().unwrap(), ImportPolicy::Replace);
        assert!("merge".parse::<ImportPolicy>().is_err());
    }
}
