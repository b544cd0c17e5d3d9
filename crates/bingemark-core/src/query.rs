//! Bookmark filtering
//!
//! Pure derivation of the visible bookmarks from the current filter state.
//! Nothing is cached; the view is recomputed on every read.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::{Bookmark, Category};

/// `selected_category` value that matches every category
pub const ALL_CATEGORIES: &str = "all";

/// Search term, category and tag selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkFilter {
    pub search_term: String,
    pub selected_category: String,
    pub selected_tags: Vec<String>,
}

impl Default for BookmarkFilter {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            selected_category: ALL_CATEGORIES.to_string(),
            selected_tags: Vec::new(),
        }
    }
}

impl BookmarkFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.selected_category = category_id.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.selected_tags = tags;
        self
    }

    /// Select `tag` if it is not selected, otherwise deselect it
    pub fn toggle_tag(&mut self, tag: &str) {
        if let Some(pos) = self.selected_tags.iter().position(|t| t == tag) {
            self.selected_tags.remove(pos);
        } else {
            self.selected_tags.push(tag.to_string());
        }
    }

    /// A bookmark matches when the search term, category and every selected tag match
    pub fn matches(&self, bookmark: &Bookmark) -> bool {
        self.matches_search(bookmark) && self.matches_category(bookmark) && self.matches_tags(bookmark)
    }

    /// Case-insensitive substring match against title, description or any tag
    fn matches_search(&self, bookmark: &Bookmark) -> bool {
        let term = self.search_term.to_lowercase();
        bookmark.title.to_lowercase().contains(&term)
            || bookmark.description.to_lowercase().contains(&term)
            || bookmark.tags.iter().any(|t| t.to_lowercase().contains(&term))
    }

    fn matches_category(&self, bookmark: &Bookmark) -> bool {
        self.selected_category == ALL_CATEGORIES || bookmark.category_id == self.selected_category
    }

    fn matches_tags(&self, bookmark: &Bookmark) -> bool {
        self.selected_tags.iter().all(|tag| bookmark.has_tag(tag))
    }

    /// Matching bookmarks, in collection order
    pub fn apply<'a>(&self, bookmarks: &'a [Bookmark]) -> Vec<&'a Bookmark> {
        bookmarks.iter().filter(|b| self.matches(b)).collect()
    }
}

/// Every distinct tag, in the order first seen
pub fn all_tags(bookmarks: &[Bookmark]) -> Vec<String> {
    let mut seen = HashSet::new();
    bookmarks
        .iter()
        .flat_map(|b| b.tags.iter())
        .filter(|tag| seen.insert(tag.as_str()))
        .cloned()
        .collect()
}

/// Every distinct tag with the number of bookmarks carrying it, in the order first seen
pub fn tags_with_counts(bookmarks: &[Bookmark]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for tag in bookmarks.iter().flat_map(|b| b.tags.iter()) {
        *counts.entry(tag.as_str()).or_default() += 1;
    }
    all_tags(bookmarks)
        .into_iter()
        .map(|tag| {
            let count = counts.get(tag.as_str()).copied().unwrap_or(0);
            (tag, count)
        })
        .collect()
}

/// Categories not listed in `hidden`
pub fn visible_categories<'a>(categories: &'a [Category], hidden: &[String]) -> Vec<&'a Category> {
    categories
        .iter()
        .filter(|c| !hidden.iter().any(|h| h == &c.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bookmark(title: &str, description: &str, tags: &[&str], category: &str) -> Bookmark {
        let mut b = Bookmark::new(title, format!("https://{}.example", title.to_lowercase()));
        b.set_description(description);
        b.set_tags(tags.iter().map(|t| t.to_string()).collect());
        b.set_category(category);
        b
    }

    fn sample() -> Vec<Bookmark> {
        vec![
            bookmark("Rust", "Systems language", &["lang", "systems"], "work"),
            bookmark("Cooking", "Recipes for weeknights", &["food"], "personal"),
            bookmark("Tokio", "Async runtime", &["lang", "async"], "work"),
        ]
    }

    fn titles(result: &[&Bookmark]) -> Vec<String> {
        result.iter().map(|b| b.title.clone()).collect()
    }

    #[test]
    fn test_empty_filter_is_identity() {
        let bookmarks = sample();
        let result = BookmarkFilter::new().apply(&bookmarks);
        assert_eq!(result.len(), bookmarks.len());
        assert!(result.iter().zip(bookmarks.iter()).all(|(a, b)| *a == b));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let bookmarks = sample();
        let result = BookmarkFilter::new().with_search("RUST").apply(&bookmarks);
        assert_eq!(titles(&result), vec!["Rust"]);
    }

    #[test]
    fn test_search_matches_description_and_tags() {
        let bookmarks = sample();

        let result = BookmarkFilter::new().with_search("recipes").apply(&bookmarks);
        assert_eq!(titles(&result), vec!["Cooking"]);

        let result = BookmarkFilter::new().with_search("asy").apply(&bookmarks);
        assert_eq!(titles(&result), vec!["Tokio"]);
    }

    #[test]
    fn test_category_filter() {
        let bookmarks = sample();
        let result = BookmarkFilter::new().with_category("work").apply(&bookmarks);
        assert_eq!(titles(&result), vec!["Rust", "Tokio"]);

        let result = BookmarkFilter::new().with_category("missing").apply(&bookmarks);
        assert!(result.is_empty());
    }

    #[test]
    fn test_tag_filter_is_conjunctive() {
        let b = bookmark("Both", "", &["a", "b"], "default");
        let bookmarks = vec![b];

        let result = BookmarkFilter::new()
            .with_tags(vec!["a".to_string(), "b".to_string()])
            .apply(&bookmarks);
        assert_eq!(result.len(), 1);

        let result = BookmarkFilter::new()
            .with_tags(vec!["a".to_string(), "c".to_string()])
            .apply(&bookmarks);
        assert!(result.is_empty());
    }

    #[test]
    fn test_tag_filter_is_case_sensitive() {
        let bookmarks = sample();
        let result = BookmarkFilter::new()
            .with_tags(vec!["LANG".to_string()])
            .apply(&bookmarks);
        assert!(result.is_empty());
    }

    #[test]
    fn test_all_criteria_combine() {
        let bookmarks = sample();
        let result = BookmarkFilter::new()
            .with_search("async")
            .with_category("work")
            .with_tags(vec!["lang".to_string()])
            .apply(&bookmarks);
        assert_eq!(titles(&result), vec!["Tokio"]);
    }

    #[test]
    fn test_toggle_tag() {
        let mut filter = BookmarkFilter::new();
        filter.toggle_tag("a");
        filter.toggle_tag("b");
        assert_eq!(filter.selected_tags, vec!["a", "b"]);
        filter.toggle_tag("a");
        assert_eq!(filter.selected_tags, vec!["b"]);
    }

    #[test]
    fn test_all_tags_first_seen_order() {
        let bookmarks = sample();
        assert_eq!(
            all_tags(&bookmarks),
            vec!["lang", "systems", "food", "async"]
        );
        assert!(all_tags(&[]).is_empty());
    }

    #[test]
    fn test_tags_with_counts() {
        let bookmarks = sample();
        let counts = tags_with_counts(&bookmarks);
        assert_eq!(counts[0], ("lang".to_string(), 2));
        assert_eq!(counts.len(), 4);
        assert!(counts.iter().skip(1).all(|(_, n)| *n == 1));
    }

    #[test]
    fn test_visible_categories() {
        let categories = crate::models::seed_categories();
        let visible = visible_categories(&categories, &["work".to_string()]);
        let ids: Vec<_> = visible.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["default", "personal"]);
    }
}
