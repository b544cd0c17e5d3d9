//! Data models for Bingemark
//!
//! Defines the persisted data structures: Bookmark, Category, DisplaySettings
//! and Theme. Field names serialize in camelCase so stored records and
//! exported files keep the browser extension's shape.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::id::generate_id;

/// Id of the built-in fallback category. It always exists and cannot be deleted.
pub const DEFAULT_CATEGORY_ID: &str = "default";

fn default_category_id() -> String {
    DEFAULT_CATEGORY_ID.to_string()
}

/// A saved bookmark
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    /// Opaque unique identifier. Empty when an imported entry carried none.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    /// Preview image, usually an Open Graph image or the host favicon
    #[serde(default)]
    pub image_url: String,
    /// Tags in display order, no duplicates
    #[serde(default)]
    pub tags: Vec<String>,
    /// Foreign key into `Category::id`
    #[serde(default = "default_category_id")]
    pub category_id: String,
}

impl Bookmark {
    /// Create a new bookmark with a fresh id, favicon preview and the default category
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            id: generate_id(),
            title: title.into(),
            image_url: favicon_url(&url),
            url,
            description: String::new(),
            tags: Vec::new(),
            category_id: default_category_id(),
        }
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn set_category(&mut self, category_id: impl Into<String>) {
        self.category_id = category_id.into();
    }

    /// Add a tag. Blank tags and tags already present are ignored.
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        let tag = tag.trim();
        if !tag.is_empty() && !self.tags.iter().any(|t| t == tag) {
            self.tags.push(tag.to_string());
        }
    }

    /// Remove a tag
    pub fn remove_tag(&mut self, tag: &str) {
        if let Some(pos) = self.tags.iter().position(|t| t == tag) {
            self.tags.remove(pos);
        }
    }

    /// Set all tags (replacing existing), keeping the first occurrence of duplicates
    pub fn set_tags(&mut self, tags: Vec<String>) {
        self.tags.clear();
        for tag in tags {
            self.add_tag(tag);
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Favicon service URL for the host of `url`, or an empty string if it has no host.
pub fn favicon_url(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => format!("https://www.google.com/s2/favicons?domain={}&sz=128", host),
            None => String::new(),
        },
        Err(_) => String::new(),
    }
}

/// A named group of bookmarks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Create a category whose id is derived from its display name
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        Self::new(category_id_for(name), name)
    }

    pub fn is_default(&self) -> bool {
        self.id == DEFAULT_CATEGORY_ID
    }
}

/// Derive a category id from a display name: lower-cased, whitespace runs become `-`.
pub fn category_id_for(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Display name for a category id with no known name: first character upper-cased.
pub fn category_name_for(id: &str) -> String {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The categories every fresh installation starts with
pub fn seed_categories() -> Vec<Category> {
    vec![
        default_category(),
        Category::new("work", "Work"),
        Category::new("personal", "Personal"),
    ]
}

/// The seed entry for the default category
pub fn default_category() -> Category {
    Category::new(DEFAULT_CATEGORY_ID, "General")
}

/// Whether `categories` contains the default category
pub fn has_default_category(categories: &[Category]) -> bool {
    categories.iter().any(Category::is_default)
}

/// Size of bookmark cards in the grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CardSize {
    Small,
    Medium,
    Large,
    #[default]
    Default,
}

/// How category sections are laid out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryLayout {
    #[default]
    Grid,
    Flex,
    Horizontal,
}

impl CardSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardSize::Small => "small",
            CardSize::Medium => "medium",
            CardSize::Large => "large",
            CardSize::Default => "default",
        }
    }
}

impl CategoryLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryLayout::Grid => "grid",
            CategoryLayout::Flex => "flex",
            CategoryLayout::Horizontal => "horizontal",
        }
    }
}

impl FromStr for CardSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "small" => Ok(CardSize::Small),
            "medium" => Ok(CardSize::Medium),
            "large" => Ok(CardSize::Large),
            "default" => Ok(CardSize::Default),
            other => Err(format!(
                "unknown card size '{}' (expected small, medium, large or default)",
                other
            )),
        }
    }
}

impl FromStr for CategoryLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grid" => Ok(CategoryLayout::Grid),
            "flex" => Ok(CategoryLayout::Flex),
            "horizontal" => Ok(CategoryLayout::Horizontal),
            other => Err(format!(
                "unknown category layout '{}' (expected grid, flex or horizontal)",
                other
            )),
        }
    }
}

// Stored settings are read leniently: an unrecognised value renders with the default.
impl<'de> Deserialize<'de> for CardSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(value.parse().unwrap_or_default())
    }
}

impl<'de> Deserialize<'de> for CategoryLayout {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(value.parse().unwrap_or_default())
    }
}

impl fmt::Display for CardSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for CategoryLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process-wide display preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySettings {
    #[serde(default)]
    pub card_size: CardSize,
    #[serde(default)]
    pub category_layout: CategoryLayout,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            card_size: CardSize::Large,
            category_layout: CategoryLayout::Grid,
        }
    }
}

/// Color theme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => f.write_str("light"),
            Theme::Dark => f.write_str("dark"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bookmark_new() {
        let bookmark = Bookmark::new("Rust", "https://www.rust-lang.org/learn");
        assert!(!bookmark.id.is_empty());
        assert_eq!(bookmark.title, "Rust");
        assert_eq!(bookmark.category_id, DEFAULT_CATEGORY_ID);
        assert_eq!(
            bookmark.image_url,
            "https://www.google.com/s2/favicons?domain=www.rust-lang.org&sz=128"
        );
        assert!(bookmark.tags.is_empty());
        assert!(bookmark.description.is_empty());
    }

    #[test]
    fn test_bookmark_tags() {
        let mut bookmark = Bookmark::new("Example", "https://example.com");
        bookmark.add_tag("rust");
        bookmark.add_tag("programming");
        assert_eq!(bookmark.tags, vec!["rust", "programming"]);

        // Adding duplicate should not add again
        bookmark.add_tag("rust");
        bookmark.add_tag("   ");
        assert_eq!(bookmark.tags.len(), 2);

        bookmark.remove_tag("rust");
        assert_eq!(bookmark.tags, vec!["programming"]);
    }

    #[test]
    fn test_bookmark_set_tags_collapses_duplicates() {
        let mut bookmark = Bookmark::new("Example", "https://example.com");
        bookmark.set_tags(vec![
            "b".to_string(),
            "a".to_string(),
            "b".to_string(),
        ]);
        assert_eq!(bookmark.tags, vec!["b", "a"]);
    }

    #[test]
    fn test_favicon_url_without_host() {
        assert_eq!(favicon_url("not a url"), "");
        assert_eq!(favicon_url("mailto:someone@example.com"), "");
    }

    #[test]
    fn test_category_from_name() {
        let category = Category::from_name("  Reading   List ");
        assert_eq!(category.id, "reading-list");
        assert_eq!(category.name, "Reading   List");
        assert!(!category.is_default());
    }

    #[test]
    fn test_category_name_for() {
        assert_eq!(category_name_for("movies"), "Movies");
        assert_eq!(category_name_for("éclair"), "Éclair");
        assert_eq!(category_name_for(""), "");
    }

    #[test]
    fn test_seed_categories() {
        let seeds = seed_categories();
        let ids: Vec<_> = seeds.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["default", "work", "personal"]);
        assert!(seeds[0].is_default());
    }

    #[test]
    fn test_bookmark_json_shape() {
        let mut bookmark = Bookmark::new("Example", "https://example.com");
        bookmark.set_category("work");
        let json = serde_json::to_value(&bookmark).unwrap();
        assert_eq!(json["categoryId"], "work");
        assert!(json.get("imageUrl").is_some());
    }

    #[test]
    fn test_bookmark_deserialize_fills_defaults() {
        let bookmark: Bookmark =
            serde_json::from_str(r#"{"title": "Bare", "url": "https://bare.example"}"#).unwrap();
        assert!(bookmark.id.is_empty());
        assert_eq!(bookmark.category_id, DEFAULT_CATEGORY_ID);
        assert!(bookmark.tags.is_empty());
    }

    #[test]
    fn test_display_settings_defaults() {
        let settings = DisplaySettings::default();
        assert_eq!(settings.card_size, CardSize::Large);
        assert_eq!(settings.category_layout, CategoryLayout::Grid);
    }

    #[test]
    fn test_display_settings_unknown_values_fall_through() {
        let settings: DisplaySettings =
            serde_json::from_str(r#"{"cardSize": "huge", "categoryLayout": "masonry"}"#).unwrap();
        assert_eq!(settings.card_size, CardSize::Default);
        assert_eq!(settings.category_layout, CategoryLayout::Grid);
    }

    #[test]
    fn test_display_settings_serialization() {
        let settings = DisplaySettings {
            card_size: CardSize::Small,
            category_layout: CategoryLayout::Horizontal,
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(json, r#"{"cardSize":"small","categoryLayout":"horizontal"}"#);
    }

    #[test]
    fn test_theme_toggle() {
        assert_eq!(Theme::default(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(serde_json::to_string(&Theme::Light).unwrap(), r#""light""#);
    }
}
