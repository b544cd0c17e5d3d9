//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use bingemark_core::{Bookmark, Category, DisplaySettings, ImportOutcome, Theme};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print a single bookmark
    pub fn print_bookmark(&self, bookmark: &Bookmark, category: Option<&Category>) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:          {}", bookmark.id);
                println!("Title:       {}", bookmark.title);
                println!("URL:         {}", bookmark.url);
                if !bookmark.description.is_empty() {
                    println!("Description: {}", bookmark.description);
                }
                match category {
                    Some(category) => println!("Category:    {} ({})", category.name, category.id),
                    None => println!("Category:    {}", bookmark.category_id),
                }
                if !bookmark.tags.is_empty() {
                    println!("Tags:        {}", bookmark.tags.join(", "));
                }
                if !bookmark.image_url.is_empty() {
                    println!("Image:       {}", bookmark.image_url);
                }
            }
            OutputFormat::Json => print_json(bookmark),
            OutputFormat::Quiet => {
                println!("{}", bookmark.id);
            }
        }
    }

    /// Print a list of bookmarks
    pub fn print_bookmarks(&self, bookmarks: &[&Bookmark]) {
        match self.format {
            OutputFormat::Human => {
                if bookmarks.is_empty() {
                    println!("No bookmarks found.");
                    return;
                }
                for bookmark in bookmarks {
                    let tags = if bookmark.tags.is_empty() {
                        String::new()
                    } else {
                        format!(" [{}]", bookmark.tags.join(", "))
                    };
                    println!(
                        "{} | {}{} | {} | {}",
                        bookmark.id,
                        truncate(&bookmark.title, 35),
                        tags,
                        bookmark.category_id,
                        truncate(&bookmark.url, 45)
                    );
                }
                println!("\n{} bookmark(s)", bookmarks.len());
            }
            OutputFormat::Json => print_json(&bookmarks),
            OutputFormat::Quiet => {
                for bookmark in bookmarks {
                    println!("{}", bookmark.id);
                }
            }
        }
    }

    /// Print categories with their bookmark counts and visibility
    pub fn print_categories(&self, categories: &[(Category, usize, bool)]) {
        match self.format {
            OutputFormat::Human => {
                if categories.is_empty() {
                    println!("No categories found.");
                    return;
                }
                for (category, count, hidden) in categories {
                    let marker = if *hidden { " (hidden)" } else { "" };
                    println!("{} | {} ({}){}", category.id, category.name, count, marker);
                }
                println!("\n{} categories", categories.len());
            }
            OutputFormat::Json => {
                let json: Vec<_> = categories
                    .iter()
                    .map(|(category, count, hidden)| {
                        serde_json::json!({
                            "id": category.id,
                            "name": category.name,
                            "bookmarks": count,
                            "hidden": hidden
                        })
                    })
                    .collect();
                print_json(&json);
            }
            OutputFormat::Quiet => {
                for (category, _, _) in categories {
                    println!("{}", category.id);
                }
            }
        }
    }

    /// Print a list of tags
    pub fn print_tags(&self, tags: &[(String, usize)]) {
        match self.format {
            OutputFormat::Human => {
                if tags.is_empty() {
                    println!("No tags found.");
                    return;
                }
                for (name, count) in tags {
                    println!("{} ({})", name, count);
                }
                println!("\n{} tag(s)", tags.len());
            }
            OutputFormat::Json => {
                let json_tags: Vec<_> = tags
                    .iter()
                    .map(|(name, count)| serde_json::json!({"name": name, "count": count}))
                    .collect();
                print_json(&json_tags);
            }
            OutputFormat::Quiet => {
                for (name, _) in tags {
                    println!("{}", name);
                }
            }
        }
    }

    /// Print the result of an import
    pub fn print_import_outcome(&self, outcome: &ImportOutcome) {
        match self.format {
            OutputFormat::Human => {
                println!("✓ {}", outcome);
                if outcome.skipped > 0 {
                    println!("  Skipped {} already saved", outcome.skipped);
                }
                for category in &outcome.new_categories {
                    println!("  + {} ({})", category.name, category.id);
                }
                if let Some(ref error) = outcome.category_error {
                    eprintln!("⚠ New categories were not saved: {}", error);
                }
            }
            OutputFormat::Json => print_json(outcome),
            OutputFormat::Quiet => {
                println!("{}", outcome.added);
            }
        }
    }

    /// Print display settings and theme
    pub fn print_settings(&self, settings: &DisplaySettings, theme: Theme) {
        match self.format {
            OutputFormat::Human => {
                println!("Display settings:");
                println!("  card_size:       {}", settings.card_size);
                println!("  category_layout: {}", settings.category_layout);
                println!("  theme:           {}", theme);
            }
            OutputFormat::Json => {
                print_json(&serde_json::json!({
                    "cardSize": settings.card_size,
                    "categoryLayout": settings.category_layout,
                    "theme": theme
                }));
            }
            OutputFormat::Quiet => {
                println!("{} {} {}", settings.card_size, settings.category_layout, theme);
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to format output as JSON: {}", e),
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
