//! Bookmark command handlers

use anyhow::{bail, Context, Result};

use bingemark_core::{Bookmark, BookmarkStore};

use crate::metadata::fetch_metadata;
use crate::output::Output;
use crate::prompt::{confirm, parse_tag_list, prompt_with_default};

/// Fields given on the command line when adding a bookmark
pub struct NewBookmark {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub fetch: bool,
}

/// Add a new bookmark
pub async fn add(store: &mut BookmarkStore, new: NewBookmark, output: &Output) -> Result<()> {
    let category = match new.category {
        Some(ref id) => require_category(store, id)?.to_string(),
        None => bingemark_core::models::DEFAULT_CATEGORY_ID.to_string(),
    };

    let metadata = if new.fetch && (new.title.is_none() || new.description.is_none()) {
        fetch_metadata(&new.url).await
    } else {
        Default::default()
    };

    let title = new
        .title
        .or(metadata.title)
        .unwrap_or_else(|| new.url.clone());
    let mut bookmark = Bookmark::new(title, &new.url);

    if let Some(desc) = new.description.or(metadata.description) {
        bookmark.set_description(desc);
    }
    if let Some(image) = metadata.image_url {
        bookmark.image_url = image;
    }
    bookmark.set_tags(new.tags);
    bookmark.set_category(category);

    let bookmark = store
        .add_bookmark(bookmark)
        .await
        .context("Failed to save bookmark")?;

    output.success(&format!("Added bookmark: {}", bookmark.id));
    output.print_bookmark(&bookmark, store.get_category(&bookmark.category_id));

    Ok(())
}

/// Filters for listing bookmarks
pub struct ListFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub include_hidden: bool,
}

/// List bookmarks matching the filter
pub fn list(store: &mut BookmarkStore, filter: ListFilter, output: &Output) -> Result<()> {
    if let Some(search) = filter.search {
        store.set_search_term(search);
    }
    if let Some(category) = filter.category {
        store.set_selected_category(category);
    }
    store.set_selected_tags(filter.tags);

    let hidden = store.hidden_categories();
    let bookmarks: Vec<&Bookmark> = store
        .filtered_bookmarks()
        .into_iter()
        .filter(|b| filter.include_hidden || !hidden.contains(&b.category_id))
        .collect();

    output.print_bookmarks(&bookmarks);
    Ok(())
}

/// Show a single bookmark
pub fn show(store: &BookmarkStore, id: String, output: &Output) -> Result<()> {
    let id = resolve_bookmark_id(store, &id)?;
    let bookmark = store
        .get_bookmark(&id)
        .ok_or_else(|| anyhow::anyhow!("Bookmark not found: {}", id))?;

    output.print_bookmark(bookmark, store.get_category(&bookmark.category_id));
    Ok(())
}

/// Field changes for an edit
#[derive(Default)]
pub struct BookmarkChanges {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub tags: Option<String>,
    pub category: Option<String>,
}

impl BookmarkChanges {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.url.is_none()
            && self.description.is_none()
            && self.image_url.is_none()
            && self.tags.is_none()
            && self.category.is_none()
    }

    /// Apply to `bookmark`. Tags replace the whole list.
    fn apply(self, bookmark: &mut Bookmark) {
        if let Some(title) = self.title {
            bookmark.title = title;
        }
        if let Some(url) = self.url {
            bookmark.url = url;
        }
        if let Some(description) = self.description {
            bookmark.set_description(description);
        }
        if let Some(image_url) = self.image_url {
            bookmark.image_url = image_url;
        }
        if let Some(tags) = self.tags {
            bookmark.set_tags(parse_tag_list(&tags));
        }
        if let Some(category) = self.category {
            bookmark.set_category(category);
        }
    }
}

/// Edit a bookmark, prompting for each field when no changes are given
pub async fn edit(
    store: &mut BookmarkStore,
    id: String,
    changes: BookmarkChanges,
    output: &Output,
) -> Result<()> {
    let id = resolve_bookmark_id(store, &id)?;
    let mut bookmark = store
        .get_bookmark(&id)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Bookmark not found: {}", id))?;

    let changes = if changes.is_empty() && output.should_prompt() {
        prompt_changes(&bookmark)?
    } else {
        changes
    };

    if let Some(ref category) = changes.category {
        require_category(store, category)?;
    }
    changes.apply(&mut bookmark);

    store
        .update_bookmark(bookmark.clone())
        .await
        .context("Failed to update bookmark")?;

    output.success("Bookmark updated");
    output.print_bookmark(&bookmark, store.get_category(&bookmark.category_id));

    Ok(())
}

fn prompt_changes(bookmark: &Bookmark) -> Result<BookmarkChanges> {
    println!("Editing bookmark: {}", bookmark.id);
    println!("Press Enter to keep current value, or type new value.\n");

    Ok(BookmarkChanges {
        title: prompt_with_default("Title", &bookmark.title)?,
        url: prompt_with_default("URL", &bookmark.url)?,
        description: prompt_with_default("Description", &bookmark.description)?,
        image_url: prompt_with_default("Image URL", &bookmark.image_url)?,
        tags: prompt_with_default("Tags (comma-separated)", &bookmark.tags.join(", "))?,
        category: prompt_with_default("Category", &bookmark.category_id)?,
    })
}

/// Delete a bookmark
pub async fn delete(store: &mut BookmarkStore, id: String, output: &Output) -> Result<()> {
    let id = resolve_bookmark_id(store, &id)?;

    // Confirm deletion
    if output.should_prompt() {
        if let Some(bookmark) = store.get_bookmark(&id) {
            println!("Delete bookmark: {} - {}", bookmark.id, bookmark.title);
        }
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store
        .delete_bookmark(&id)
        .await
        .context("Failed to delete bookmark")?;

    output.success(&format!("Deleted bookmark: {}", id));

    Ok(())
}

/// Move a bookmark to a category, optionally at a position in the overall order
pub async fn move_to(
    store: &mut BookmarkStore,
    id: String,
    category: String,
    position: Option<usize>,
    output: &Output,
) -> Result<()> {
    let id = resolve_bookmark_id(store, &id)?;
    require_category(store, &category)?;

    store
        .move_bookmark(&id, &category, position.unwrap_or(usize::MAX))
        .await
        .context("Failed to move bookmark")?;

    output.success(&format!("Moved bookmark {} to {}", id, category));
    Ok(())
}

fn require_category<'a>(store: &BookmarkStore, id: &'a str) -> Result<&'a str> {
    if store.get_category(id).is_none() {
        bail!("Unknown category: '{}'. See `bingemark category list`.", id);
    }
    Ok(id)
}

/// Resolve a bookmark id (full id or unique prefix)
pub(crate) fn resolve_bookmark_id(store: &BookmarkStore, id: &str) -> Result<String> {
    if store.get_bookmark(id).is_some() {
        return Ok(id.to_string());
    }

    let matches: Vec<_> = store
        .bookmarks()
        .iter()
        .filter(|b| b.id.starts_with(id))
        .collect();

    match matches.len() {
        0 => bail!("No bookmark found matching: {}", id),
        1 => Ok(matches[0].id.clone()),
        _ => {
            eprintln!("Multiple bookmarks match '{}':", id);
            for bookmark in &matches {
                eprintln!("  {} - {}", bookmark.id, bookmark.title);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}
