//! Category command handlers

use anyhow::{bail, Context, Result};

use bingemark_core::{BookmarkStore, Category};

use crate::output::Output;
use crate::prompt::confirm;

/// List categories with bookmark counts
pub fn list(store: &BookmarkStore, output: &Output) -> Result<()> {
    let rows: Vec<(Category, usize, bool)> = store
        .categories()
        .iter()
        .map(|category| {
            let count = store
                .bookmarks()
                .iter()
                .filter(|b| b.category_id == category.id)
                .count();
            let hidden = store.hidden_categories().contains(&category.id);
            (category.clone(), count, hidden)
        })
        .collect();

    output.print_categories(&rows);
    Ok(())
}

/// Create a category
pub async fn add(store: &mut BookmarkStore, name: String, output: &Output) -> Result<()> {
    let category = store
        .add_category(&name)
        .await
        .context("Failed to add category")?;

    output.success(&format!("Added category: {} ({})", category.name, category.id));
    Ok(())
}

/// Delete a category, moving its bookmarks to the default category
pub async fn delete(store: &mut BookmarkStore, id: String, output: &Output) -> Result<()> {
    let affected = store
        .bookmarks()
        .iter()
        .filter(|b| b.category_id == id)
        .count();

    if output.should_prompt() && affected > 0 {
        println!(
            "{} bookmark(s) in '{}' will move to the default category.",
            affected, id
        );
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store
        .delete_category(&id)
        .await
        .context("Failed to delete category")?;

    output.success(&format!("Deleted category: {}", id));
    Ok(())
}

/// Hide or show a category
pub async fn set_hidden(
    store: &mut BookmarkStore,
    id: String,
    hide: bool,
    output: &Output,
) -> Result<()> {
    if store.get_category(&id).is_none() {
        bail!("Unknown category: '{}'", id);
    }

    let hidden = store.hidden_categories().contains(&id);
    if hidden != hide {
        store
            .toggle_category_visibility(&id)
            .await
            .context("Failed to update hidden categories")?;
    }

    let state = if hide { "hidden" } else { "visible" };
    output.success(&format!("Category {} is {}", id, state));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use bingemark_core::storage::MemoryAdapter;
    use std::sync::Arc;
    use std::time::Duration;

    async fn open_store() -> BookmarkStore {
        BookmarkStore::open(Arc::new(MemoryAdapter::new()), None, Duration::from_secs(1))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_hide_and_show_are_idempotent() {
        let mut store = open_store().await;
        let output = Output::new(OutputFormat::Quiet);

        set_hidden(&mut store, "work".to_string(), true, &output).await.unwrap();
        set_hidden(&mut store, "work".to_string(), true, &output).await.unwrap();
        assert_eq!(store.hidden_categories(), ["work".to_string()]);

        set_hidden(&mut store, "work".to_string(), false, &output).await.unwrap();
        assert!(store.hidden_categories().is_empty());

        assert!(set_hidden(&mut store, "nope".to_string(), true, &output).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_default_fails() {
        let mut store = open_store().await;
        let output = Output::new(OutputFormat::Quiet);
        assert!(delete(&mut store, "default".to_string(), &output).await.is_err());
        assert_eq!(store.categories().len(), 3);
    }
}
