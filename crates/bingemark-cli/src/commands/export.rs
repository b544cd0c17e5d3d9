//! Export command handler

use std::path::PathBuf;

use anyhow::{Context, Result};

use bingemark_core::BookmarkStore;

use crate::output::Output;

/// Write bookmarks and categories as JSON to a file, or stdout
pub fn export(store: &BookmarkStore, path: Option<PathBuf>, output: &Output) -> Result<()> {
    let json = store
        .export_json()
        .context("Failed to serialize bookmarks")?;

    match path {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("Failed to write export file: {:?}", path))?;
            output.success(&format!(
                "Exported {} bookmarks and {} categories to {}",
                store.bookmarks().len(),
                store.categories().len(),
                path.display()
            ));
        }
        None => println!("{}", json),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use bingemark_core::storage::MemoryAdapter;
    use bingemark_core::{Bookmark, ExportDocument};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_export_to_file() {
        let mut store =
            BookmarkStore::open(Arc::new(MemoryAdapter::new()), None, Duration::from_secs(1))
                .await
                .unwrap();
        store
            .add_bookmark(Bookmark::new("Docs", "https://docs.rs/"))
            .await
            .unwrap();

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bookmarks.json");
        export(&store, Some(path.clone()), &Output::new(OutputFormat::Quiet)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let document: ExportDocument = serde_json::from_str(&content).unwrap();
        assert_eq!(document.bookmarks.len(), 1);
        assert_eq!(document.categories.len(), 3);
    }
}
