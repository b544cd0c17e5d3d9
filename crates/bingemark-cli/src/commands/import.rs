//! Import command handlers

use std::path::PathBuf;

use anyhow::{Context, Result};

use bingemark_core::{BookmarkStore, ImportPolicy};

use crate::output::Output;

/// Import an exported JSON file
pub async fn json(
    store: &mut BookmarkStore,
    path: PathBuf,
    policy: ImportPolicy,
    output: &Output,
) -> Result<()> {
    let text = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read import file: {:?}", path))?;

    let outcome = store
        .import_json(&text, policy)
        .await
        .context("Import failed")?;

    output.print_import_outcome(&outcome);
    Ok(())
}

/// Import the browser's own bookmarks
pub async fn native(store: &mut BookmarkStore, policy: ImportPolicy, output: &Output) -> Result<()> {
    let outcome = store
        .import_native(policy)
        .await
        .context("Import from browser failed")?;

    output.print_import_outcome(&outcome);
    Ok(())
}
