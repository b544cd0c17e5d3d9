//! Tag command handlers

use anyhow::Result;

use bingemark_core::BookmarkStore;

use crate::output::Output;

/// List all tags with usage counts
pub fn list(store: &BookmarkStore, output: &Output) -> Result<()> {
    let tags = store.tags_with_counts();
    output.print_tags(&tags);
    Ok(())
}
