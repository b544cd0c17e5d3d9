//! Status command handler

use anyhow::Result;

use bingemark_core::{BookmarkStore, Config};

use crate::output::{Output, OutputFormat};

/// Show status information
pub fn show(store: &BookmarkStore, config: &Config, output: &Output) -> Result<()> {
    let settings = store.display_settings();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "storage": {
                        "backend": config.storage_backend.to_string(),
                        "location": store.storage_description(),
                        "timeout_ms": config.storage_timeout_ms
                    },
                    "counts": {
                        "bookmarks": store.bookmarks().len(),
                        "categories": store.categories().len(),
                        "hidden_categories": store.hidden_categories().len(),
                        "tags": store.all_tags().len()
                    },
                    "display": {
                        "cardSize": settings.card_size,
                        "categoryLayout": settings.category_layout,
                        "theme": store.theme()
                    }
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", store.bookmarks().len());
        }
        OutputFormat::Human => {
            println!("Bingemark Status");
            println!("================");
            println!();
            println!("Storage:");
            println!("  Backend:  {}", config.storage_backend);
            println!("  Location: {}", store.storage_description());
            println!();
            println!("Contents:");
            println!("  Bookmarks:  {}", store.bookmarks().len());
            println!(
                "  Categories: {} ({} hidden)",
                store.categories().len(),
                store.hidden_categories().len()
            );
            println!("  Tags:       {}", store.all_tags().len());
            println!();
            println!("Display:");
            println!("  Card size: {}", settings.card_size);
            println!("  Layout:    {}", settings.category_layout);
            println!("  Theme:     {}", store.theme());
        }
    }

    Ok(())
}
