//! Display settings and theme command handlers

use anyhow::{Context, Result};

use bingemark_core::{BookmarkStore, CardSize, CategoryLayout, DisplaySettings};

use crate::output::Output;

/// Show display settings and theme
pub fn show(store: &BookmarkStore, output: &Output) -> Result<()> {
    output.print_settings(&store.display_settings(), store.theme());
    Ok(())
}

/// Set the bookmark card size
pub async fn set_card_size(store: &mut BookmarkStore, size: CardSize, output: &Output) -> Result<()> {
    let settings = DisplaySettings {
        card_size: size,
        ..store.display_settings()
    };
    store
        .save_display_settings(settings)
        .await
        .context("Failed to save display settings")?;

    output.success(&format!("Card size set to {}", size));
    Ok(())
}

/// Set the category layout
pub async fn set_layout(
    store: &mut BookmarkStore,
    layout: CategoryLayout,
    output: &Output,
) -> Result<()> {
    let settings = DisplaySettings {
        category_layout: layout,
        ..store.display_settings()
    };
    store
        .save_display_settings(settings)
        .await
        .context("Failed to save display settings")?;

    output.success(&format!("Category layout set to {}", layout));
    Ok(())
}

/// Show the current theme
pub fn show_theme(store: &BookmarkStore, output: &Output) -> Result<()> {
    match output.format {
        crate::output::OutputFormat::Json => {
            println!("{}", serde_json::json!({ "theme": store.theme() }));
        }
        _ => println!("{}", store.theme()),
    }
    Ok(())
}

/// Switch between dark and light
pub async fn toggle_theme(store: &mut BookmarkStore, output: &Output) -> Result<()> {
    let theme = store
        .toggle_theme()
        .await
        .context("Failed to save theme")?;

    output.success(&format!("Theme set to {}", theme));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use bingemark_core::storage::MemoryAdapter;
    use bingemark_core::Theme;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_settings_keep_other_field() {
        let mut store =
            BookmarkStore::open(Arc::new(MemoryAdapter::new()), None, Duration::from_secs(1))
                .await
                .unwrap();
        let output = Output::new(OutputFormat::Quiet);

        set_layout(&mut store, CategoryLayout::Flex, &output).await.unwrap();
        set_card_size(&mut store, CardSize::Small, &output).await.unwrap();

        assert_eq!(
            store.display_settings(),
            DisplaySettings {
                card_size: CardSize::Small,
                category_layout: CategoryLayout::Flex,
            }
        );

        toggle_theme(&mut store, &output).await.unwrap();
        assert_eq!(store.theme(), Theme::Light);
    }
}
