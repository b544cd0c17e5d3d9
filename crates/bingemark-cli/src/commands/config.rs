//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use bingemark_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "storage_backend": config.storage_backend.to_string(),
                    "storage_timeout_ms": config.storage_timeout_ms,
                    "native_bookmarks": config.native_bookmarks_path(),
                    "log_file": config.log_file
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:           {}", config.data_dir.display());
            println!("  storage_backend:    {}", config.storage_backend);
            println!("  storage_timeout_ms: {}", config.storage_timeout_ms);
            println!(
                "  native_bookmarks:   {}{}",
                config.native_bookmarks_path().display(),
                if config.native_bookmarks.is_none() {
                    " (default)"
                } else {
                    ""
                }
            );
            println!(
                "  log_file:           {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => {
            config.data_dir = value.into();
        }
        "storage_backend" => {
            config.storage_backend = value.parse().map_err(anyhow::Error::msg)?;
        }
        "storage_timeout_ms" => {
            config.storage_timeout_ms = value
                .parse()
                .context("Invalid value for storage_timeout_ms. Use a number of milliseconds.")?;
        }
        "native_bookmarks" => {
            config.native_bookmarks = optional_path(value);
        }
        "log_file" => {
            config.log_file = optional_path(value);
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, storage_backend, storage_timeout_ms, native_bookmarks, log_file",
                key
            );
        }
    }
    Ok(())
}

fn optional_path(value: &str) -> Option<PathBuf> {
    if value.is_empty() || value == "none" {
        None
    } else {
        Some(value.into())
    }
}
