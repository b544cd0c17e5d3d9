//! Bingemark CLI
//!
//! Command-line interface for Bingemark - visual bookmark management.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use bingemark_core::{BookmarkStore, CardSize, CategoryLayout, Config, ImportPolicy};

mod commands;
mod metadata;
mod output;
mod prompt;

use commands::bookmark::{BookmarkChanges, ListFilter, NewBookmark};
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "bingemark")]
#[command(about = "Bingemark - Visual bookmark management")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage bookmarks
    Bookmark {
        #[command(subcommand)]
        command: BookmarkCommands,
    },
    /// Manage categories
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },
    /// List all tags
    Tags,
    /// Import bookmarks
    Import {
        #[command(subcommand)]
        command: ImportCommands,
    },
    /// Export bookmarks and categories as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show or change display settings
    Settings {
        #[command(subcommand)]
        command: Option<SettingsCommands>,
    },
    /// Show or toggle the color theme
    Theme {
        #[command(subcommand)]
        command: Option<ThemeCommands>,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Show status (storage, counts, display settings)
    Status,
}

#[derive(Subcommand)]
enum BookmarkCommands {
    /// Add a new bookmark
    #[command(alias = "create")]
    Add {
        /// URL to save
        url: String,
        /// Title (fetched from the page when omitted)
        #[arg(short = 'T', long)]
        title: Option<String>,
        /// Description (fetched from the page when omitted)
        #[arg(short, long)]
        description: Option<String>,
        /// Tags to add
        #[arg(short, long)]
        tag: Vec<String>,
        /// Category id
        #[arg(short, long)]
        category: Option<String>,
        /// Do not fetch page metadata
        #[arg(long)]
        no_fetch: bool,
    },
    /// List bookmarks
    #[command(alias = "ls")]
    List {
        /// Search title, description and tags
        #[arg(short, long)]
        search: Option<String>,
        /// Only this category
        #[arg(short, long)]
        category: Option<String>,
        /// Only bookmarks carrying every given tag
        #[arg(short, long)]
        tag: Vec<String>,
        /// Include bookmarks in hidden categories
        #[arg(long)]
        include_hidden: bool,
    },
    /// Show bookmark details
    Show {
        /// Bookmark ID (full or prefix)
        id: String,
    },
    /// Edit a bookmark (prompts when no fields are given)
    Edit {
        /// Bookmark ID (full or prefix)
        id: String,
        #[arg(short = 'T', long)]
        title: Option<String>,
        #[arg(short, long)]
        url: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        image: Option<String>,
        /// Comma-separated tags, replacing the current ones
        #[arg(short, long)]
        tags: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Delete a bookmark
    #[command(alias = "rm")]
    Delete {
        /// Bookmark ID (full or prefix)
        id: String,
    },
    /// Move a bookmark to a category
    #[command(alias = "mv")]
    Move {
        /// Bookmark ID (full or prefix)
        id: String,
        /// Destination category id
        category: String,
        /// Position in the overall order (end when omitted)
        #[arg(short, long)]
        position: Option<usize>,
    },
}

#[derive(Subcommand)]
enum CategoryCommands {
    /// List categories
    #[command(alias = "ls")]
    List,
    /// Create a category
    Add {
        /// Display name
        name: String,
    },
    /// Delete a category (its bookmarks move to the default category)
    #[command(alias = "rm")]
    Delete {
        /// Category id
        id: String,
    },
    /// Hide a category from listings
    Hide {
        /// Category id
        id: String,
    },
    /// Show a hidden category again
    Show {
        /// Category id
        id: String,
    },
}

#[derive(Subcommand)]
enum ImportCommands {
    /// Import a JSON file exported by Bingemark
    Json {
        /// File to import
        file: PathBuf,
        /// add: skip URLs already saved; replace: discard existing bookmarks
        #[arg(short, long, default_value = "add")]
        mode: ImportPolicy,
    },
    /// Import the browser's bookmarks
    Native {
        /// Browser bookmark file (defaults to the configured one)
        #[arg(long)]
        path: Option<PathBuf>,
        /// add: skip URLs already saved; replace: discard existing bookmarks
        #[arg(short, long, default_value = "add")]
        mode: ImportPolicy,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Show display settings
    Show,
    /// Set card size (small, medium, large, default)
    CardSize { size: CardSize },
    /// Set category layout (grid, flex, horizontal)
    Layout { layout: CategoryLayout },
}

#[derive(Subcommand)]
enum ThemeCommands {
    /// Show the current theme
    Show,
    /// Switch between dark and light
    Toggle,
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, storage_backend, storage_timeout_ms, native_bookmarks, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands don't need the store
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), config_path, &output);
    }

    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config, cli.verbose);

    if let Commands::Import {
        command: ImportCommands::Native {
            path: Some(ref path),
            ..
        },
    } = cli.command
    {
        config.native_bookmarks = Some(path.clone());
    }

    let mut store = BookmarkStore::open_with_config(&config)
        .await
        .context("Failed to open bookmark store")?;

    match cli.command {
        Commands::Bookmark { command } => handle_bookmark_command(command, &mut store, &output).await,
        Commands::Category { command } => handle_category_command(command, &mut store, &output).await,
        Commands::Tags => commands::tag::list(&store, &output),
        Commands::Import { command } => match command {
            ImportCommands::Json { file, mode } => {
                commands::import::json(&mut store, file, mode, &output).await
            }
            ImportCommands::Native { mode, .. } => {
                commands::import::native(&mut store, mode, &output).await
            }
        },
        Commands::Export { output: path } => commands::export::export(&store, path, &output),
        Commands::Settings { command } => match command {
            Some(SettingsCommands::Show) | None => commands::settings::show(&store, &output),
            Some(SettingsCommands::CardSize { size }) => {
                commands::settings::set_card_size(&mut store, size, &output).await
            }
            Some(SettingsCommands::Layout { layout }) => {
                commands::settings::set_layout(&mut store, layout, &output).await
            }
        },
        Commands::Theme { command } => match command {
            Some(ThemeCommands::Show) | None => commands::settings::show_theme(&store, &output),
            Some(ThemeCommands::Toggle) => commands::settings::toggle_theme(&mut store, &output).await,
        },
        Commands::Config { .. } => Ok(()), // Handled above
        Commands::Status => commands::status::show(&store, &config, &output),
    }
}

async fn handle_bookmark_command(
    command: BookmarkCommands,
    store: &mut BookmarkStore,
    output: &Output,
) -> Result<()> {
    match command {
        BookmarkCommands::Add {
            url,
            title,
            description,
            tag,
            category,
            no_fetch,
        } => {
            let new = NewBookmark {
                url,
                title,
                description,
                tags: tag,
                category,
                fetch: !no_fetch,
            };
            commands::bookmark::add(store, new, output).await
        }
        BookmarkCommands::List {
            search,
            category,
            tag,
            include_hidden,
        } => {
            let filter = ListFilter {
                search,
                category,
                tags: tag,
                include_hidden,
            };
            commands::bookmark::list(store, filter, output)
        }
        BookmarkCommands::Show { id } => commands::bookmark::show(store, id, output),
        BookmarkCommands::Edit {
            id,
            title,
            url,
            description,
            image,
            tags,
            category,
        } => {
            let changes = BookmarkChanges {
                title,
                url,
                description,
                image_url: image,
                tags,
                category,
            };
            commands::bookmark::edit(store, id, changes, output).await
        }
        BookmarkCommands::Delete { id } => commands::bookmark::delete(store, id, output).await,
        BookmarkCommands::Move {
            id,
            category,
            position,
        } => commands::bookmark::move_to(store, id, category, position, output).await,
    }
}

async fn handle_category_command(
    command: CategoryCommands,
    store: &mut BookmarkStore,
    output: &Output,
) -> Result<()> {
    match command {
        CategoryCommands::List => commands::category::list(store, output),
        CategoryCommands::Add { name } => commands::category::add(store, name, output).await,
        CategoryCommands::Delete { id } => commands::category::delete(store, id, output).await,
        CategoryCommands::Hide { id } => commands::category::set_hidden(store, id, true, output).await,
        CategoryCommands::Show { id } => commands::category::set_hidden(store, id, false, output).await,
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Install the tracing subscriber
///
/// `--verbose` logs at debug level; otherwise `RUST_LOG` decides, defaulting
/// to warnings. Logs go to `config.log_file` when set, stderr otherwise.
fn init_logging(config: &Config, verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::new("bingemark_core=debug,bingemark_cli=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("bingemark_core=warn,bingemark_cli=warn"))
    };

    match config.log_file {
        Some(ref log_path) => {
            let log_file = match File::create(log_path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
                    return;
                }
            };

            // Ignore error if already initialized
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(log_file)
                .try_init();

            info!("Logging to {:?}", log_path);
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}
