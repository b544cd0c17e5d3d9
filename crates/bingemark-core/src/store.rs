//! Bookmark/category state store
//!
//! `BookmarkStore` owns every persisted collection for a session and routes
//! each mutation through the storage adapter.
//!
//! ## Write-then-apply
//!
//! A mutation first writes the new value to the adapter. Only when the
//! write succeeds is the in-memory copy replaced and a `StoreEvent`
//! broadcast. A failed write returns `StoreError::Save` and leaves the
//! in-memory state as it was.
//!
//! Mutations are not queued. Two writers racing on the same key resolve as
//! last write wins at the adapter.
//!
//! ## Usage
//!
//! ```ignore
//! let adapter = Arc::new(MemoryAdapter::new());
//! let mut store = BookmarkStore::open(adapter, None, Duration::from_secs(5)).await?;
//!
//! store.add_bookmark(Bookmark::new("Rust", "https://www.rust-lang.org/")).await?;
//! store.set_search_term("rust");
//! let visible = store.filtered_bookmarks();
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::bridge::{self, LocalBridge, MessageBridge};
use crate::config::Config;
use crate::error::{ImportError, StoreError};
use crate::id::generate_id;
use crate::import::{
    assign_missing_ids, bookmarks_from_native, merge_bookmarks, missing_categories, ExportDocument,
    ImportOutcome, ImportPayload, ImportPolicy,
};
use crate::models::{
    default_category, favicon_url, has_default_category, seed_categories, Bookmark, Category,
    DisplaySettings, Theme, DEFAULT_CATEGORY_ID,
};
use crate::native::BookmarkFile;
use crate::query::{self, BookmarkFilter};
use crate::storage::{
    get_with_timeout, keys, open_adapter, record_of, set_with_timeout, Record, StorageAdapter,
    StorageError,
};

/// Buffered events per subscriber before the oldest are dropped
const EVENT_CAPACITY: usize = 64;

/// Emitted after a mutation has been persisted and applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    BookmarksChanged,
    CategoriesChanged,
    DisplaySettingsChanged,
    HiddenCategoriesChanged,
    ThemeChanged(Theme),
}

/// Everything the store persists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreState {
    pub bookmarks: Vec<Bookmark>,
    pub categories: Vec<Category>,
    pub display_settings: DisplaySettings,
    pub hidden_categories: Vec<String>,
    pub theme: Theme,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            bookmarks: Vec::new(),
            categories: seed_categories(),
            display_settings: DisplaySettings::default(),
            hidden_categories: Vec::new(),
            theme: Theme::default(),
        }
    }
}

impl StoreState {
    /// Build state from a loaded record. Missing keys keep their defaults.
    ///
    /// A stored category list without the default category gets the seed
    /// entry put back at the front.
    pub fn from_record(mut record: Record) -> Result<Self, StoreError> {
        let mut state = Self::default();
        if let Some(bookmarks) = decode(&mut record, keys::BOOKMARKS)? {
            state.bookmarks = bookmarks;
        }
        if let Some(mut categories) = decode::<Vec<Category>>(&mut record, keys::CATEGORIES)? {
            if !has_default_category(&categories) {
                warn!("Stored categories lack the default category, restoring it");
                categories.insert(0, default_category());
            }
            state.categories = categories;
        }
        if let Some(settings) = decode(&mut record, keys::DISPLAY_SETTINGS)? {
            state.display_settings = settings;
        }
        if let Some(hidden) = decode(&mut record, keys::HIDDEN_CATEGORIES)? {
            state.hidden_categories = hidden;
        }
        if let Some(theme) = decode(&mut record, keys::THEME)? {
            state.theme = theme;
        }
        Ok(state)
    }
}

fn decode<T: DeserializeOwned>(record: &mut Record, key: &'static str) -> Result<Option<T>, StoreError> {
    match record.remove(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|source| StoreError::Decode { key, source }),
    }
}

fn normalise_tags(bookmark: &mut Bookmark) {
    let tags = std::mem::take(&mut bookmark.tags);
    bookmark.set_tags(tags);
}

/// Single source of truth for bookmarks, categories and display preferences
pub struct BookmarkStore {
    adapter: Arc<dyn StorageAdapter>,
    bridge: Option<Arc<dyn MessageBridge>>,
    timeout: Duration,
    state: StoreState,
    filter: BookmarkFilter,
    events: broadcast::Sender<StoreEvent>,
}

impl BookmarkStore {
    /// Open the store on `adapter`.
    ///
    /// When a bridge is given it is pinged first; a failed ping is logged
    /// and loading continues. Then every key is loaded in one `get`.
    pub async fn open(
        adapter: Arc<dyn StorageAdapter>,
        bridge: Option<Arc<dyn MessageBridge>>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        if let Some(bridge) = &bridge {
            match bridge::ping(bridge.as_ref()).await {
                Ok(message) => debug!(%message, "Background service responded"),
                Err(e) => warn!(error = %e, "Background service ping failed"),
            }
        }

        let record = get_with_timeout(adapter.as_ref(), &keys::ALL, timeout)
            .await
            .map_err(|e| {
                error!(storage = %adapter.describe(), error = %e, "Failed to load stored data");
                StoreError::Load(e)
            })?;
        let state = StoreState::from_record(record)?;

        info!(
            storage = %adapter.describe(),
            bookmarks = state.bookmarks.len(),
            categories = state.categories.len(),
            "Loaded stored data"
        );

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            adapter,
            bridge,
            timeout,
            state,
            filter: BookmarkFilter::default(),
            events,
        })
    }

    /// Open the store with the backend and native bookmark file from `config`
    pub async fn open_with_config(config: &Config) -> Result<Self, StoreError> {
        let adapter = open_adapter(config).map_err(StoreError::Load)?;
        let bridge: Arc<dyn MessageBridge> =
            Arc::new(LocalBridge::new(BookmarkFile::new(config.native_bookmarks_path())));
        Self::open(adapter, Some(bridge), config.storage_timeout()).await
    }

    /// Receive an event after every successful mutation
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Description of the storage backend
    pub fn storage_description(&self) -> String {
        self.adapter.describe()
    }

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.state.bookmarks
    }

    pub fn categories(&self) -> &[Category] {
        &self.state.categories
    }

    pub fn display_settings(&self) -> DisplaySettings {
        self.state.display_settings
    }

    pub fn hidden_categories(&self) -> &[String] {
        &self.state.hidden_categories
    }

    pub fn theme(&self) -> Theme {
        self.state.theme
    }

    /// Look up a bookmark by id
    pub fn get_bookmark(&self, id: &str) -> Option<&Bookmark> {
        self.state.bookmarks.iter().find(|b| b.id == id)
    }

    /// Look up a category by id
    pub fn get_category(&self, id: &str) -> Option<&Category> {
        self.state.categories.iter().find(|c| c.id == id)
    }

    // ==================== Persistence ====================

    async fn persist<T: Serialize>(&self, key: &'static str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value).map_err(|e| StoreError::Save {
            key,
            source: StorageError::from(e),
        })?;

        set_with_timeout(self.adapter.as_ref(), record_of(key, value), self.timeout)
            .await
            .map_err(|source| {
                error!(
                    key,
                    error = %source,
                    recoverable = source.is_recoverable(),
                    hint = source.recovery_suggestion().unwrap_or_default(),
                    "Failed to save"
                );
                StoreError::Save { key, source }
            })
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Replace the bookmark collection
    pub async fn save_bookmarks(&mut self, bookmarks: Vec<Bookmark>) -> Result<(), StoreError> {
        self.persist(keys::BOOKMARKS, &bookmarks).await?;
        debug!(count = bookmarks.len(), "Saved bookmarks");
        self.state.bookmarks = bookmarks;
        self.emit(StoreEvent::BookmarksChanged);
        Ok(())
    }

    /// Replace the category collection. It must contain the default category.
    pub async fn save_categories(&mut self, categories: Vec<Category>) -> Result<(), StoreError> {
        if !has_default_category(&categories) {
            return Err(StoreError::MissingDefaultCategory);
        }
        self.persist(keys::CATEGORIES, &categories).await?;
        debug!(count = categories.len(), "Saved categories");
        self.state.categories = categories;
        self.emit(StoreEvent::CategoriesChanged);
        Ok(())
    }

    pub async fn save_display_settings(&mut self, settings: DisplaySettings) -> Result<(), StoreError> {
        self.persist(keys::DISPLAY_SETTINGS, &settings).await?;
        self.state.display_settings = settings;
        self.emit(StoreEvent::DisplaySettingsChanged);
        Ok(())
    }

    pub async fn save_hidden_categories(&mut self, hidden: Vec<String>) -> Result<(), StoreError> {
        self.persist(keys::HIDDEN_CATEGORIES, &hidden).await?;
        self.state.hidden_categories = hidden;
        self.emit(StoreEvent::HiddenCategoriesChanged);
        Ok(())
    }

    /// Flip between dark and light, returning the new theme
    pub async fn toggle_theme(&mut self) -> Result<Theme, StoreError> {
        let theme = self.state.theme.toggled();
        self.persist(keys::THEME, &theme).await?;
        self.state.theme = theme;
        self.emit(StoreEvent::ThemeChanged(theme));
        Ok(theme)
    }

    // ==================== Bookmark Operations ====================

    /// Append a bookmark, filling in a missing id, preview image or category
    pub async fn add_bookmark(&mut self, mut bookmark: Bookmark) -> Result<Bookmark, StoreError> {
        normalise_tags(&mut bookmark);
        if bookmark.id.trim().is_empty() {
            bookmark.id = generate_id();
        }
        if bookmark.image_url.is_empty() {
            bookmark.image_url = favicon_url(&bookmark.url);
        }
        if bookmark.category_id.is_empty() {
            bookmark.category_id = DEFAULT_CATEGORY_ID.to_string();
        }

        let mut bookmarks = self.state.bookmarks.clone();
        bookmarks.push(bookmark.clone());
        self.save_bookmarks(bookmarks).await?;
        Ok(bookmark)
    }

    /// Replace every field of the bookmark with the same id
    pub async fn update_bookmark(&mut self, mut bookmark: Bookmark) -> Result<(), StoreError> {
        normalise_tags(&mut bookmark);
        let pos = self.bookmark_position(&bookmark.id)?;
        let mut bookmarks = self.state.bookmarks.clone();
        bookmarks[pos] = bookmark;
        self.save_bookmarks(bookmarks).await
    }

    /// Remove a bookmark, returning it
    pub async fn delete_bookmark(&mut self, id: &str) -> Result<Bookmark, StoreError> {
        let pos = self.bookmark_position(id)?;
        let mut bookmarks = self.state.bookmarks.clone();
        let removed = bookmarks.remove(pos);
        self.save_bookmarks(bookmarks).await?;
        Ok(removed)
    }

    /// Move a bookmark into `category_id` at `position` in the overall ordering.
    ///
    /// The bookmark is taken out first, so `position` indexes the collection
    /// without it. Positions past the end append.
    pub async fn move_bookmark(
        &mut self,
        id: &str,
        category_id: &str,
        position: usize,
    ) -> Result<(), StoreError> {
        let pos = self.bookmark_position(id)?;
        let mut bookmarks = self.state.bookmarks.clone();
        let mut moved = bookmarks.remove(pos);
        moved.set_category(category_id);
        let position = position.min(bookmarks.len());
        bookmarks.insert(position, moved);
        self.save_bookmarks(bookmarks).await
    }

    fn bookmark_position(&self, id: &str) -> Result<usize, StoreError> {
        self.state
            .bookmarks
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| StoreError::BookmarkNotFound(id.to_string()))
    }

    // ==================== Category Operations ====================

    /// Create a category from a display name
    pub async fn add_category(&mut self, name: &str) -> Result<Category, StoreError> {
        let category = Category::from_name(name);
        if category.id.is_empty() {
            return Err(StoreError::EmptyCategoryName);
        }
        if self.get_category(&category.id).is_some() {
            return Err(StoreError::DuplicateCategory(category.id));
        }

        let mut categories = self.state.categories.clone();
        categories.push(category.clone());
        self.save_categories(categories).await?;
        Ok(category)
    }

    /// Delete a category. Its bookmarks move to the default category.
    ///
    /// Bookmarks are saved before categories, so a failure part way leaves
    /// no bookmark pointing at a missing category.
    pub async fn delete_category(&mut self, id: &str) -> Result<(), StoreError> {
        if id == DEFAULT_CATEGORY_ID {
            return Err(StoreError::ProtectedCategory);
        }
        if self.get_category(id).is_none() {
            return Err(StoreError::CategoryNotFound(id.to_string()));
        }

        let bookmarks: Vec<Bookmark> = self
            .state
            .bookmarks
            .iter()
            .cloned()
            .map(|mut b| {
                if b.category_id == id {
                    b.set_category(DEFAULT_CATEGORY_ID);
                }
                b
            })
            .collect();
        self.save_bookmarks(bookmarks).await?;

        let categories = self
            .state
            .categories
            .iter()
            .filter(|c| c.id != id)
            .cloned()
            .collect();
        self.save_categories(categories).await?;

        if self.state.hidden_categories.iter().any(|h| h == id) {
            let hidden = self
                .state
                .hidden_categories
                .iter()
                .filter(|h| *h != id)
                .cloned()
                .collect();
            self.save_hidden_categories(hidden).await?;
        }

        if self.filter.selected_category == id {
            self.filter.selected_category = query::ALL_CATEGORIES.to_string();
        }
        Ok(())
    }

    /// Hide a category, or show it again. Returns true when it is now hidden.
    pub async fn toggle_category_visibility(&mut self, id: &str) -> Result<bool, StoreError> {
        let mut hidden = self.state.hidden_categories.clone();
        let now_hidden = match hidden.iter().position(|h| h == id) {
            Some(pos) => {
                hidden.remove(pos);
                false
            }
            None => {
                hidden.push(id.to_string());
                true
            }
        };
        self.save_hidden_categories(hidden).await?;
        Ok(now_hidden)
    }

    /// Categories that are not hidden
    pub fn visible_categories(&self) -> Vec<&Category> {
        query::visible_categories(&self.state.categories, &self.state.hidden_categories)
    }

    // ==================== Filtering ====================

    pub fn filter(&self) -> &BookmarkFilter {
        &self.filter
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.filter.search_term = term.into();
    }

    pub fn set_selected_category(&mut self, category_id: impl Into<String>) {
        self.filter.selected_category = category_id.into();
    }

    pub fn set_selected_tags(&mut self, tags: Vec<String>) {
        self.filter.selected_tags = tags;
    }

    pub fn toggle_tag(&mut self, tag: &str) {
        self.filter.toggle_tag(tag);
    }

    /// Bookmarks matching the current filter, recomputed on every call
    pub fn filtered_bookmarks(&self) -> Vec<&Bookmark> {
        self.filter.apply(&self.state.bookmarks)
    }

    pub fn all_tags(&self) -> Vec<String> {
        query::all_tags(&self.state.bookmarks)
    }

    pub fn tags_with_counts(&self) -> Vec<(String, usize)> {
        query::tags_with_counts(&self.state.bookmarks)
    }

    // ==================== Import / Export ====================

    /// Import an exported JSON file.
    ///
    /// Nothing is written when the file does not parse. Categories referenced
    /// by the incoming bookmarks are created first; if that save fails the
    /// failure is reported in the outcome and the bookmark import proceeds.
    pub async fn import_json(
        &mut self,
        text: &str,
        policy: ImportPolicy,
    ) -> Result<ImportOutcome, ImportError> {
        let (mut incoming, incoming_categories) = ImportPayload::parse(text)?.into_parts();
        assign_missing_ids(&mut incoming);

        let mut new_categories =
            missing_categories(&self.state.categories, &incoming, incoming_categories.as_deref());
        let mut category_error = None;

        if !new_categories.is_empty() {
            let mut categories = self.state.categories.clone();
            categories.extend(new_categories.iter().cloned());
            match self.save_categories(categories).await {
                Ok(()) => info!(count = new_categories.len(), "Created categories for import"),
                Err(e) => {
                    warn!(error = %e, "Failed to save imported categories");
                    category_error = Some(e.to_string());
                    new_categories.clear();
                }
            }
        }

        let mut outcome = self.merge_and_save(incoming, policy).await?;
        outcome.new_categories = new_categories;
        outcome.category_error = category_error;
        Ok(outcome)
    }

    /// Import the browser's own bookmarks through the bridge
    pub async fn import_native(&mut self, policy: ImportPolicy) -> Result<ImportOutcome, ImportError> {
        let bridge = self.bridge.as_ref().ok_or(ImportError::NoBridge)?;
        let entries = bridge::fetch_native_bookmarks(bridge.as_ref()).await?;
        if entries.is_empty() {
            return Err(ImportError::NoNativeBookmarks);
        }

        let incoming = bookmarks_from_native(&entries);
        self.merge_and_save(incoming, policy).await
    }

    async fn merge_and_save(
        &mut self,
        incoming: Vec<Bookmark>,
        policy: ImportPolicy,
    ) -> Result<ImportOutcome, ImportError> {
        let merge = merge_bookmarks(&self.state.bookmarks, incoming, policy);
        let outcome = ImportOutcome {
            policy,
            added: merge.added,
            skipped: merge.skipped,
            total: merge.bookmarks.len(),
            new_categories: Vec::new(),
            category_error: None,
        };

        if outcome.is_noop() {
            info!(skipped = outcome.skipped, "No new bookmarks to import");
            return Ok(outcome);
        }

        self.save_bookmarks(merge.bookmarks).await?;
        info!(%policy, added = outcome.added, skipped = outcome.skipped, "Imported bookmarks");
        Ok(outcome)
    }

    /// Snapshot of bookmarks and categories for export
    pub fn export(&self) -> ExportDocument {
        ExportDocument {
            bookmarks: self.state.bookmarks.clone(),
            categories: self.state.categories.clone(),
        }
    }

    /// The export document as pretty-printed JSON
    pub fn export_json(&self) -> serde_json::Result<String> {
        self.export().to_json_pretty()
    }
}
