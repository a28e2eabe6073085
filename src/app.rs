//! Application state management for vecdash.
//!
//! This module contains the core `App` struct that manages all application
//! state: the active tab, each sheet's view state, the cache coordinator,
//! and background refresh coordination.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::api::SheetClient;
use crate::cache::{CacheCoordinator, DataSource, FileStore, Origin};
use crate::config::Config;
use crate::models::Dataset;

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
/// A handful of sheets with one in-flight refresh each; 16 is plenty.
const CHANNEL_BUFFER_SIZE: usize = 16;

/// Number of rows to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

// ============================================================================
// UI State Types
// ============================================================================

/// Main navigation tabs, one per sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Events,
    Courses,
    Winners,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Events, Tab::Courses, Tab::Winners];

    /// Get the display title for this tab.
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Events => "Events",
            Tab::Courses => "Courses",
            Tab::Winners => "Winners",
        }
    }

    /// The remote sheet backing this tab. Currently matches the title, but
    /// sheet names are data, not labels, so keep them separate.
    pub fn sheet(&self) -> &'static str {
        match self {
            Tab::Events => "Events",
            Tab::Courses => "Courses",
            Tab::Winners => "Winners",
        }
    }

    /// Get the next tab (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            Tab::Events => Tab::Courses,
            Tab::Courses => Tab::Winners,
            Tab::Winners => Tab::Events,
        }
    }

    /// Get the previous tab (wrapping around)
    pub fn prev(&self) -> Self {
        match self {
            Tab::Events => Tab::Winners,
            Tab::Courses => Tab::Events,
            Tab::Winners => Tab::Courses,
        }
    }
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    Quitting,
}

/// What a tab currently has to show.
///
/// `Unavailable` is distinct from `Ready` with zero rows: an empty sheet is
/// a valid, renderable state; unavailable means the fetch failed and nothing
/// usable was cached.
#[derive(Debug, Clone, PartialEq)]
pub enum SheetView {
    Loading,
    Ready(Dataset),
    Unavailable,
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent back from spawned fetch tasks over the MPSC channel and
/// drained by the main loop each frame.
enum RefreshResult {
    /// An unconditional fetch of a sheet succeeded (refresh or prefetch).
    Sheet(String, Dataset),
    /// A background fetch failed; whatever is displayed stays displayed.
    FetchFailed(String, String),
}

// ============================================================================
// Main Application Struct
// ============================================================================

/// Main application state container
pub struct App {
    // Core services
    pub cache: CacheCoordinator,

    // UI State
    pub state: AppState,
    pub current_tab: Tab,
    /// Per-sheet view state, keyed by sheet name. Absent = never requested.
    views: HashMap<String, SheetView>,
    /// Per-sheet list scroll offsets (render clamps them).
    pub scroll: HashMap<String, usize>,

    // Background task channel
    refresh_rx: mpsc::Receiver<RefreshResult>,
    refresh_tx: mpsc::Sender<RefreshResult>,

    // Status message
    pub status_message: Option<String>,
}

impl App {
    /// Create a new application instance
    pub fn new() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };

        let cache_dir = config.cache_dir()?;
        debug!(?cache_dir, "Cache directory configured");

        let store = FileStore::new(cache_dir)?;
        let client = SheetClient::new(config.script_url())?;
        let cache = CacheCoordinator::new(Box::new(store), Arc::new(client));

        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        Ok(Self {
            cache,
            state: AppState::Normal,
            current_tab: Tab::Events,
            views: HashMap::new(),
            scroll: HashMap::new(),
            refresh_rx: rx,
            refresh_tx: tx,
            status_message: None,
        })
    }

    /// The view state for the active tab.
    pub fn current_view(&self) -> &SheetView {
        self.views
            .get(self.current_tab.sheet())
            .unwrap_or(&SheetView::Loading)
    }

    /// Scroll offset for the active tab.
    pub fn current_scroll(&self) -> usize {
        self.scroll
            .get(self.current_tab.sheet())
            .copied()
            .unwrap_or(0)
    }

    pub fn scroll_by(&mut self, delta: isize) {
        // Rough upper bound: cards render one line per field plus a separator
        let max = match self.current_view() {
            SheetView::Ready(records) => records
                .iter()
                .map(|record| record.fields().len() + 1)
                .sum::<usize>()
                .saturating_sub(1),
            _ => 0,
        };
        let entry = self
            .scroll
            .entry(self.current_tab.sheet().to_string())
            .or_insert(0);
        *entry = entry.saturating_add_signed(delta).min(max);
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll
            .insert(self.current_tab.sheet().to_string(), 0);
    }

    // =========================================================================
    // Sheet Loading
    // =========================================================================

    /// Switch tabs and make sure the target sheet has data or is on its way.
    pub async fn select_tab(&mut self, tab: Tab) {
        self.current_tab = tab;
        self.ensure_loaded(tab.sheet()).await;
    }

    /// Resolve a sheet through the cache unless it is already on screen.
    ///
    /// A cache-served resolve spawns a background revalidation so edits to
    /// the sheet still show up without the user doing anything; a failed
    /// resolve marks the tab unavailable and is retried on the next visit.
    pub async fn ensure_loaded(&mut self, sheet: &str) {
        if matches!(self.views.get(sheet), Some(SheetView::Ready(_))) {
            return;
        }

        self.views.insert(sheet.to_string(), SheetView::Loading);

        match self.cache.resolve(sheet).await {
            Ok(resolved) => {
                let from_cache = resolved.origin != Origin::Network;
                self.views
                    .insert(sheet.to_string(), SheetView::Ready(resolved.records));
                if from_cache {
                    self.spawn_fetch(sheet);
                }
            }
            Err(e) => {
                warn!(sheet, error = %e, "Sheet unavailable");
                self.views.insert(sheet.to_string(), SheetView::Unavailable);
                self.status_message = Some(format!("Failed to load {}", sheet));
            }
        }
    }

    /// Warm the cache for sheets the user has not opened yet. Fire and
    /// forget: results land in `check_background_tasks`, errors are logged
    /// and swallowed.
    pub fn prefetch_missing(&mut self) {
        for tab in Tab::ALL {
            let sheet = tab.sheet();
            if !self.views.contains_key(sheet) && self.cache.cached(sheet).is_none() {
                debug!(sheet, "Prefetching");
                self.spawn_fetch(sheet);
            }
        }
    }

    /// Force a refresh of the active tab's sheet.
    pub fn refresh_current(&mut self) {
        let sheet = self.current_tab.sheet();
        self.spawn_fetch(sheet);
        self.status_message = Some(format!("Refreshing {}...", sheet));
    }

    /// Spawn an unconditional fetch of a sheet. Multiple in-flight fetches
    /// for the same sheet are fine: results are applied serially on the main
    /// loop and reapplying identical data is a no-op.
    fn spawn_fetch(&self, sheet: &str) {
        let source: Arc<dyn DataSource> = self.cache.source();
        let tx = self.refresh_tx.clone();
        let sheet = sheet.to_string();

        tokio::spawn(async move {
            let result = match source.fetch_sheet(&sheet).await {
                Ok(records) => RefreshResult::Sheet(sheet, records),
                Err(e) => RefreshResult::FetchFailed(sheet, e.to_string()),
            };
            if tx.send(result).await.is_err() {
                debug!("Refresh channel closed, dropping fetch result");
            }
        });
    }

    // =========================================================================
    // Background Task Results
    // =========================================================================

    /// Drain completed background fetches and fold them into the cache and
    /// the affected views. Called once per frame by the run loop.
    pub fn check_background_tasks(&mut self) {
        let mut results = Vec::new();
        while let Ok(result) = self.refresh_rx.try_recv() {
            results.push(result);
        }
        for result in results {
            self.process_refresh_result(result);
        }
    }

    fn process_refresh_result(&mut self, result: RefreshResult) {
        match result {
            RefreshResult::Sheet(sheet, records) => {
                let changed = self.cache.apply_refresh(&sheet, records.clone());
                info!(sheet = %sheet, changed, rows = records.len(), "Background fetch applied");

                // Re-render only when the content changed, or when the tab
                // was still loading/unavailable and this fetch rescued it.
                let needs_update = changed
                    || !matches!(self.views.get(&sheet), Some(SheetView::Ready(_)) | None);
                if needs_update && self.views.contains_key(&sheet) {
                    self.views.insert(sheet.clone(), SheetView::Ready(records));
                }
                if self
                    .status_message
                    .as_deref()
                    .is_some_and(|msg| msg.contains(&sheet))
                {
                    self.status_message = None;
                }
            }
            RefreshResult::FetchFailed(sheet, error) => {
                // Never clobber displayed data over a failed refresh
                debug!(sheet = %sheet, error = %error, "Background fetch failed");
                if self
                    .status_message
                    .as_deref()
                    .is_some_and(|msg| msg.contains(&sheet))
                {
                    self.status_message = Some(format!("Failed to refresh {}", sheet));
                }
                if matches!(self.views.get(&sheet), Some(SheetView::Loading)) {
                    self.views.insert(sheet, SheetView::Unavailable);
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use async_trait::async_trait;

    use super::*;
    use crate::cache::BlobStore;
    use crate::models::Record;

    struct NullStore;

    impl BlobStore for NullStore {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }
        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Ok(())
        }
    }

    struct NullSource;

    #[async_trait]
    impl DataSource for NullSource {
        async fn fetch_sheet(&self, _sheet: &str) -> Result<Dataset> {
            anyhow::bail!("endpoint down")
        }
    }

    fn test_app() -> App {
        let cache = CacheCoordinator::new(Box::new(NullStore), Arc::new(NullSource));
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        App {
            cache,
            state: AppState::Normal,
            current_tab: Tab::Events,
            views: HashMap::new(),
            scroll: HashMap::new(),
            refresh_rx: rx,
            refresh_tx: tx,
            status_message: None,
        }
    }

    fn rows(json: &str) -> Dataset {
        serde_json::from_str::<Vec<Record>>(json).unwrap()
    }

    fn sample() -> Dataset {
        rows(r#"[{"Event": "Chess", "Date": "2024-01-05"}]"#)
    }

    #[test]
    fn test_tab_cycle_wraps_both_ways() {
        assert_eq!(Tab::Events.next(), Tab::Courses);
        assert_eq!(Tab::Courses.next(), Tab::Winners);
        assert_eq!(Tab::Winners.next(), Tab::Events);

        assert_eq!(Tab::Events.prev(), Tab::Winners);
        assert_eq!(Tab::Winners.prev(), Tab::Courses);
        assert_eq!(Tab::Courses.prev(), Tab::Events);
    }

    #[test]
    fn test_unchanged_refresh_keeps_view_and_clears_status() {
        let mut app = test_app();
        app.cache.apply_refresh("Events", sample());
        app.views
            .insert("Events".to_string(), SheetView::Ready(sample()));
        app.status_message = Some("Refreshing Events...".to_string());

        app.process_refresh_result(RefreshResult::Sheet("Events".to_string(), sample()));

        assert_eq!(app.views.get("Events"), Some(&SheetView::Ready(sample())));
        assert!(app.status_message.is_none());
    }

    #[test]
    fn test_changed_refresh_updates_view_and_cache() {
        let mut app = test_app();
        app.cache.apply_refresh("Events", sample());
        app.views
            .insert("Events".to_string(), SheetView::Ready(sample()));

        let updated = rows(r#"[{"Event": "Quiz", "Date": "2024-02-11"}]"#);
        app.process_refresh_result(RefreshResult::Sheet("Events".to_string(), updated.clone()));

        assert_eq!(app.views.get("Events"), Some(&SheetView::Ready(updated.clone())));
        assert_eq!(app.cache.cached("Events"), Some(&updated));
    }

    #[test]
    fn test_refresh_rescues_unavailable_view() {
        let mut app = test_app();
        app.views
            .insert("Events".to_string(), SheetView::Unavailable);

        app.process_refresh_result(RefreshResult::Sheet("Events".to_string(), sample()));

        assert_eq!(app.views.get("Events"), Some(&SheetView::Ready(sample())));
    }

    #[test]
    fn test_failed_refresh_preserves_displayed_data() {
        let mut app = test_app();
        app.cache.apply_refresh("Events", sample());
        app.views
            .insert("Events".to_string(), SheetView::Ready(sample()));

        app.process_refresh_result(RefreshResult::FetchFailed(
            "Events".to_string(),
            "endpoint down".to_string(),
        ));

        // The stale data stays on screen and in the cache
        assert_eq!(app.views.get("Events"), Some(&SheetView::Ready(sample())));
        assert_eq!(app.cache.cached("Events"), Some(&sample()));
    }

    #[test]
    fn test_failed_refresh_marks_loading_view_unavailable() {
        let mut app = test_app();
        app.views.insert("Events".to_string(), SheetView::Loading);

        app.process_refresh_result(RefreshResult::FetchFailed(
            "Events".to_string(),
            "endpoint down".to_string(),
        ));

        assert_eq!(app.views.get("Events"), Some(&SheetView::Unavailable));
    }

    #[test]
    fn test_failed_refresh_replaces_refreshing_status() {
        let mut app = test_app();
        app.views
            .insert("Events".to_string(), SheetView::Ready(sample()));
        app.status_message = Some("Refreshing Events...".to_string());

        app.process_refresh_result(RefreshResult::FetchFailed(
            "Events".to_string(),
            "endpoint down".to_string(),
        ));

        // The status bar must not claim a refresh is still in progress
        assert_eq!(
            app.status_message.as_deref(),
            Some("Failed to refresh Events")
        );
    }

    #[test]
    fn test_other_sheets_status_is_left_alone_on_failure() {
        let mut app = test_app();
        app.status_message = Some("Refreshing Courses...".to_string());

        app.process_refresh_result(RefreshResult::FetchFailed(
            "Events".to_string(),
            "endpoint down".to_string(),
        ));

        assert_eq!(app.status_message.as_deref(), Some("Refreshing Courses..."));
    }
}
