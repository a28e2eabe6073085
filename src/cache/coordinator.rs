//! Stale-while-revalidate cache coordination between the UI, the persistent
//! blob store, and the remote sheet endpoint.
//!
//! Resolution order for a sheet: in-memory entry (no I/O at all), then a
//! persistent entry younger than the TTL (no network), then a network fetch
//! that populates both tiers. Background refreshes bypass the cache, and
//! their results are applied back here on the main loop - the coordinator
//! itself never runs on more than one task, so last-write-wins needs no
//! locking.
//!
//! The fetch source, blob store, and clock are all injected, so tests run
//! against fakes with a hand-cranked clock.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::Dataset;

use super::store::BlobStore;

/// Persistent entries older than this trigger a refetch on resolve.
/// Sheet edits should show up within a few minutes without hammering the
/// endpoint on every tab switch.
pub const CACHE_TTL_MINUTES: i64 = 5;

/// Namespace prefix for persistent store keys.
const KEY_PREFIX: &str = "sheet_";

/// Source of sheet data, normally the remote endpoint.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch_sheet(&self, sheet: &str) -> Result<Dataset>;
}

/// Time source, injectable so staleness is testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// The single serialized blob stored per sheet name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedSheet {
    pub fetched_at: DateTime<Utc>,
    pub data: Dataset,
}

impl CachedSheet {
    /// Fresh iff strictly younger than the TTL. Staleness only schedules a
    /// refetch; it never evicts the entry.
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now - self.fetched_at < Duration::minutes(CACHE_TTL_MINUTES)
    }
}

/// Which tier satisfied a resolve. Anything but `Network` means the data
/// may be behind the sheet and is worth revalidating in the background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Memory,
    Persistent,
    Network,
}

/// A successfully resolved sheet plus the tier that served it.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub records: Dataset,
    pub origin: Origin,
}

pub struct CacheCoordinator {
    memory: HashMap<String, Dataset>,
    fetched_at: HashMap<String, DateTime<Utc>>,
    store: Box<dyn BlobStore>,
    source: Arc<dyn DataSource>,
    clock: Arc<dyn Clock>,
}

impl CacheCoordinator {
    pub fn new(store: Box<dyn BlobStore>, source: Arc<dyn DataSource>) -> Self {
        Self::with_clock(store, source, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Box<dyn BlobStore>,
        source: Arc<dyn DataSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            memory: HashMap::new(),
            fetched_at: HashMap::new(),
            store,
            source,
            clock,
        }
    }

    /// Handle to the fetch source, for spawned background refresh tasks.
    pub fn source(&self) -> Arc<dyn DataSource> {
        Arc::clone(&self.source)
    }

    /// Resolve a sheet: memory, then fresh persistent entry, then network.
    ///
    /// An error means the sheet is unavailable right now - nothing usable was
    /// cached and the fetch failed. Both cache tiers are left untouched on
    /// failure, so the next resolve retries cleanly.
    pub async fn resolve(&mut self, sheet: &str) -> Result<Resolved> {
        if let Some(records) = self.memory.get(sheet) {
            debug!(sheet, "Resolved from memory");
            return Ok(Resolved {
                records: records.clone(),
                origin: Origin::Memory,
            });
        }

        if let Some(cached) = self.load_persistent(sheet) {
            if cached.is_fresh(self.clock.now()) {
                debug!(sheet, fetched_at = %cached.fetched_at, "Resolved from persistent cache");
                self.memory.insert(sheet.to_string(), cached.data.clone());
                self.fetched_at.insert(sheet.to_string(), cached.fetched_at);
                return Ok(Resolved {
                    records: cached.data,
                    origin: Origin::Persistent,
                });
            }
            debug!(sheet, fetched_at = %cached.fetched_at, "Persistent entry stale, refetching");
        }

        let records = self
            .source
            .fetch_sheet(sheet)
            .await
            .with_context(|| format!("Failed to fetch sheet {}", sheet))?;

        self.store_both_tiers(sheet, records.clone());
        Ok(Resolved {
            records,
            origin: Origin::Network,
        })
    }

    /// Apply the result of an unconditional background fetch.
    ///
    /// Returns true when the payload differs structurally from what is
    /// currently cached, i.e. the view showing this sheet needs a re-render.
    /// Both tiers are rewritten either way so the timestamp always advances.
    pub fn apply_refresh(&mut self, sheet: &str, records: Dataset) -> bool {
        let current = self
            .memory
            .get(sheet)
            .cloned()
            .or_else(|| self.load_persistent(sheet).map(|cached| cached.data));
        let changed = current.as_ref() != Some(&records);

        self.store_both_tiers(sheet, records);
        changed
    }

    /// What resolve would serve from memory, if anything.
    pub fn cached(&self, sheet: &str) -> Option<&Dataset> {
        self.memory.get(sheet)
    }

    /// When the sheet was last successfully fetched, for the status bar.
    pub fn last_fetched(&self, sheet: &str) -> Option<DateTime<Utc>> {
        self.fetched_at
            .get(sheet)
            .copied()
            .or_else(|| self.load_persistent(sheet).map(|cached| cached.fetched_at))
    }

    fn store_key(sheet: &str) -> String {
        format!("{}{}", KEY_PREFIX, sheet)
    }

    fn load_persistent(&self, sheet: &str) -> Option<CachedSheet> {
        let blob = self.store.get(&Self::store_key(sheet))?;
        match serde_json::from_str(&blob) {
            Ok(cached) => Some(cached),
            Err(e) => {
                // Unparseable blob is a miss; the next fetch overwrites it
                warn!(sheet, error = %e, "Corrupt cache blob, ignoring");
                None
            }
        }
    }

    fn store_both_tiers(&mut self, sheet: &str, records: Dataset) {
        let now = self.clock.now();
        let cached = CachedSheet {
            fetched_at: now,
            data: records,
        };

        match serde_json::to_string(&cached) {
            Ok(blob) => {
                if let Err(e) = self.store.set(&Self::store_key(sheet), &blob) {
                    // Soft failure: keep running off memory and network
                    warn!(sheet, error = %e, "Failed to persist sheet cache");
                }
            }
            Err(e) => {
                warn!(sheet, error = %e, "Failed to serialize sheet cache");
            }
        }

        self.memory.insert(sheet.to_string(), cached.data);
        self.fetched_at.insert(sheet.to_string(), now);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::models::Record;

    fn rows(json: &str) -> Dataset {
        serde_json::from_str::<Vec<Record>>(json).unwrap()
    }

    fn sample() -> Dataset {
        rows(r#"[{"Event": "Chess", "Date": "2024-01-05"}, {"Event": "Quiz", "Date": "2024-02-11"}]"#)
    }

    // ----- fakes ------------------------------------------------------------

    #[derive(Default)]
    struct FakeStore {
        blobs: Mutex<HashMap<String, String>>,
        fail_writes: AtomicBool,
    }

    impl BlobStore for FakeStore {
        fn get(&self, key: &str) -> Option<String> {
            self.blobs.lock().unwrap().get(key).cloned()
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                anyhow::bail!("quota exceeded");
            }
            self.blobs
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeSource {
        response: Mutex<Option<Dataset>>,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn with(records: Dataset) -> Self {
            Self {
                response: Mutex::new(Some(records)),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DataSource for FakeSource {
        async fn fetch_sheet(&self, _sheet: &str) -> Result<Dataset> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| anyhow::anyhow!("endpoint down"))
        }
    }

    struct FakeClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl FakeClock {
        fn at_epoch() -> Self {
            Self {
                now: Mutex::new(DateTime::from_timestamp(1_700_000_000, 0).unwrap()),
            }
        }

        fn advance_minutes(&self, minutes: i64) {
            let mut now = self.now.lock().unwrap();
            *now += Duration::minutes(minutes);
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    fn coordinator(
        store: Arc<FakeStore>,
        source: Arc<FakeSource>,
        clock: Arc<FakeClock>,
    ) -> CacheCoordinator {
        struct StoreHandle(Arc<FakeStore>);
        impl BlobStore for StoreHandle {
            fn get(&self, key: &str) -> Option<String> {
                self.0.get(key)
            }
            fn set(&self, key: &str, value: &str) -> Result<()> {
                self.0.set(key, value)
            }
        }
        CacheCoordinator::with_clock(Box::new(StoreHandle(store)), source, clock)
    }

    // ----- resolve ----------------------------------------------------------

    #[tokio::test]
    async fn test_cold_resolve_fetches_and_fills_both_tiers() {
        let store = Arc::new(FakeStore::default());
        let source = Arc::new(FakeSource::with(sample()));
        let clock = Arc::new(FakeClock::at_epoch());
        let mut cache = coordinator(store.clone(), source.clone(), clock);

        let resolved = cache.resolve("Events").await.unwrap();
        assert_eq!(resolved.records, sample());
        assert_eq!(resolved.origin, Origin::Network);
        assert_eq!(source.calls(), 1);
        assert!(store.blobs.lock().unwrap().contains_key("sheet_Events"));
        assert_eq!(cache.cached("Events"), Some(&sample()));
    }

    #[tokio::test]
    async fn test_memory_hit_does_no_io() {
        let store = Arc::new(FakeStore::default());
        let source = Arc::new(FakeSource::with(sample()));
        let clock = Arc::new(FakeClock::at_epoch());
        let mut cache = coordinator(store, source.clone(), clock.clone());

        cache.resolve("Events").await.unwrap();
        // Even a long-expired entry is served from memory within a session
        clock.advance_minutes(CACHE_TTL_MINUTES * 10);
        let resolved = cache.resolve("Events").await.unwrap();
        assert_eq!(resolved.origin, Origin::Memory);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_fresh_persistent_entry_skips_network() {
        let store = Arc::new(FakeStore::default());
        let source = Arc::new(FakeSource::with(sample()));
        let clock = Arc::new(FakeClock::at_epoch());

        // Seed the persistent tier through one coordinator...
        let mut warm = coordinator(store.clone(), source.clone(), clock.clone());
        warm.resolve("Events").await.unwrap();
        assert_eq!(source.calls(), 1);

        // ...then a fresh session four minutes later reads it without fetching
        clock.advance_minutes(4);
        let mut cache = coordinator(store, source.clone(), clock);
        let resolved = cache.resolve("Events").await.unwrap();
        assert_eq!(resolved.records, sample());
        assert_eq!(resolved.origin, Origin::Persistent);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_stale_persistent_entry_refetches() {
        let store = Arc::new(FakeStore::default());
        let source = Arc::new(FakeSource::with(sample()));
        let clock = Arc::new(FakeClock::at_epoch());

        let mut warm = coordinator(store.clone(), source.clone(), clock.clone());
        warm.resolve("Events").await.unwrap();

        clock.advance_minutes(CACHE_TTL_MINUTES);
        let mut cache = coordinator(store, source.clone(), clock);
        let resolved = cache.resolve("Events").await.unwrap();
        assert_eq!(resolved.origin, Origin::Network);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_unavailable_and_leaves_cache_alone() {
        let store = Arc::new(FakeStore::default());
        let source = Arc::new(FakeSource::default()); // always errors
        let clock = Arc::new(FakeClock::at_epoch());
        let mut cache = coordinator(store.clone(), source, clock);

        assert!(cache.resolve("Events").await.is_err());
        assert!(store.blobs.lock().unwrap().is_empty());
        assert!(cache.cached("Events").is_none());
    }

    #[tokio::test]
    async fn test_corrupt_blob_is_a_miss_not_an_error() {
        let store = Arc::new(FakeStore::default());
        store
            .blobs
            .lock()
            .unwrap()
            .insert("sheet_Events".to_string(), "not json {{".to_string());
        let source = Arc::new(FakeSource::with(sample()));
        let clock = Arc::new(FakeClock::at_epoch());
        let mut cache = coordinator(store, source.clone(), clock);

        let resolved = cache.resolve("Events").await.unwrap();
        assert_eq!(resolved.records, sample());
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_store_write_failure_is_soft() {
        let store = Arc::new(FakeStore::default());
        store.fail_writes.store(true, Ordering::SeqCst);
        let source = Arc::new(FakeSource::with(sample()));
        let clock = Arc::new(FakeClock::at_epoch());
        let mut cache = coordinator(store, source.clone(), clock);

        // Resolve still succeeds and memory still serves the next call
        assert_eq!(cache.resolve("Events").await.unwrap().records, sample());
        assert_eq!(cache.resolve("Events").await.unwrap().records, sample());
        assert_eq!(source.calls(), 1);
    }

    // ----- apply_refresh ----------------------------------------------------

    #[tokio::test]
    async fn test_identical_refresh_reports_unchanged_but_extends_freshness() {
        let store = Arc::new(FakeStore::default());
        let source = Arc::new(FakeSource::with(sample()));
        let clock = Arc::new(FakeClock::at_epoch());
        let mut cache = coordinator(store, source, clock.clone());

        cache.resolve("Events").await.unwrap();
        let first = cache.last_fetched("Events").unwrap();

        clock.advance_minutes(3);
        assert!(!cache.apply_refresh("Events", sample()));

        // Timestamp advanced even though nothing changed
        let second = cache.last_fetched("Events").unwrap();
        assert_eq!(second - first, Duration::minutes(3));
    }

    #[tokio::test]
    async fn test_changed_refresh_reports_changed_and_replaces_payload() {
        let store = Arc::new(FakeStore::default());
        let source = Arc::new(FakeSource::with(sample()));
        let clock = Arc::new(FakeClock::at_epoch());
        let mut cache = coordinator(store, source, clock);

        cache.resolve("Events").await.unwrap();

        let updated = rows(r#"[{"Event": "Chess", "Date": "2024-01-05"}]"#);
        assert!(cache.apply_refresh("Events", updated.clone()));
        assert_eq!(cache.cached("Events"), Some(&updated));
    }

    #[tokio::test]
    async fn test_refresh_equality_ignores_field_order() {
        let store = Arc::new(FakeStore::default());
        let source = Arc::new(FakeSource::with(rows(
            r#"[{"Event": "Chess", "Date": "2024-01-05"}]"#,
        )));
        let clock = Arc::new(FakeClock::at_epoch());
        let mut cache = coordinator(store, source, clock);

        cache.resolve("Events").await.unwrap();

        // Same rows, reordered fields: a serialization artifact, not a change
        let reordered = rows(r#"[{"Date": "2024-01-05", "Event": "Chess"}]"#);
        assert!(!cache.apply_refresh("Events", reordered));
    }

    #[tokio::test]
    async fn test_refresh_into_cold_cache_counts_as_change() {
        let store = Arc::new(FakeStore::default());
        let source = Arc::new(FakeSource::default());
        let clock = Arc::new(FakeClock::at_epoch());
        let mut cache = coordinator(store, source, clock);

        assert!(cache.apply_refresh("Winners", sample()));
        assert_eq!(cache.cached("Winners"), Some(&sample()));
    }
}
