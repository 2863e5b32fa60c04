//! Consumer-facing state holder.
//!
//! [`HistoryStore`] owns the canonical events, the summary computed from them
//! and the status of the last load. Its only mutation is replacing that state
//! with the result of the next load or recomputation.

use std::sync::Arc;

use chrono_tz::Tz;
use history_core::error::Result;
use history_core::models::{FilterSettings, HistorySource, NormalizedEvent, Summary};
use history_data::aggregator::HistoryAggregator;
use history_data::normalizer::CanonicalHistory;
use history_data::reader::BatchSource;
use tracing::{error, info, warn};

use crate::loader::BatchLoader;

// ── HistoryStore ──────────────────────────────────────────────────────────────

/// Loaded listening history plus its summary and load status.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use history_data::reader::{BatchSource, JsonFileSource};
/// use history_runtime::loader::BatchLoader;
/// use history_runtime::store::HistoryStore;
///
/// # async fn run() -> history_core::Result<()> {
/// let sources: Vec<Arc<dyn BatchSource>> =
///     vec![Arc::new(JsonFileSource::new("Streaming_History_Audio_2024.json"))];
/// let mut store = HistoryStore::new(BatchLoader::default(), chrono_tz::Tz::UTC);
/// let summary = store.load_history(&sources).await?;
/// println!("{} plays", summary.total_plays);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct HistoryStore {
    loader: BatchLoader,
    /// Calendar used for day, month and year keys.
    timezone: Tz,
    raw_events: Vec<NormalizedEvent>,
    summary: Option<Summary>,
    data_sources: Vec<HistorySource>,
    filters: FilterSettings,
    is_loading: bool,
    error: Option<String>,
    warning: Option<String>,
    failed_sources: Vec<String>,
}

impl HistoryStore {
    pub fn new(loader: BatchLoader, timezone: Tz) -> Self {
        Self {
            loader,
            timezone,
            raw_events: Vec::new(),
            summary: None,
            data_sources: Vec::new(),
            filters: FilterSettings::default(),
            is_loading: false,
            error: None,
            warning: None,
            failed_sources: Vec::new(),
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Run one full load cycle over `sources` and return the new summary.
    ///
    /// Batches that fail while at least one succeeds are reported through
    /// [`warning`](Self::warning) and [`failed_sources`](Self::failed_sources).
    /// When no batch loads, all held state is cleared, the error message is
    /// recorded and the error is returned.
    pub async fn load_history(&mut self, sources: &[Arc<dyn BatchSource>]) -> Result<&Summary> {
        let loader = self.begin_load();
        let result = loader.load_canonical(sources).await;
        self.finish_load(result)
    }

    /// Mark a load as started and return the loader to run it with.
    ///
    /// For stores shared behind a lock: call this, release the lock while the
    /// returned loader runs, then hand its result to
    /// [`finish_load`](Self::finish_load). [`is_loading`](Self::is_loading)
    /// stays `true` in between.
    pub fn begin_load(&mut self) -> BatchLoader {
        self.is_loading = true;
        self.error = None;
        self.loader.clone()
    }

    /// Replace the held state with the result of a load started by
    /// [`begin_load`](Self::begin_load).
    pub fn finish_load(&mut self, result: Result<CanonicalHistory>) -> Result<&Summary> {
        match result {
            Ok(history) => {
                self.warning = history.warning_message();
                self.failed_sources = history.failed_sources();
                if let Some(warning) = &self.warning {
                    warn!("{}", warning);
                }

                self.data_sources = history.sources;
                self.raw_events = history.events;
                self.is_loading = false;
                info!(
                    "History loaded: {} events from {} sources",
                    self.raw_events.len(),
                    self.data_sources.len()
                );
                Ok(self.recompute())
            }
            Err(e) => {
                error!("Failed to load listening history: {}", e);
                self.reset();
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Recompute the summary from the held events and replace it.
    pub fn recompute(&mut self) -> &Summary {
        let summary = HistoryAggregator::summarize(&self.raw_events, &self.timezone);
        self.summary.insert(summary)
    }

    /// Summary for the current filters.
    ///
    /// Filters are carried but not applied; this is the full summary.
    pub fn filtered_summary(&self) -> Option<&Summary> {
        self.summary.as_ref()
    }

    pub fn set_filters(&mut self, filters: FilterSettings) {
        self.filters = filters;
    }

    /// Switch the calendar and recompute when events are held.
    pub fn set_timezone(&mut self, timezone: Tz) {
        self.timezone = timezone;
        if self.summary.is_some() {
            self.recompute();
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn raw_events(&self) -> &[NormalizedEvent] {
        &self.raw_events
    }

    pub fn summary(&self) -> Option<&Summary> {
        self.summary.as_ref()
    }

    pub fn data_sources(&self) -> &[HistorySource] {
        &self.data_sources
    }

    pub fn filters(&self) -> &FilterSettings {
        &self.filters
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn failed_sources(&self) -> &[String] {
        &self.failed_sources
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    // ── Private helpers ───────────────────────────────────────────────────

    /// Drop everything a previous load produced. Filters and calendar stay.
    fn reset(&mut self) {
        self.raw_events.clear();
        self.summary = None;
        self.data_sources.clear();
        self.is_loading = false;
        self.error = None;
        self.warning = None;
        self.failed_sources.clear();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use history_core::error::HistoryError;
    use history_core::models::DateRangeFilter;
    use history_data::reader::{JsonFileSource, StaticSource};
    use serde_json::{json, Value};

    fn play(ts: &str, track: &str, artist: &str, ms: u64) -> Value {
        json!({
            "ts": ts,
            "ms_played": ms,
            "master_metadata_track_name": track,
            "master_metadata_album_artist_name": artist,
        })
    }

    fn good_source() -> Arc<dyn BatchSource> {
        Arc::new(StaticSource::new(
            "good.json",
            vec![
                play("2024-01-01T10:00:00Z", "A", "X", 60_000),
                play("2024-01-01T11:00:00Z", "B", "X", 30_000),
                play("2024-01-02T09:00:00Z", "A", "X", 60_000),
            ],
        ))
    }

    fn store() -> HistoryStore {
        HistoryStore::new(BatchLoader::default(), Tz::UTC)
    }

    // ── initial state ─────────────────────────────────────────────────────

    #[test]
    fn test_new_store_is_empty() {
        let store = store();
        assert!(store.summary().is_none());
        assert!(store.raw_events().is_empty());
        assert!(store.data_sources().is_empty());
        assert!(!store.is_loading());
        assert!(store.error().is_none());
        assert!(store.warning().is_none());
        assert!(store.failed_sources().is_empty());
    }

    // ── load_history ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_load_history_success() {
        let mut store = store();
        let summary = store.load_history(&[good_source()]).await.unwrap();
        assert_eq!(summary.total_plays, 3);
        assert_eq!(summary.total_time_ms, 150_000);

        assert_eq!(store.raw_events().len(), 3);
        assert_eq!(store.data_sources().len(), 1);
        assert_eq!(store.data_sources()[0].name, "good.json");
        assert_eq!(store.data_sources()[0].event_count, 3);
        assert!(!store.is_loading());
        assert!(store.error().is_none());
        assert!(store.warning().is_none());
    }

    #[tokio::test]
    async fn test_is_loading_between_begin_and_finish() {
        let mut store = store();
        store.load_history(&[good_source()]).await.unwrap();

        let loader = store.begin_load();
        assert!(store.is_loading());
        assert!(store.error().is_none());
        // Previous results stay visible while the next load runs.
        assert_eq!(store.summary().unwrap().total_plays, 3);

        let result = loader.load_canonical(&[good_source()]).await;
        let summary = store.finish_load(result).unwrap();
        assert_eq!(summary.total_plays, 3);
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_finish_load_failure_clears_loading_flag() {
        let mut store = store();
        let loader = store.begin_load();
        assert!(store.is_loading());

        let result = loader.load_canonical(&[]).await;
        assert!(store.finish_load(result).is_err());
        assert!(!store.is_loading());
        assert!(store.error().is_some());
    }

    #[tokio::test]
    async fn test_load_history_partial_failure() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing: Arc<dyn BatchSource> =
            Arc::new(JsonFileSource::new(dir.path().join("broken.json")));

        let mut store = store();
        let summary = store.load_history(&[missing, good_source()]).await.unwrap();
        assert_eq!(summary.total_plays, 3);

        assert!(store.error().is_none());
        assert_eq!(store.failed_sources(), &["broken.json".to_string()]);
        let warning = store.warning().unwrap();
        assert!(warning.contains("broken.json"));
        assert_eq!(store.data_sources().len(), 1);
    }

    #[tokio::test]
    async fn test_load_history_fatal_clears_prior_state() {
        let mut store = store();
        store.load_history(&[good_source()]).await.unwrap();
        assert!(store.summary().is_some());

        let err = store.load_history(&[]).await.unwrap_err();
        assert!(matches!(err, HistoryError::NoBatchesAvailable));

        assert!(store.summary().is_none());
        assert!(store.raw_events().is_empty());
        assert!(store.data_sources().is_empty());
        assert!(!store.is_loading());
        assert_eq!(
            store.error(),
            Some("No listening history files were found to load")
        );
    }

    #[tokio::test]
    async fn test_load_history_all_failed() {
        let dir = tempfile::TempDir::new().unwrap();
        let a: Arc<dyn BatchSource> = Arc::new(JsonFileSource::new(dir.path().join("a.json")));
        let b: Arc<dyn BatchSource> = Arc::new(JsonFileSource::new(dir.path().join("b.json")));

        let mut store = store();
        let err = store.load_history(&[a, b]).await.unwrap_err();
        assert!(matches!(err, HistoryError::AllBatchesFailed { .. }));
        assert!(store.summary().is_none());
        assert!(store.error().unwrap().contains("a.json"));
    }

    #[tokio::test]
    async fn test_successful_reload_clears_previous_warning() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing: Arc<dyn BatchSource> =
            Arc::new(JsonFileSource::new(dir.path().join("gone.json")));

        let mut store = store();
        store.load_history(&[missing, good_source()]).await.unwrap();
        assert!(store.warning().is_some());

        store.load_history(&[good_source()]).await.unwrap();
        assert!(store.warning().is_none());
        assert!(store.failed_sources().is_empty());
    }

    // ── recompute / filters / timezone ────────────────────────────────────

    #[tokio::test]
    async fn test_recompute_is_stable() {
        let mut store = store();
        let first = store.load_history(&[good_source()]).await.unwrap().clone();
        let second = store.recompute().clone();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_filtered_summary_ignores_filters() {
        let mut store = store();
        store.load_history(&[good_source()]).await.unwrap();

        store.set_filters(FilterSettings {
            date_range: DateRangeFilter {
                start: NaiveDate::from_ymd_opt(2024, 1, 2),
                end: None,
            },
            artist: Some("Nobody".to_string()),
            track: None,
            min_play_time_ms: Some(1_000_000),
        });

        assert_eq!(store.filters().artist.as_deref(), Some("Nobody"));
        assert_eq!(store.filtered_summary(), store.summary());
        assert_eq!(store.filtered_summary().unwrap().total_plays, 3);
    }

    #[tokio::test]
    async fn test_set_timezone_recomputes_days() {
        let source: Arc<dyn BatchSource> = Arc::new(StaticSource::new(
            "late.json",
            vec![play("2023-12-31T23:30:00Z", "Late", "X", 1_000)],
        ));
        let mut store = store();
        store.load_history(&[source]).await.unwrap();
        assert_eq!(store.summary().unwrap().yearly_data[0].year, 2023);

        store.set_timezone(Tz::Asia__Tokyo);
        assert_eq!(store.timezone(), Tz::Asia__Tokyo);
        assert_eq!(store.summary().unwrap().yearly_data[0].year, 2024);
    }
}
