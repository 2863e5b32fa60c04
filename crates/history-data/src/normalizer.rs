//! Record validation, per-batch loading, and deduplicating merge.
//!
//! Raw batches go in, one canonical event sequence comes out: every event
//! valid, no two events sharing a [`DedupKey`], ascending by timestamp.

use std::collections::HashSet;

use chrono::Utc;
use history_core::error::{HistoryError, Result};
use history_core::models::{HistorySource, NormalizedEvent, PlayEvent};
use history_core::time_utils::parse_timestamp;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::reader::BatchSource;

// ── Validation ────────────────────────────────────────────────────────────────

/// Validate one raw record.
///
/// Accepted iff the record is an object, `ts` is a parseable timestamp string
/// and `ms_played` is a number greater than zero. The played time is floored
/// to whole milliseconds; a record that floors to zero is rejected. Optional
/// metadata fields of the wrong type are treated as absent.
pub fn validate(record: &Value) -> Option<NormalizedEvent> {
    let obj = record.as_object()?;

    let ts = obj.get("ts")?.as_str()?;
    let played_at = parse_timestamp(ts)?;

    let raw_ms = obj.get("ms_played")?.as_f64()?;
    if raw_ms <= 0.0 {
        return None;
    }
    let ms_played = raw_ms.floor() as u64;
    if ms_played == 0 {
        return None;
    }

    Some(NormalizedEvent {
        played_at,
        ms_played,
        record: PlayEvent {
            ts: ts.to_string(),
            ms_played: raw_ms,
            platform: str_field(obj, "platform"),
            conn_country: str_field(obj, "conn_country"),
            ip_addr: str_field(obj, "ip_addr"),
            master_metadata_track_name: str_field(obj, "master_metadata_track_name"),
            master_metadata_album_artist_name: str_field(obj, "master_metadata_album_artist_name"),
            master_metadata_album_album_name: str_field(obj, "master_metadata_album_album_name"),
            spotify_track_uri: str_field(obj, "spotify_track_uri"),
            episode_name: str_field(obj, "episode_name"),
            episode_show_name: str_field(obj, "episode_show_name"),
            spotify_episode_uri: str_field(obj, "spotify_episode_uri"),
            audiobook_title: str_field(obj, "audiobook_title"),
            audiobook_uri: str_field(obj, "audiobook_uri"),
            audiobook_chapter_uri: str_field(obj, "audiobook_chapter_uri"),
            audiobook_chapter_title: str_field(obj, "audiobook_chapter_title"),
            reason_start: str_field(obj, "reason_start"),
            reason_end: str_field(obj, "reason_end"),
        },
    })
}

fn str_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Validate every record of a batch, silently dropping rejects.
pub fn normalize_records(records: &[Value]) -> Vec<NormalizedEvent> {
    let events: Vec<NormalizedEvent> = records.iter().filter_map(validate).collect();

    let rejected = records.len() - events.len();
    if rejected > 0 {
        debug!("{} of {} records rejected", rejected, records.len());
    }

    events
}

// ── Batch loading ─────────────────────────────────────────────────────────────

/// The validated events of one successfully loaded batch.
#[derive(Debug, Clone)]
pub struct LoadedBatch {
    pub source: HistorySource,
    pub events: Vec<NormalizedEvent>,
}

/// A batch that could not be fetched or parsed.
#[derive(Debug)]
pub struct BatchFailure {
    pub name: String,
    pub cause: HistoryError,
}

/// Result of loading one batch. Failures are values, not early returns.
pub type BatchOutcome = std::result::Result<LoadedBatch, BatchFailure>;

/// Fetch one batch and validate its records.
pub fn load_batch(source: &dyn BatchSource) -> BatchOutcome {
    let name = source.name().to_string();

    match source.fetch() {
        Ok(records) => {
            let events = normalize_records(&records);
            debug!(
                "Batch {}: {} records read, {} valid",
                name,
                records.len(),
                events.len()
            );
            Ok(LoadedBatch {
                source: HistorySource {
                    name,
                    event_count: events.len(),
                    loaded_at: Utc::now(),
                },
                events,
            })
        }
        Err(cause) => {
            warn!("Failed to load batch {}: {}", name, cause);
            Err(BatchFailure { name, cause })
        }
    }
}

// ── Merge ─────────────────────────────────────────────────────────────────────

/// Identity of a play for deduplication across overlapping exports.
///
/// Built from the raw timestamp string, the raw track and album-artist names
/// (empty when absent) and the floored played time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DedupKey<'a> {
    pub ts: &'a str,
    pub track: &'a str,
    pub artist: &'a str,
    pub ms_played: u64,
}

pub fn dedup_key(event: &NormalizedEvent) -> DedupKey<'_> {
    DedupKey {
        ts: &event.record.ts,
        track: event
            .record
            .master_metadata_track_name
            .as_deref()
            .unwrap_or(""),
        artist: event
            .record
            .master_metadata_album_artist_name
            .as_deref()
            .unwrap_or(""),
        ms_played: event.ms_played,
    }
}

/// Drop every event whose [`DedupKey`] was already seen; first occurrence wins.
pub fn dedupe(events: Vec<NormalizedEvent>) -> Vec<NormalizedEvent> {
    let keep: Vec<bool> = {
        let mut seen = HashSet::with_capacity(events.len());
        events.iter().map(|e| seen.insert(dedup_key(e))).collect()
    };

    events
        .into_iter()
        .zip(keep)
        .filter_map(|(event, keep)| keep.then_some(event))
        .collect()
}

/// Deduplicate then stable-sort ascending by timestamp.
pub fn merge_events(events: Vec<NormalizedEvent>) -> Vec<NormalizedEvent> {
    let mut merged = dedupe(events);
    merged.sort_by_key(|e| e.played_at);
    merged
}

/// The merged result of one ingestion.
#[derive(Debug)]
pub struct CanonicalHistory {
    /// Deduplicated events, ascending by timestamp.
    pub events: Vec<NormalizedEvent>,
    /// Successfully loaded batches, in discovery order.
    pub sources: Vec<HistorySource>,
    /// Batches that failed, in discovery order.
    pub failures: Vec<BatchFailure>,
}

impl CanonicalHistory {
    pub fn failed_sources(&self) -> Vec<String> {
        self.failures.iter().map(|f| f.name.clone()).collect()
    }

    /// Multi-line warning describing failed batches, `None` when all loaded.
    pub fn warning_message(&self) -> Option<String> {
        if self.failures.is_empty() {
            return None;
        }
        let lines: Vec<String> = self
            .failures
            .iter()
            .map(|f| format!("{}: {}", f.name, f.cause))
            .collect();
        Some(format!(
            "Some history batches failed to load:\n{}",
            lines.join("\n")
        ))
    }
}

/// Merge batch outcomes, given in discovery order, into the canonical history.
///
/// Fails with [`HistoryError::NoBatchesAvailable`] when `outcomes` is empty
/// and with [`HistoryError::AllBatchesFailed`] when no batch loaded. Otherwise
/// failed batches are carried in [`CanonicalHistory::failures`].
pub fn merge_all(outcomes: Vec<BatchOutcome>) -> Result<CanonicalHistory> {
    if outcomes.is_empty() {
        return Err(HistoryError::NoBatchesAvailable);
    }

    let mut loaded: Vec<LoadedBatch> = Vec::new();
    let mut failures: Vec<BatchFailure> = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(batch) => loaded.push(batch),
            Err(failure) => failures.push(failure),
        }
    }

    if loaded.is_empty() {
        let cause = failures
            .first()
            .map(|f| format!("{}: {}", f.name, f.cause))
            .unwrap_or_default();
        return Err(HistoryError::AllBatchesFailed {
            failed: failures.into_iter().map(|f| f.name).collect(),
            cause,
        });
    }

    let mut sources = Vec::with_capacity(loaded.len());
    let mut all_events = Vec::new();
    for batch in loaded {
        sources.push(batch.source);
        all_events.extend(batch.events);
    }

    let total = all_events.len();
    let events = merge_events(all_events);
    debug!(
        "Merged {} events from {} batches ({} duplicates dropped, {} batches failed)",
        events.len(),
        sources.len(),
        total - events.len(),
        failures.len()
    );

    Ok(CanonicalHistory {
        events,
        sources,
        failures,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
