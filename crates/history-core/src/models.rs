use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Display name used when no artist, show or audiobook name is present.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Display name used when no track, episode or chapter name is present.
pub const UNKNOWN_TRACK: &str = "Unknown Track";

/// One playback record as it appears in a streaming-history export.
///
/// Only `ts` and `ms_played` are required; every metadata field may be
/// absent depending on whether the play was music, a podcast episode or an
/// audiobook chapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayEvent {
    /// ISO 8601 timestamp of the play, e.g. `"2024-08-25T15:06:49Z"`.
    pub ts: String,
    /// Milliseconds played, exactly as exported.
    pub ms_played: f64,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub conn_country: Option<String>,
    #[serde(default)]
    pub ip_addr: Option<String>,
    #[serde(default)]
    pub master_metadata_track_name: Option<String>,
    #[serde(default)]
    pub master_metadata_album_artist_name: Option<String>,
    #[serde(default)]
    pub master_metadata_album_album_name: Option<String>,
    #[serde(default)]
    pub spotify_track_uri: Option<String>,
    #[serde(default)]
    pub episode_name: Option<String>,
    #[serde(default)]
    pub episode_show_name: Option<String>,
    #[serde(default)]
    pub spotify_episode_uri: Option<String>,
    #[serde(default)]
    pub audiobook_title: Option<String>,
    #[serde(default)]
    pub audiobook_uri: Option<String>,
    #[serde(default)]
    pub audiobook_chapter_uri: Option<String>,
    #[serde(default)]
    pub audiobook_chapter_title: Option<String>,
    #[serde(default)]
    pub reason_start: Option<String>,
    #[serde(default)]
    pub reason_end: Option<String>,
}

impl PlayEvent {
    /// Effective artist: album artist, then podcast show, then audiobook title.
    pub fn display_artist(&self) -> &str {
        first_present(
            &[
                &self.master_metadata_album_artist_name,
                &self.episode_show_name,
                &self.audiobook_title,
            ],
            UNKNOWN_ARTIST,
        )
    }

    /// Effective track: track name, then episode, then chapter, then
    /// audiobook title.
    pub fn display_track(&self) -> &str {
        first_present(
            &[
                &self.master_metadata_track_name,
                &self.episode_name,
                &self.audiobook_chapter_title,
                &self.audiobook_title,
            ],
            UNKNOWN_TRACK,
        )
    }
}

/// Return the first candidate that is present, or `fallback`.
///
/// Empty strings count as present; only missing values fall through.
fn first_present<'a>(candidates: &[&'a Option<String>], fallback: &'a str) -> &'a str {
    candidates
        .iter()
        .copied()
        .find_map(Option::as_deref)
        .unwrap_or(fallback)
}

/// A [`PlayEvent`] that passed validation.
///
/// Invariant: `played_at` is a valid instant and `ms_played > 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    /// Parsed `ts` of the underlying record.
    pub played_at: DateTime<Utc>,
    /// Milliseconds played, floored to an integer.
    pub ms_played: u64,
    /// The record as exported.
    pub record: PlayEvent,
}

impl NormalizedEvent {
    pub fn artist(&self) -> &str {
        self.record.display_artist()
    }

    pub fn track(&self) -> &str {
        self.record.display_track()
    }

    /// The (effective track, effective artist) pair.
    pub fn identity(&self) -> TrackIdentity<'_> {
        TrackIdentity {
            track: self.track(),
            artist: self.artist(),
        }
    }
}

/// Two plays with the same identity count as the same track, regardless of
/// album or URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackIdentity<'a> {
    pub track: &'a str,
    pub artist: &'a str,
}

/// Metadata about one successfully loaded batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySource {
    /// Batch name, usually the file name.
    pub name: String,
    /// Number of records that passed validation.
    pub event_count: usize,
    pub loaded_at: DateTime<Utc>,
}

// ── Summary output ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistStats {
    pub name: String,
    pub play_count: u64,
    pub total_time_ms: u64,
    /// Number of distinct tracks played for this artist.
    pub track_count: usize,
    /// Distinct track names, sorted lexicographically.
    pub tracks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackStats {
    pub name: String,
    pub artist: String,
    pub play_count: u64,
    pub total_time_ms: u64,
    pub average_time_ms: u64,
    /// Most recently seen album name for this track.
    pub album: Option<String>,
    /// Most recently seen track URI for this track.
    pub spotify_uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyData {
    /// Calendar day in the summary's timezone.
    pub date: NaiveDate,
    pub play_count: u64,
    pub total_time_ms: u64,
    pub top_artist: Option<String>,
    pub top_track: Option<String>,
    pub unique_artists: usize,
    pub unique_tracks: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyData {
    pub year: i32,
    /// 1-12.
    pub month: u32,
    pub play_count: u64,
    pub total_time_ms: u64,
    pub average_daily_time_ms: u64,
    pub unique_artists: usize,
    pub unique_tracks: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyData {
    pub year: i32,
    pub play_count: u64,
    pub total_time_ms: u64,
    pub average_daily_time_ms: u64,
    pub average_monthly_time_ms: u64,
    pub unique_artists: usize,
    pub unique_tracks: usize,
}

/// Reserved; genre classification is not performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenreStats {
    pub name: String,
    pub play_count: u64,
    pub total_time_ms: u64,
    pub artist_count: usize,
    pub artists: Vec<String>,
}

/// Observed span of play timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// The range reported when there are no events: both ends at the Unix epoch.
    pub fn sentinel() -> Self {
        Self {
            start: DateTime::<Utc>::UNIX_EPOCH,
            end: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        *self == Self::sentinel()
    }
}

/// The complete statistical summary of a canonical event sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_plays: u64,
    pub total_time_ms: u64,
    pub date_range: DateRange,
    pub artists: Vec<ArtistStats>,
    pub tracks: Vec<TrackStats>,
    pub daily_data: Vec<DailyData>,
    pub monthly_data: Vec<MonthlyData>,
    pub yearly_data: Vec<YearlyData>,
    pub genres: Vec<GenreStats>,
}

impl Summary {
    /// Summary of an empty sequence.
    pub fn empty() -> Self {
        Self {
            total_plays: 0,
            total_time_ms: 0,
            date_range: DateRange::sentinel(),
            artists: Vec::new(),
            tracks: Vec::new(),
            daily_data: Vec::new(),
            monthly_data: Vec::new(),
            yearly_data: Vec::new(),
            genres: Vec::new(),
        }
    }
}

// ── Filters ───────────────────────────────────────────────────────────────────

/// Inclusive calendar-day bounds; `None` leaves that side open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRangeFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Filter selection held alongside the summary. Not applied yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSettings {
    pub date_range: DateRangeFilter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_play_time_ms: Option<u64>,
}
