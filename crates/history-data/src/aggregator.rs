//! Listening statistics over the canonical event sequence.
//!
//! One pass over the events fills keyed accumulators (artist, track, day,
//! month, year); a finishing pass turns each accumulator map into its sorted
//! output list. Accumulators borrow names from the input and never outlive a
//! single [`HistoryAggregator::summarize`] call.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;

use chrono::{Datelike, NaiveDate};
use chrono_tz::Tz;
use history_core::models::{
    ArtistStats, DailyData, DateRange, MonthlyData, NormalizedEvent, Summary, TrackIdentity,
    TrackStats, YearlyData,
};
use history_core::time_utils::{local_date, month_key};
use tracing::debug;

// ── Tally ─────────────────────────────────────────────────────────────────────

/// Play count and total played time for one key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub play_count: u64,
    pub total_time_ms: u64,
}

impl Tally {
    /// Sums saturate at `u64::MAX`.
    fn add(&mut self, ms_played: u64) {
        self.play_count = self.play_count.saturating_add(1);
        self.total_time_ms = self.total_time_ms.saturating_add(ms_played);
    }
}

/// Ranking order shared by artist ranking, track ranking and daily top
/// resolution: more plays first, then more total time.
///
/// Equal tallies compare `Equal`; callers keep first-seen order for those.
pub fn compare_rank(a: &Tally, b: &Tally) -> Ordering {
    b.play_count
        .cmp(&a.play_count)
        .then_with(|| b.total_time_ms.cmp(&a.total_time_ms))
}

/// `total / count` rounded half up; `0` when `count` is zero.
pub fn rounded_average(total: u64, count: u64) -> u64 {
    if count == 0 {
        return 0;
    }
    let quotient = total / count;
    let remainder = total % count;
    if remainder >= count - remainder {
        quotient + 1
    } else {
        quotient
    }
}

// ── Insertion-ordered buckets ─────────────────────────────────────────────────

/// Keyed accumulators that remember the order keys were first seen.
struct OrderedBuckets<K, B> {
    index: HashMap<K, usize>,
    buckets: Vec<(K, B)>,
}

impl<K: Copy + Eq + Hash, B: Default> OrderedBuckets<K, B> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            buckets: Vec::new(),
        }
    }

    fn entry(&mut self, key: K) -> &mut B {
        let next = self.buckets.len();
        let idx = *self.index.entry(key).or_insert(next);
        if idx == next {
            self.buckets.push((key, B::default()));
        }
        &mut self.buckets[idx].1
    }

    fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Buckets in first-seen order.
    fn into_ordered(self) -> Vec<(K, B)> {
        self.buckets
    }
}

impl<K, B> Default for OrderedBuckets<K, B>
where
    K: Copy + Eq + Hash,
    B: Default,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Per-period tallies used to pick the period's top entity.
type Leaderboard<K> = OrderedBuckets<K, Tally>;

impl<K: Copy + Eq + Hash> Leaderboard<K> {
    fn record(&mut self, key: K, ms_played: u64) {
        self.entry(key).add(ms_played);
    }

    /// Highest-ranked key; on a full tie the first-seen key wins.
    fn top(&self) -> Option<K> {
        self.buckets
            .iter()
            .min_by(|a, b| compare_rank(&a.1, &b.1))
            .map(|(key, _)| *key)
    }
}

// ── Bucket types ──────────────────────────────────────────────────────────────

#[derive(Default)]
struct ArtistBucket<'a> {
    tally: Tally,
    /// Distinct track names; the artist half of the identity is fixed.
    tracks: BTreeSet<&'a str>,
}

#[derive(Default)]
struct TrackBucket<'a> {
    tally: Tally,
    album: Option<&'a str>,
    uri: Option<&'a str>,
}

#[derive(Default)]
struct DayBucket<'a> {
    tally: Tally,
    // One leaderboard entry per distinct artist / track, so their lengths are
    // the day's unique counts.
    artists: Leaderboard<&'a str>,
    tracks: Leaderboard<TrackIdentity<'a>>,
}

#[derive(Default)]
struct PeriodBucket<'a> {
    tally: Tally,
    artists: HashSet<&'a str>,
    tracks: HashSet<TrackIdentity<'a>>,
    days: HashSet<NaiveDate>,
}

#[derive(Default)]
struct YearBucket<'a> {
    period: PeriodBucket<'a>,
    months: HashSet<u32>,
}

impl<'a> PeriodBucket<'a> {
    fn add(&mut self, identity: TrackIdentity<'a>, day: NaiveDate, ms_played: u64) {
        self.tally.add(ms_played);
        self.artists.insert(identity.artist);
        self.tracks.insert(identity);
        self.days.insert(day);
    }
}

// ── HistoryAggregator ─────────────────────────────────────────────────────────

/// Stateless summary builder.
pub struct HistoryAggregator;

impl HistoryAggregator {
    /// Build the full [`Summary`] of `events`.
    ///
    /// Calendar days, months and years are taken in `tz`. The result depends
    /// only on `events` and `tz`. `events` is expected to be the canonical
    /// sequence, but the date range is computed as min/max so any order works.
    pub fn summarize(events: &[NormalizedEvent], tz: &Tz) -> Summary {
        if events.is_empty() {
            return Summary::empty();
        }

        let mut totals = Tally::default();
        let mut artists: OrderedBuckets<&str, ArtistBucket> = OrderedBuckets::new();
        let mut tracks: OrderedBuckets<TrackIdentity, TrackBucket> = OrderedBuckets::new();
        let mut days: BTreeMap<NaiveDate, DayBucket> = BTreeMap::new();
        let mut months: BTreeMap<(i32, u32), PeriodBucket> = BTreeMap::new();
        let mut years: BTreeMap<i32, YearBucket> = BTreeMap::new();

        for event in events {
            let identity = event.identity();
            let ms = event.ms_played;
            let day = local_date(event.played_at, tz);

            totals.add(ms);

            let artist = artists.entry(identity.artist);
            artist.tally.add(ms);
            artist.tracks.insert(identity.track);

            let track = tracks.entry(identity);
            track.tally.add(ms);
            if let Some(album) = event.record.master_metadata_album_album_name.as_deref() {
                track.album = Some(album);
            }
            if let Some(uri) = event.record.spotify_track_uri.as_deref() {
                track.uri = Some(uri);
            }

            let daily = days.entry(day).or_default();
            daily.tally.add(ms);
            daily.artists.record(identity.artist, ms);
            daily.tracks.record(identity, ms);

            months
                .entry(month_key(day))
                .or_default()
                .add(identity, day, ms);

            let yearly = years.entry(day.year()).or_default();
            yearly.period.add(identity, day, ms);
            yearly.months.insert(day.month());
        }

        let first = events.iter().map(|e| e.played_at).min();
        let last = events.iter().map(|e| e.played_at).max();
        let date_range = match (first, last) {
            (Some(start), Some(end)) => DateRange { start, end },
            _ => DateRange::sentinel(),
        };

        let summary = Summary {
            total_plays: totals.play_count,
            total_time_ms: totals.total_time_ms,
            date_range,
            artists: Self::finish_artists(artists),
            tracks: Self::finish_tracks(tracks),
            daily_data: Self::finish_days(days),
            monthly_data: Self::finish_months(months),
            yearly_data: Self::finish_years(years),
            genres: Vec::new(),
        };

        debug!(
            "Summarized {} plays: {} artists, {} tracks, {} days",
            summary.total_plays,
            summary.artists.len(),
            summary.tracks.len(),
            summary.daily_data.len()
        );

        summary
    }

    // ── Finishing passes ──────────────────────────────────────────────────────

    fn finish_artists(artists: OrderedBuckets<&str, ArtistBucket>) -> Vec<ArtistStats> {
        let mut ordered = artists.into_ordered();
        ordered.sort_by(|a, b| compare_rank(&a.1.tally, &b.1.tally));

        ordered
            .into_iter()
            .map(|(name, bucket)| ArtistStats {
                name: name.to_string(),
                play_count: bucket.tally.play_count,
                total_time_ms: bucket.tally.total_time_ms,
                track_count: bucket.tracks.len(),
                tracks: bucket.tracks.into_iter().map(str::to_string).collect(),
            })
            .collect()
    }

    fn finish_tracks(tracks: OrderedBuckets<TrackIdentity, TrackBucket>) -> Vec<TrackStats> {
        let mut ordered = tracks.into_ordered();
        ordered.sort_by(|a, b| compare_rank(&a.1.tally, &b.1.tally));

        ordered
            .into_iter()
            .map(|(identity, bucket)| TrackStats {
                name: identity.track.to_string(),
                artist: identity.artist.to_string(),
                play_count: bucket.tally.play_count,
                total_time_ms: bucket.tally.total_time_ms,
                average_time_ms: rounded_average(
                    bucket.tally.total_time_ms,
                    bucket.tally.play_count,
                ),
                album: bucket.album.map(str::to_string),
                spotify_uri: bucket.uri.map(str::to_string),
            })
            .collect()
    }

    fn finish_days(days: BTreeMap<NaiveDate, DayBucket>) -> Vec<DailyData> {
        days.into_iter()
            .map(|(date, bucket)| DailyData {
                date,
                play_count: bucket.tally.play_count,
                total_time_ms: bucket.tally.total_time_ms,
                top_artist: bucket.artists.top().map(str::to_string),
                top_track: bucket.tracks.top().map(|id| id.track.to_string()),
                unique_artists: bucket.artists.len(),
                unique_tracks: bucket.tracks.len(),
            })
            .collect()
    }

    fn finish_months(months: BTreeMap<(i32, u32), PeriodBucket>) -> Vec<MonthlyData> {
        months
            .into_iter()
            .map(|((year, month), bucket)| MonthlyData {
                year,
                month,
                play_count: bucket.tally.play_count,
                total_time_ms: bucket.tally.total_time_ms,
                average_daily_time_ms: rounded_average(
                    bucket.tally.total_time_ms,
                    bucket.days.len() as u64,
                ),
                unique_artists: bucket.artists.len(),
                unique_tracks: bucket.tracks.len(),
            })
            .collect()
    }

    fn finish_years(years: BTreeMap<i32, YearBucket>) -> Vec<YearlyData> {
        years
            .into_iter()
            .map(|(year, bucket)| YearlyData {
                year,
                play_count: bucket.period.tally.play_count,
                total_time_ms: bucket.period.tally.total_time_ms,
                average_daily_time_ms: rounded_average(
                    bucket.period.tally.total_time_ms,
                    bucket.period.days.len() as u64,
                ),
                average_monthly_time_ms: rounded_average(
                    bucket.period.tally.total_time_ms,
                    bucket.months.len() as u64,
                ),
                unique_artists: bucket.period.artists.len(),
                unique_tracks: bucket.period.tracks.len(),
            })
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
