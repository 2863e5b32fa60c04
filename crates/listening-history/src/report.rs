//! Plain-text and JSON rendering of a [`Summary`].
//!
//! Each view is an aligned text table. Column widths are measured in display
//! columns so names with wide or combining characters line up.

use chrono_tz::Tz;
use history_core::formatting::{
    format_count, format_date_range, format_hours_minutes, format_minutes_seconds, percentage,
};
use history_core::models::Summary;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Widest a name column may get before its cells are truncated.
const MAX_NAME_WIDTH: usize = 40;

/// Entries listed under each heading of the summary view.
const SUMMARY_TOP_N: usize = 5;

// ── View ──────────────────────────────────────────────────────────────────────

/// Report selected with `--view`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Summary,
    Artists,
    Tracks,
    Daily,
    Monthly,
    Yearly,
    Json,
}

impl View {
    /// Parse a `--view` value. Unknown names return `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "summary" => Some(Self::Summary),
            "artists" => Some(Self::Artists),
            "tracks" => Some(Self::Tracks),
            "daily" => Some(Self::Daily),
            "monthly" => Some(Self::Monthly),
            "yearly" => Some(Self::Yearly),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Render `summary` for `view`.
///
/// `limit` caps the ranked views (artists, tracks); period views list every
/// period.
pub fn render(summary: &Summary, view: View, limit: usize, tz: &Tz) -> anyhow::Result<String> {
    let text = match view {
        View::Summary => render_summary(summary, tz),
        View::Artists => render_artists(summary, limit),
        View::Tracks => render_tracks(summary, limit),
        View::Daily => render_daily(summary),
        View::Monthly => render_monthly(summary),
        View::Yearly => render_yearly(summary),
        View::Json => serde_json::to_string_pretty(summary)?,
    };
    Ok(text)
}

// ── Views ─────────────────────────────────────────────────────────────────────

pub fn render_summary(summary: &Summary, tz: &Tz) -> String {
    let mut out = String::new();
    out.push_str("Listening history\n\n");
    out.push_str(&format!(
        "  Period:         {}\n",
        format_date_range(&summary.date_range, tz)
    ));
    out.push_str(&format!(
        "  Plays:          {}\n",
        format_count(summary.total_plays)
    ));
    out.push_str(&format!(
        "  Listening time: {}\n",
        format_hours_minutes(summary.total_time_ms)
    ));
    out.push_str(&format!(
        "  Artists:        {}\n",
        format_count(summary.artists.len() as u64)
    ));
    out.push_str(&format!(
        "  Tracks:         {}\n",
        format_count(summary.tracks.len() as u64)
    ));
    out.push_str(&format!(
        "  Active days:    {}\n",
        format_count(summary.daily_data.len() as u64)
    ));

    if summary.total_plays == 0 {
        return out;
    }

    out.push_str("\nTop artists\n");
    out.push_str(&render_artists(summary, SUMMARY_TOP_N));
    out.push_str("\nTop tracks\n");
    out.push_str(&render_tracks(summary, SUMMARY_TOP_N));
    out
}

pub fn render_artists(summary: &Summary, limit: usize) -> String {
    let mut table = TextTable::new(&[
        ("#", Align::Right),
        ("Artist", Align::Left),
        ("Plays", Align::Right),
        ("Share", Align::Right),
        ("Time", Align::Right),
        ("Tracks", Align::Right),
    ]);
    for (rank, artist) in summary.artists.iter().take(limit).enumerate() {
        table.push(vec![
            (rank + 1).to_string(),
            artist.name.clone(),
            format_count(artist.play_count),
            format!(
                "{:.1}%",
                percentage(artist.play_count, summary.total_plays, 1)
            ),
            format_hours_minutes(artist.total_time_ms),
            format_count(artist.track_count as u64),
        ]);
    }
    table.render()
}

pub fn render_tracks(summary: &Summary, limit: usize) -> String {
    let mut table = TextTable::new(&[
        ("#", Align::Right),
        ("Track", Align::Left),
        ("Artist", Align::Left),
        ("Plays", Align::Right),
        ("Time", Align::Right),
        ("Avg", Align::Right),
    ]);
    for (rank, track) in summary.tracks.iter().take(limit).enumerate() {
        table.push(vec![
            (rank + 1).to_string(),
            track.name.clone(),
            track.artist.clone(),
            format_count(track.play_count),
            format_hours_minutes(track.total_time_ms),
            format_minutes_seconds(track.average_time_ms),
        ]);
    }
    table.render()
}

pub fn render_daily(summary: &Summary) -> String {
    let mut table = TextTable::new(&[
        ("Date", Align::Left),
        ("Plays", Align::Right),
        ("Time", Align::Right),
        ("Artists", Align::Right),
        ("Tracks", Align::Right),
        ("Top artist", Align::Left),
        ("Top track", Align::Left),
    ]);
    for day in &summary.daily_data {
        table.push(vec![
            day.date.format("%Y-%m-%d").to_string(),
            format_count(day.play_count),
            format_hours_minutes(day.total_time_ms),
            format_count(day.unique_artists as u64),
            format_count(day.unique_tracks as u64),
            day.top_artist.clone().unwrap_or_else(|| "-".to_string()),
            day.top_track.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }
    table.render()
}

pub fn render_monthly(summary: &Summary) -> String {
    let mut table = TextTable::new(&[
        ("Month", Align::Left),
        ("Plays", Align::Right),
        ("Time", Align::Right),
        ("Daily avg", Align::Right),
        ("Artists", Align::Right),
        ("Tracks", Align::Right),
    ]);
    for month in &summary.monthly_data {
        table.push(vec![
            format!("{}-{:02}", month.year, month.month),
            format_count(month.play_count),
            format_hours_minutes(month.total_time_ms),
            format_hours_minutes(month.average_daily_time_ms),
            format_count(month.unique_artists as u64),
            format_count(month.unique_tracks as u64),
        ]);
    }
    table.render()
}

pub fn render_yearly(summary: &Summary) -> String {
    let mut table = TextTable::new(&[
        ("Year", Align::Left),
        ("Plays", Align::Right),
        ("Time", Align::Right),
        ("Daily avg", Align::Right),
        ("Monthly avg", Align::Right),
        ("Artists", Align::Right),
        ("Tracks", Align::Right),
    ]);
    for year in &summary.yearly_data {
        table.push(vec![
            year.year.to_string(),
            format_count(year.play_count),
            format_hours_minutes(year.total_time_ms),
            format_hours_minutes(year.average_daily_time_ms),
            format_hours_minutes(year.average_monthly_time_ms),
            format_count(year.unique_artists as u64),
            format_count(year.unique_tracks as u64),
        ]);
    }
    table.render()
}

// ── TextTable ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

/// Column-aligned plain-text table.
struct TextTable {
    headers: Vec<&'static str>,
    aligns: Vec<Align>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    fn new(columns: &[(&'static str, Align)]) -> Self {
        Self {
            headers: columns.iter().map(|(h, _)| *h).collect(),
            aligns: columns.iter().map(|(_, a)| *a).collect(),
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<String>) {
        let row = row
            .into_iter()
            .map(|cell| truncate_to_width(&cell, MAX_NAME_WIDTH))
            .collect();
        self.rows.push(row);
    }

    fn render(&self) -> String {
        if self.rows.is_empty() {
            return "  (no data)\n".to_string();
        }

        let widths: Vec<usize> = (0..self.headers.len())
            .map(|col| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(col))
                    .map(|cell| cell.width())
                    .chain(std::iter::once(self.headers[col].width()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        let headers: Vec<String> = self.headers.iter().map(|h| h.to_string()).collect();
        out.push_str(&self.render_row(&headers, &widths));
        let rule_width = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        out.push_str(&format!("  {}\n", "-".repeat(rule_width)));
        for row in &self.rows {
            out.push_str(&self.render_row(row, &widths));
        }
        out
    }

    fn render_row(&self, cells: &[String], widths: &[usize]) -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths)
            .zip(&self.aligns)
            .map(|((cell, &width), align)| pad(cell, width, *align))
            .collect();
        format!("  {}\n", padded.join("  ").trim_end())
    }
}

/// Pad `cell` with spaces to `width` display columns.
fn pad(cell: &str, width: usize, align: Align) -> String {
    let fill = " ".repeat(width.saturating_sub(cell.width()));
    match align {
        Align::Left => format!("{}{}", cell, fill),
        Align::Right => format!("{}{}", fill, cell),
    }
}

/// Cut `s` to at most `max` display columns, ending in `…` when cut.
fn truncate_to_width(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    let budget = max.saturating_sub(1);
    let mut used = 0;
    let mut out = String::new();
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use history_core::models::{ArtistStats, DailyData, DateRange, TrackStats};

    fn sample() -> Summary {
        let mut summary = Summary::empty();
        summary.total_plays = 3;
        summary.total_time_ms = 150_000;
        summary.date_range = DateRange {
            start: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap(),
        };
        summary.artists = vec![ArtistStats {
            name: "X".to_string(),
            play_count: 3,
            total_time_ms: 150_000,
            track_count: 2,
            tracks: vec!["A".to_string(), "B".to_string()],
        }];
        summary.tracks = vec![
            TrackStats {
                name: "A".to_string(),
                artist: "X".to_string(),
                play_count: 2,
                total_time_ms: 120_000,
                average_time_ms: 60_000,
                album: None,
                spotify_uri: None,
            },
            TrackStats {
                name: "B".to_string(),
                artist: "X".to_string(),
                play_count: 1,
                total_time_ms: 30_000,
                average_time_ms: 30_000,
                album: None,
                spotify_uri: None,
            },
        ];
        summary.daily_data = vec![DailyData {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            play_count: 2,
            total_time_ms: 90_000,
            top_artist: Some("X".to_string()),
            top_track: None,
            unique_artists: 1,
            unique_tracks: 2,
        }];
        summary
    }

    // ── View ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_view_from_name() {
        assert_eq!(View::from_name("artists"), Some(View::Artists));
        assert_eq!(View::from_name("json"), Some(View::Json));
        assert_eq!(View::from_name("weekly"), None);
    }

    // ── views ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_render_summary_header() {
        let text = render_summary(&sample(), &Tz::UTC);
        assert!(text.contains("2024/01/01 to 2024/01/02"));
        assert!(text.contains("Plays:          3"));
        assert!(text.contains("Listening time: 2m"));
        assert!(text.contains("Top artists"));
    }

    #[test]
    fn test_render_summary_empty() {
        let text = render_summary(&Summary::empty(), &Tz::UTC);
        assert!(text.contains("No data"));
        assert!(!text.contains("Top artists"));
    }

    #[test]
    fn test_render_tracks_respects_limit() {
        let text = render_tracks(&sample(), 1);
        // header, rule, one row
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("1m 00s"));
    }

    #[test]
    fn test_render_artists_share() {
        let text = render_artists(&sample(), 10);
        assert!(text.contains("100.0%"));
    }

    #[test]
    fn test_render_daily_missing_top_track() {
        let text = render_daily(&sample());
        let row = text.lines().nth(2).unwrap();
        assert!(row.starts_with("  2024-01-01"));
        assert!(row.trim_end().ends_with('-'));
    }

    #[test]
    fn test_render_empty_table() {
        assert_eq!(render_monthly(&Summary::empty()), "  (no data)\n");
    }

    #[test]
    fn test_render_json_camel_case() {
        let json = render(&sample(), View::Json, 10, &Tz::UTC).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["totalPlays"], 3);
        assert_eq!(value["totalTimeMs"], 150_000);
        assert_eq!(value["artists"][0]["trackCount"], 2);
    }

    // ── alignment ─────────────────────────────────────────────────────────────

    #[test]
    fn test_wide_characters_align() {
        let mut table = TextTable::new(&[("Name", Align::Left), ("N", Align::Right)]);
        table.push(vec!["日本語".to_string(), "1".to_string()]);
        table.push(vec!["abc".to_string(), "22".to_string()]);
        let text = table.render();
        let widths: Vec<usize> = text.lines().skip(2).map(|l| l.width()).collect();
        assert_eq!(widths[0], widths[1]);
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("abcdefghij", 5), "abcd…");
        assert_eq!(truncate_to_width("日本語日本語", 5), "日本…");
    }
}
