use chrono_tz::Tz;

use crate::models::DateRange;

/// Format a count with thousands separators.
///
/// # Examples
///
/// ```
/// use history_core::formatting::format_count;
///
/// assert_eq!(format_count(0), "0");
/// assert_eq!(format_count(1234), "1,234");
/// assert_eq!(format_count(1234567), "1,234,567");
/// ```
pub fn format_count(value: u64) -> String {
    group_thousands(&value.to_string())
}

/// Format a played duration as hours and minutes.
///
/// * `0` → `"0m"`
/// * under an hour → `"45m"`
/// * otherwise → `"2h 05m"`
///
/// Seconds are truncated, not rounded.
///
/// # Examples
///
/// ```
/// use history_core::formatting::format_hours_minutes;
///
/// assert_eq!(format_hours_minutes(0), "0m");
/// assert_eq!(format_hours_minutes(45 * 60_000), "45m");
/// assert_eq!(format_hours_minutes(125 * 60_000 + 59_999), "2h 05m");
/// ```
pub fn format_hours_minutes(ms: u64) -> String {
    let total_minutes = ms / 60_000;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours == 0 {
        format!("{}m", minutes)
    } else {
        format!("{}h {:02}m", format_count(hours), minutes)
    }
}

/// Format a played duration as minutes and seconds.
///
/// # Examples
///
/// ```
/// use history_core::formatting::format_minutes_seconds;
///
/// assert_eq!(format_minutes_seconds(0), "0s");
/// assert_eq!(format_minutes_seconds(42_000), "42s");
/// assert_eq!(format_minutes_seconds(187_500), "3m 07s");
/// ```
pub fn format_minutes_seconds(ms: u64) -> String {
    let total_seconds = ms / 1_000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;

    if minutes == 0 {
        format!("{}s", seconds)
    } else {
        format!("{}m {:02}s", minutes, seconds)
    }
}

/// Render a summary date range as calendar days in `tz`.
///
/// The empty-summary sentinel renders as `"No data"`; a range that starts and
/// ends on the same day renders as that single day.
pub fn format_date_range(range: &DateRange, tz: &Tz) -> String {
    if range.is_sentinel() {
        return "No data".to_string();
    }

    let start = range.start.with_timezone(tz).format("%Y/%m/%d").to_string();
    let end = range.end.with_timezone(tz).format("%Y/%m/%d").to_string();

    if start == end {
        start
    } else {
        format!("{} to {}", start, end)
    }
}

/// Calculate `(part / whole) * 100`, rounded to `decimal_places`.
///
/// Returns `0.0` if `whole` is zero.
pub fn percentage(part: u64, whole: u64, decimal_places: u32) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    let raw = (part as f64 / whole as f64) * 100.0;
    let factor = 10_f64.powi(decimal_places as i32);
    (raw * factor).round() / factor
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_format_count_small() {
        assert_eq!(format_count(5), "5");
        assert_eq!(format_count(999), "999");
    }

    #[test]
    fn test_format_count_exact_thousands() {
        assert_eq!(format_count(1_000), "1,000");
        assert_eq!(format_count(1_000_000), "1,000,000");
    }

    #[test]
    fn test_format_hours_minutes_under_a_minute() {
        assert_eq!(format_hours_minutes(59_999), "0m");
    }

    #[test]
    fn test_format_hours_minutes_exact_hour() {
        assert_eq!(format_hours_minutes(60 * 60_000), "1h 00m");
    }

    #[test]
    fn test_format_hours_minutes_large() {
        assert_eq!(format_hours_minutes(1_500 * 60 * 60_000), "1,500h 00m");
    }

    #[test]
    fn test_format_minutes_seconds_exact_minute() {
        assert_eq!(format_minutes_seconds(60_000), "1m 00s");
    }

    #[test]
    fn test_format_minutes_seconds_truncates_millis() {
        assert_eq!(format_minutes_seconds(999), "0s");
        assert_eq!(format_minutes_seconds(61_999), "1m 01s");
    }

    #[test]
    fn test_format_date_range_sentinel() {
        assert_eq!(format_date_range(&DateRange::sentinel(), &Tz::UTC), "No data");
    }

    #[test]
    fn test_format_date_range_same_day() {
        let range = DateRange {
            start: Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 1, 1, 22, 0, 0).unwrap(),
        };
        assert_eq!(format_date_range(&range, &Tz::UTC), "2024/01/01");
    }

    #[test]
    fn test_format_date_range_span_in_timezone() {
        let range = DateRange {
            start: Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 1, 1, 22, 0, 0).unwrap(),
        };
        assert_eq!(
            format_date_range(&range, &Tz::Asia__Tokyo),
            "2024/01/01 to 2024/01/02"
        );
    }

    #[test]
    fn test_percentage_basic() {
        let p = percentage(50, 200, 1);
        assert!((p - 25.0).abs() < 1e-9, "percentage = {p}");
    }

    #[test]
    fn test_percentage_zero_whole() {
        assert_eq!(percentage(10, 0, 2), 0.0);
    }

    #[test]
    fn test_percentage_rounding() {
        let p = percentage(1, 3, 2);
        assert!((p - 33.33).abs() < 1e-9, "percentage = {p}");
    }
}
