use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

/// Resolve a timezone setting into a [`Tz`].
///
/// `"auto"` means the system timezone. Unrecognised names fall back to UTC
/// with a warning.
pub fn resolve_timezone(name: &str) -> Tz {
    let name = if name.eq_ignore_ascii_case("auto") {
        get_system_timezone()
    } else {
        name.to_string()
    };

    name.parse::<Tz>().unwrap_or_else(|_| {
        warn!("unrecognised timezone \"{}\", falling back to UTC", name);
        Tz::UTC
    })
}

/// Validate that `tz_name` is a recognised IANA timezone identifier.
pub fn validate_timezone(tz_name: &str) -> bool {
    tz_name.parse::<Tz>().is_ok()
}

// ── Timestamp parsing ─────────────────────────────────────────────────────────

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d"];

/// Parse an export timestamp into a UTC [`DateTime`].
///
/// Accepts RFC 3339 (with `Z` or a numeric offset), RFC 2822, and a few
/// naive date-time / date patterns which are read as UTC. Returns `None` for
/// empty or unrecognised input.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            let naive = date.and_hms_opt(0, 0, 0)?;
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    debug!("could not parse timestamp \"{}\"", s);
    None
}

// ── Calendar keys ─────────────────────────────────────────────────────────────

/// Calendar day of `dt` as seen in `tz`.
pub fn local_date(dt: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    dt.with_timezone(tz).date_naive()
}

/// `(year, month)` of a calendar day.
pub fn month_key(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_rfc3339_z_suffix() {
        let dt = parse_timestamp("2024-08-25T15:06:49Z").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 8, 25, 15, 6, 49).unwrap());
    }

    #[test]
    fn test_parse_rfc3339_offset() {
        let dt = parse_timestamp("2024-08-25T15:06:49+09:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 8, 25, 6, 6, 49).unwrap());
    }

    #[test]
    fn test_parse_fractional_seconds() {
        let dt = parse_timestamp("2024-08-25T15:06:49.250Z").unwrap();
        assert_eq!(dt.nanosecond(), 250_000_000);
    }

    #[test]
    fn test_parse_naive_datetime_as_utc() {
        let dt = parse_timestamp("2024-08-25 15:06:49").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 8, 25, 15, 6, 49).unwrap());
    }

    #[test]
    fn test_parse_date_only() {
        let dt = parse_timestamp("2024-08-25").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 8, 25, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_rfc2822() {
        let dt = parse_timestamp("Sun, 25 Aug 2024 15:06:49 +0000").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 8, 25, 15, 6, 49).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("   ").is_none());
        assert!(parse_timestamp("not-a-date").is_none());
        assert!(parse_timestamp("2024-13-45T99:00:00Z").is_none());
    }

    #[test]
    fn test_resolve_timezone_known() {
        assert_eq!(resolve_timezone("Asia/Tokyo"), Tz::Asia__Tokyo);
        assert_eq!(resolve_timezone("UTC"), Tz::UTC);
    }

    #[test]
    fn test_resolve_timezone_unknown_falls_back_to_utc() {
        assert_eq!(resolve_timezone("Mars/Olympus_Mons"), Tz::UTC);
    }

    #[test]
    fn test_validate_timezone() {
        assert!(validate_timezone("Europe/Berlin"));
        assert!(!validate_timezone("Not/AZone"));
    }

    #[test]
    fn test_local_date_crosses_midnight() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap();
        assert_eq!(
            local_date(dt, &Tz::UTC),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert_eq!(
            local_date(dt, &Tz::Asia__Tokyo),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
    }

    #[test]
    fn test_month_key() {
        let date = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        assert_eq!(month_key(date), (2023, 12));
    }
}
