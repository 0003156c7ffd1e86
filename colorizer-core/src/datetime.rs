use std::sync::OnceLock;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use regex::Regex;

use crate::ColorizerError;

/// List-view format, e.g. `6/20/2025, 6:23 PM`.
fn list_view_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(\d{1,2})/(\d{1,2})/(\d{4}),?\s(\d{1,2}):(\d{2})\s(AM|PM)")
            .expect("list-view date pattern compiles")
    })
}

const FALLBACK_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const FALLBACK_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Parse a last-modified cell into a local timestamp.
///
/// Text that is blank, unrecognized or names an impossible date yields `None`.
/// Failures are logged at debug level since most grids carry many non-date cells.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Local>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    match try_parse_timestamp(text) {
        Ok(timestamp) => Some(timestamp),
        Err(err) => {
            log::debug!("date parse failed: {err}");
            None
        }
    }
}

/// Strict variant of [`parse_timestamp`] that reports why parsing failed.
pub fn try_parse_timestamp(text: &str) -> Result<DateTime<Local>, ColorizerError> {
    let text = text.trim();

    if let Some(caps) = list_view_pattern().captures(text) {
        let number = |idx: usize| -> Result<u32, ColorizerError> {
            caps[idx]
                .parse::<u32>()
                .map_err(|_| ColorizerError::UnrecognizedDate(text.to_string()))
        };

        let month = number(1)?;
        let day = number(2)?;
        let year = caps[3]
            .parse::<i32>()
            .map_err(|_| ColorizerError::UnrecognizedDate(text.to_string()))?;
        let mut hour = number(4)?;
        let minute = number(5)?;
        let pm = caps[6].eq_ignore_ascii_case("PM");

        if pm && hour < 12 {
            hour += 12;
        }
        if !pm && hour == 12 {
            hour = 0;
        }

        let naive = NaiveDate::from_ymd_opt(year, month, day)
            .zip(NaiveTime::from_hms_opt(hour, minute, 0))
            .map(|(date, time)| date.and_time(time))
            .ok_or_else(|| ColorizerError::InvalidDate(text.to_string()))?;

        return to_local(naive).ok_or_else(|| ColorizerError::InvalidDate(text.to_string()));
    }

    parse_fallback(text).ok_or_else(|| ColorizerError::UnrecognizedDate(text.to_string()))
}

fn parse_fallback(text: &str) -> Option<DateTime<Local>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Local));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Local));
    }

    FALLBACK_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            FALLBACK_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .and_then(to_local)
}

/// Resolve a wall-clock time in the local zone. Times skipped by a DST jump
/// move forward by an hour, ambiguous ones take the earlier instant.
fn to_local(naive: NaiveDateTime) -> Option<DateTime<Local>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .or_else(|| Local.from_local_datetime(&(naive + Duration::hours(1))).earliest())
}

/// `true` when `modified` lies strictly before `now - max_age`.
pub fn is_stale(modified: DateTime<Local>, now: DateTime<Local>, max_age: Duration) -> bool {
    modified < now - max_age
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn fields(dt: DateTime<Local>) -> (i32, u32, u32, u32, u32) {
        (dt.year(), dt.month(), dt.day(), dt.hour(), dt.minute())
    }

    #[test]
    fn parses_list_view_format() {
        let dt = parse_timestamp("6/20/2025, 6:23 PM").expect("parsed");
        assert_eq!(fields(dt), (2025, 6, 20, 18, 23));
        assert_eq!(dt.second(), 0);
    }

    #[test]
    fn converts_meridiem_edges() {
        let midnight = parse_timestamp("12/1/2025, 12:00 AM").expect("midnight");
        assert_eq!(fields(midnight), (2025, 12, 1, 0, 0));

        let noon = parse_timestamp("12/1/2025, 12:00 PM").expect("noon");
        assert_eq!(fields(noon), (2025, 12, 1, 12, 0));

        let morning = parse_timestamp("1/5/2024, 9:05 am").expect("lowercase meridiem");
        assert_eq!(fields(morning), (2024, 1, 5, 9, 5));
    }

    #[test]
    fn tolerates_missing_comma_and_surrounding_text() {
        let dt = parse_timestamp("Modified 3/14/2025 1:59 PM by Jane").expect("embedded");
        assert_eq!(fields(dt), (2025, 3, 14, 13, 59));
    }

    #[test]
    fn rejects_impossible_dates() {
        assert!(parse_timestamp("13/1/2025, 1:00 PM").is_none());
        assert!(parse_timestamp("2/30/2025, 1:00 PM").is_none());
        assert!(matches!(
            try_parse_timestamp("2/30/2025, 1:00 PM"),
            Err(ColorizerError::InvalidDate(_))
        ));
    }

    #[test]
    fn falls_back_to_generic_formats() {
        let iso = parse_timestamp("2025-06-20 18:23").expect("iso-like");
        assert_eq!(fields(iso), (2025, 6, 20, 18, 23));

        let date_only = parse_timestamp("06/20/2025").expect("date only");
        assert_eq!(fields(date_only), (2025, 6, 20, 0, 0));

        assert!(parse_timestamp("2025-06-20T18:23:00Z").is_some());
    }

    #[test]
    fn blank_and_garbage_are_none() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("   ").is_none());
        assert!(parse_timestamp("Acme Corp").is_none());
        assert!(matches!(
            try_parse_timestamp("yesterday"),
            Err(ColorizerError::UnrecognizedDate(_))
        ));
    }

    #[test]
    fn staleness_is_strict() {
        let now = parse_timestamp("6/21/2025, 6:23 PM").expect("now");
        let day = Duration::hours(24);
        assert!(!is_stale(now - day, now, day));
        assert!(is_stale(now - day - Duration::minutes(1), now, day));
        assert!(!is_stale(now - day + Duration::minutes(1), now, day));
    }
}
