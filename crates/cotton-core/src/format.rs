//! Display formatting for timestamps.

use chrono::{DateTime, Datelike, Utc};

/// Timestamp truncated to minute granularity (minutes since the Unix epoch).
pub fn minute_key(timestamp: DateTime<Utc>) -> i64 {
    timestamp.timestamp().div_euclid(60)
}

/// Render a minute key as `YYYY-MM-DD-HH-mm`.
pub fn format_minute_key(key: i64) -> String {
    DateTime::from_timestamp(key.saturating_mul(60), 0).map_or_else(
        || key.to_string(),
        |date_time| date_time.format("%Y-%m-%d-%H-%M").to_string(),
    )
}

/// Compact "time ago" label for timeline entries.
pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

/// Date label for conversation lists.
///
/// Time of day for today, month and day within the current year, the full
/// date otherwise.
pub fn format_date_based_on_year(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    if timestamp.date_naive() == now.date_naive() {
        timestamp.format("%H:%M").to_string()
    } else if timestamp.year() == now.year() {
        timestamp.format("%b %-d").to_string()
    } else {
        timestamp.format("%Y. %-m. %-d.").to_string()
    }
}

/// Wall-clock time of a message inside a run.
pub fn format_message_time(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn minute_key_truncates_seconds() {
        let first = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 1).unwrap();
        let second = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 59).unwrap();
        let next = Utc.with_ymd_and_hms(2024, 5, 1, 10, 1, 0).unwrap();
        assert_eq!(minute_key(first), minute_key(second));
        assert_ne!(minute_key(second), minute_key(next));
    }

    #[test]
    fn minute_key_distinguishes_morning_and_evening() {
        let morning = Utc.with_ymd_and_hms(2024, 5, 1, 10, 5, 0).unwrap();
        let evening = Utc.with_ymd_and_hms(2024, 5, 1, 22, 5, 0).unwrap();
        assert_ne!(minute_key(morning), minute_key(evening));
    }

    #[test]
    fn minute_key_formats_as_date() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 22, 5, 30).unwrap();
        assert_eq!(format_minute_key(minute_key(at)), "2024-05-01-22-05");
    }

    #[test]
    fn format_relative_time_units() {
        let now = 10_000_000_000;
        assert_eq!(format_relative_time(now - 30_000, now), "just now");
        assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
        assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
        assert_eq!(format_relative_time(now - 3 * 24 * 60 * 60_000, now), "3d ago");
    }

    #[test]
    fn date_label_depends_on_year() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 18, 0, 0).unwrap();
        let today = Utc.with_ymd_and_hms(2024, 5, 1, 9, 7, 0).unwrap();
        let this_year = Utc.with_ymd_and_hms(2024, 2, 3, 9, 7, 0).unwrap();
        let last_year = Utc.with_ymd_and_hms(2023, 12, 24, 9, 7, 0).unwrap();

        assert_eq!(format_date_based_on_year(today, now), "09:07");
        assert_eq!(format_date_based_on_year(this_year, now), "Feb 3");
        assert_eq!(format_date_based_on_year(last_year, now), "2023. 12. 24.");
    }
}
