//! Duration parsing and time formatting.

use chrono::{Local, NaiveTime, TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;

static RE_DURATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:(\d+)m)?(?:(\d+)s)?$").expect("valid duration regex"));

/// Parses a duration into seconds.
///
/// Accepts `25` (minutes), `25m`, `90s` and `10m30s`. Returns `None` for
/// anything else, including the empty string.
pub fn parse_duration(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
        return raw.parse::<i64>().ok()?.checked_mul(60);
    }

    let captures = RE_DURATION.captures(raw)?;
    let minutes = captures.get(1);
    let seconds = captures.get(2);
    if minutes.is_none() && seconds.is_none() {
        return None;
    }

    let minutes: i64 = match minutes {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    let seconds: i64 = match seconds {
        Some(s) => s.as_str().parse().ok()?,
        None => 0,
    };
    minutes.checked_mul(60)?.checked_add(seconds)
}

/// Formats seconds as `MM:SS`. Minutes are not wrapped into hours.
pub fn format_mmss(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Formats a unix timestamp as local `YYYY-MM-DD HH:MM`.
pub fn format_datetime(unix_ts: i64) -> String {
    match Local.timestamp_opt(unix_ts, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => unix_ts.to_string(),
    }
}

/// Unix timestamp of local midnight on the day containing `now`.
pub fn start_of_day(now: i64) -> i64 {
    let Some(local) = Local.timestamp_opt(now, 0).single() else {
        return now;
    };
    local
        .date_naive()
        .and_time(NaiveTime::MIN)
        .and_local_timezone(Local)
        .earliest()
        .map(|midnight| midnight.timestamp())
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_number_is_minutes() {
        assert_eq!(parse_duration("25"), Some(1500));
    }

    #[test]
    fn parses_unit_suffixes() {
        assert_eq!(parse_duration("25m"), Some(1500));
        assert_eq!(parse_duration("90s"), Some(90));
        assert_eq!(parse_duration("10m30s"), Some(630));
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("m"), None);
        assert_eq!(parse_duration("1h"), None);
        assert_eq!(parse_duration("30s10m"), None);
        assert_eq!(parse_duration("-5"), None);
    }

    #[test]
    fn zero_parses_and_is_left_to_the_engine() {
        assert_eq!(parse_duration("0"), Some(0));
        assert_eq!(parse_duration("0m0s"), Some(0));
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_mmss(0), "00:00");
        assert_eq!(format_mmss(630), "10:30");
        assert_eq!(format_mmss(6000), "100:00");
        assert_eq!(format_mmss(-3), "00:00");
    }

    #[test]
    fn start_of_day_is_not_after_now() {
        let now = 1_760_000_000;
        let midnight = start_of_day(now);
        assert!(midnight <= now);
        assert!(now - midnight < 25 * 3600);
    }
}
