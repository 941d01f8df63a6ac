use anyhow::Context;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Timelike, Utc};

/// Provider timestamps look like `2024-05-03 15:00:00`.
const PROVIDER_TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 24-hour `HH:MM` label used to line up price points and message counts.
pub fn hour_minute<T: Timelike>(t: &T) -> String {
    format!("{:02}:{:02}", t.hour(), t.minute())
}

/// Label for a stored UTC instant, rendered in the process's local zone.
pub fn local_hour_minute(ts: DateTime<Utc>) -> String {
    hour_minute(&ts.with_timezone(&Local))
}

pub fn parse_provider_timestamp(raw: &str) -> anyhow::Result<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, PROVIDER_TS_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M"))
        .with_context(|| format!("unrecognised provider timestamp: {raw}"))
}

/// `count` hourly instants ending at `now`, oldest first.
pub fn trailing_hours<Tz: TimeZone>(now: DateTime<Tz>, count: usize) -> Vec<DateTime<Tz>> {
    (0..count)
        .rev()
        .map(|i| now.clone() - chrono::Duration::hours(i as i64))
        .collect()
}
