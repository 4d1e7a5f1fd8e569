use anyhow::Context;
use chrono::{DateTime, TimeDelta, Utc};

const PUBLISH_TIME_FORMAT: &str = "%d %b %Y, %I:%M %p";

/// Daily-history range requested from the provider, ending at `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

pub fn history_window(now: DateTime<Utc>, days: i64) -> anyhow::Result<HistoryWindow> {
    anyhow::ensure!(days >= 1, "history window must span at least one day (got {days})");
    let span = TimeDelta::try_days(days)
        .with_context(|| format!("history window of {days} days is out of range"))?;
    let start = now
        .checked_sub_signed(span)
        .with_context(|| format!("history window of {days} days reaches before the earliest date"))?;
    Ok(HistoryWindow { start, end: now })
}

/// `None` when the epoch seconds are out of range.
pub fn publish_time(unix_secs: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(unix_secs, 0)
}

pub fn format_publish_time(published_at: &DateTime<Utc>) -> String {
    published_at.format(PUBLISH_TIME_FORMAT).to_string()
}
