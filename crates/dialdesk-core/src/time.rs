use chrono::{DateTime, Local, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

/// Layout Asterisk writes `calldate` in. Text in this layout sorts
/// chronologically, which the source queries rely on.
pub const SOURCE_CALLDATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Error)]
pub enum TimeParseError {
    #[error("timestamp cannot be empty")]
    Empty,
    #[error("invalid date")]
    InvalidDate,
    #[error("invalid datetime format: expected YYYY-MM-DD or YYYY-MM-DD HH:MM[:SS]")]
    InvalidDateTime,
    #[error("local time does not exist: {0}")]
    NonexistentLocalTime(String),
}

/// Which end of a day a date-only input resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayEdge {
    Start,
    End,
}

pub fn now_utc() -> i64 {
    Utc::now().timestamp()
}

pub fn days_before(now_utc: i64, days: i64) -> i64 {
    now_utc.saturating_sub(days.saturating_mul(SECONDS_PER_DAY))
}

/// Parses `YYYY-MM-DD` or a local date-time into unix seconds. Date-only
/// input resolves to the first or last second of that day.
pub fn parse_local_timestamp(input: &str, edge: DayEdge) -> Result<i64, TimeParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(TimeParseError::Empty);
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        let naive = match edge {
            DayEdge::Start => date.and_hms_opt(0, 0, 0),
            DayEdge::End => date.and_hms_opt(23, 59, 59),
        }
        .ok_or(TimeParseError::InvalidDate)?;
        return local_to_utc_timestamp(naive);
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return local_to_utc_timestamp(dt);
        }
    }

    Err(TimeParseError::InvalidDateTime)
}

/// Parses a switch `calldate`, written in the switch's local time.
pub fn parse_source_calldate(input: &str) -> Result<i64, TimeParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(TimeParseError::Empty);
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return local_to_utc_timestamp(dt);
        }
    }
    Err(TimeParseError::InvalidDateTime)
}

pub fn format_source_calldate(ts: i64) -> String {
    to_local(ts).format(SOURCE_CALLDATE_FORMAT).to_string()
}

pub fn format_timestamp_datetime(ts: i64) -> String {
    to_local(ts).format("%Y-%m-%d %H:%M").to_string()
}

pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

fn to_local(ts: i64) -> DateTime<Local> {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
        .with_timezone(&Local)
}

// On a DST fold the earlier instant wins so repeated wall-clock times keep
// their source order.
fn local_to_utc_timestamp(naive: NaiveDateTime) -> Result<i64, TimeParseError> {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(local) => Ok(local.with_timezone(&Utc).timestamp()),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc).timestamp()),
        LocalResult::None => Err(TimeParseError::NonexistentLocalTime(naive.to_string())),
    }
}
