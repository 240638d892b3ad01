//! Canonical timestamp text.
//!
//! Every timestamp column holds `YYYY-MM-DDTHH:MM:SS.mmmZ` so that plain
//! string comparison in SQL orders rows chronologically.

use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Timelike, Utc};

pub fn format(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn now() -> String {
    format(Utc::now())
}

/// Smallest whole millisecond not earlier than `ts`. [`format`] truncates,
/// which is wrong for an inclusive lower bound.
pub fn round_up_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    let sub_milli = ts.nanosecond() % 1_000_000;
    if sub_milli == 0 {
        ts
    } else {
        ts + Duration::nanoseconds(i64::from(1_000_000 - sub_milli))
    }
}

/// A user-supplied instant, either a calendar date or a full datetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instant {
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
}

impl Instant {
    /// Accepts `YYYY-MM-DD` or an RFC 3339 datetime with offset.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(Instant::Date(date));
        }
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| Instant::DateTime(dt.with_timezone(&Utc)))
    }

    /// Midnight UTC for dates, the instant itself otherwise.
    pub fn start(&self) -> DateTime<Utc> {
        match self {
            Instant::Date(date) => date.and_time(chrono::NaiveTime::MIN).and_utc(),
            Instant::DateTime(dt) => *dt,
        }
    }
}
