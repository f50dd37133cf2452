use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::{Result, SignozError};

pub const SEARCH_WINDOW: Duration = Duration::from_secs(30 * 60);
pub const AGGREGATE_WINDOW: Duration = Duration::from_secs(60 * 60);
pub const SERVICES_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Half-open `[start, end)` window in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl TimeRange {
    pub fn new(start_ms: i64, end_ms: i64) -> Self {
        Self { start_ms, end_ms }
    }

    /// Caller-supplied Unix seconds; bounds that do not fit in epoch
    /// milliseconds are rejected.
    pub fn from_unix_secs(start: i64, end: i64) -> Result<Self> {
        Ok(Self::new(secs_to_millis(start)?, secs_to_millis(end)?))
    }

    /// The `span` ending at `now`.
    pub fn trailing(now: DateTime<Utc>, span: Duration) -> Self {
        let end = now.timestamp_millis();
        Self::new(end - span.as_millis() as i64, end)
    }

    /// Caller bounds where given; a missing start falls back to `now - span`
    /// and a missing end to `now`.
    pub fn resolve(
        start_unix: Option<i64>,
        end_unix: Option<i64>,
        span: Duration,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let fallback = Self::trailing(now, span);
        Ok(Self::new(
            start_unix.map_or(Ok(fallback.start_ms), secs_to_millis)?,
            end_unix.map_or(Ok(fallback.end_ms), secs_to_millis)?,
        ))
    }

    /// The hour ending at the second containing `latest_ms`.
    pub fn hour_ending_at(latest_ms: i64) -> Self {
        let end_ms = latest_ms - latest_ms.rem_euclid(1000);
        Self::new(end_ms - 3_600_000, end_ms)
    }
}

fn secs_to_millis(secs: i64) -> Result<i64> {
    secs.checked_mul(1000)
        .ok_or_else(|| SignozError::InvalidArgument(format!("time {secs} is out of range")))
}

/// Whole-second hour window ending at `now`.
pub fn last_hour(now: DateTime<Utc>) -> TimeRange {
    TimeRange::hour_ending_at(now.timestamp_millis())
}

/// Parses a backend timestamp: RFC3339 text, or epoch milliseconds.
pub fn parse_backend_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
            .or_else(|| s.parse::<i64>().ok().and_then(DateTime::from_timestamp_millis)),
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

/// Parses a CLI time flag: an RFC3339 timestamp, or a duration such as
/// `15m` counted back from `now`.
pub fn parse_cli_time(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(ts.with_timezone(&Utc));
    }

    let ago = humantime::parse_duration(input)
        .map_err(|e| SignozError::Parse(format!("'{input}' is neither RFC3339 nor a duration: {e}")))?;
    chrono::Duration::from_std(ago)
        .ok()
        .and_then(|ago| now.checked_sub_signed(ago))
        .ok_or_else(|| SignozError::Parse(format!("'{input}' reaches before the supported range")))
}
