//! Time utilities shared by the query compiler and the bucket timeline.

use crate::error::{Result, ServiceError};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

const MAX_STEP_SECONDS: u32 = 31 * 24 * 60 * 60;

/// Inclusive query window as sent to the execution backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start_time: String,
    pub end_time: String,
}

impl TimeRange {
    /// Validates both bounds and keeps the caller's original strings.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let start_at = parse_datetime(start).ok_or_else(|| {
            ServiceError::InvalidRequest(format!("invalid start time '{start}'"))
        })?;
        let end_at = parse_datetime(end)
            .ok_or_else(|| ServiceError::InvalidRequest(format!("invalid end time '{end}'")))?;

        if start_at > end_at {
            return Err(ServiceError::InvalidRequest(
                "time range start must be before end".to_string(),
            ));
        }

        Ok(Self {
            start_time: start.trim().to_string(),
            end_time: end.trim().to_string(),
        })
    }
}

/// Accepts RFC 3339 or `YYYY-MM-DD HH:MM:SS` (interpreted as UTC).
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc));
        }
    }
    None
}

pub fn parse_millis(value: &str) -> Option<i64> {
    parse_datetime(value).map(|dt| dt.timestamp_millis())
}

/// Canonical bucket label, e.g. `2025-01-01T00:00:00.000Z`.
pub fn format_bucket(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn format_bucket_millis(millis: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(millis).map(format_bucket)
}

/// Parses a step interval like `30s`, `5m`, `1h` or `1d`.
///
/// `auto` and the empty string yield `Ok(None)` so the caller can pick a width from the range.
pub fn parse_step_seconds(raw: &str) -> Result<Option<u32>> {
    let raw = raw.trim().to_lowercase();
    if raw.is_empty() || raw == "auto" {
        return Ok(None);
    }

    let unit = raw.chars().next_back().unwrap_or_default();
    let number_part = &raw[..raw.len() - unit.len_utf8()];
    let value = number_part.parse::<u32>().map_err(|_| {
        ServiceError::InvalidRequest(format!("step interval '{raw}' must look like 30s, 5m, 1h"))
    })?;

    if value == 0 {
        return Err(ServiceError::InvalidRequest(
            "step interval must be positive".into(),
        ));
    }

    let multiplier = match unit {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        'd' => 24 * 60 * 60,
        _ => {
            return Err(ServiceError::InvalidRequest(
                "step interval supports only s|m|h|d suffixes".into(),
            ))
        }
    };

    let seconds = value.saturating_mul(multiplier);
    if seconds > MAX_STEP_SECONDS {
        return Err(ServiceError::InvalidRequest(format!(
            "step interval must be between 1s and {}d",
            MAX_STEP_SECONDS / (24 * 60 * 60)
        )));
    }
    Ok(Some(seconds))
}
