use super::{infer_bucket_millis, BucketPoint};
use crate::time::parse_millis;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

pub const INCOMPLETE_SUFFIX: &str = "_incomplete";

/// Chart row where a value may be absent so the renderer draws a gap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRow {
    pub bucket: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, Option<f64>>,
}

impl From<&BucketPoint> for ChartRow {
    fn from(point: &BucketPoint) -> Self {
        Self {
            bucket: point.bucket.clone(),
            values: point
                .series
                .iter()
                .map(|(key, value)| (key.clone(), Some(*value)))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkedSeries {
    pub rows: Vec<ChartRow>,
    pub has_incomplete: bool,
}

/// Moves the still-accumulating tail of a dense series into parallel `<key>_incomplete`
/// columns so it can be drawn dashed.
///
/// A bucket is incomplete when `start + width > now`; it and every later bucket form the tail.
/// The last complete row (the bridge) carries its value in both columns so the two lines join.
/// Series with fewer than two parsable buckets, or no open bucket, come back unchanged.
pub fn mark_incomplete(points: &[BucketPoint], keys: &[String], now: DateTime<Utc>) -> MarkedSeries {
    let unchanged = || MarkedSeries {
        rows: points.iter().map(ChartRow::from).collect(),
        has_incomplete: false,
    };

    let Some(width) = infer_bucket_millis(points) else {
        debug!(points = points.len(), "cannot infer bucket width, leaving series as is");
        return unchanged();
    };

    let now_ms = now.timestamp_millis();
    let Some(first_open) = points.iter().position(|point| {
        parse_millis(&point.bucket).is_some_and(|start| start.saturating_add(width) > now_ms)
    }) else {
        return unchanged();
    };

    let rows = points
        .iter()
        .enumerate()
        .map(|(idx, point)| {
            let mut row = ChartRow::from(point);
            for key in keys {
                let original = point.series.get(key).copied();
                let incomplete_key = format!("{key}{INCOMPLETE_SUFFIX}");

                if idx >= first_open {
                    row.values.insert(key.clone(), None);
                    row.values.insert(incomplete_key, original);
                } else if idx + 1 == first_open {
                    row.values.insert(incomplete_key, original);
                } else {
                    row.values.insert(incomplete_key, None);
                }
            }
            row
        })
        .collect();

    MarkedSeries {
        rows,
        has_incomplete: true,
    }
}
