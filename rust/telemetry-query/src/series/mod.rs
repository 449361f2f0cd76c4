//! Normalization of backend time series into dense, chart-ready rows.

mod incomplete;
mod timeline;

pub use incomplete::{mark_incomplete, ChartRow, MarkedSeries, INCOMPLETE_SUFFIX};
pub use timeline::{
    build_bucket_timeline, compute_bucket_seconds, fill_points, infer_bucket_millis,
    zero_record, DEFAULT_TARGET_POINTS, FALLBACK_BUCKET_SECONDS, MAX_TIMELINE_BUCKETS,
};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One aggregated bucket as returned by the execution backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketPoint {
    /// Bucket start as an ISO-8601 timestamp.
    pub bucket: String,
    #[serde(default)]
    pub series: BTreeMap<String, f64>,
}

impl BucketPoint {
    pub fn new(bucket: impl Into<String>, series: BTreeMap<String, f64>) -> Self {
        Self {
            bucket: bucket.into(),
            series,
        }
    }
}
