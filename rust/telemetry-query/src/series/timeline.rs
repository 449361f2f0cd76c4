use super::BucketPoint;
use crate::time::{format_bucket, format_bucket_millis, parse_datetime, parse_millis};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

pub const DEFAULT_TARGET_POINTS: u32 = 150;
pub const FALLBACK_BUCKET_SECONDS: u32 = 60;
pub const MAX_TIMELINE_BUCKETS: usize = 10_000;

const DAY: u32 = 24 * 60 * 60;

/// Widths a chart bucket may take, ascending.
const BUCKET_LADDER: &[u32] = &[
    1,
    5,
    10,
    15,
    30,
    60,
    5 * 60,
    10 * 60,
    15 * 60,
    30 * 60,
    60 * 60,
    3 * 60 * 60,
    6 * 60 * 60,
    12 * 60 * 60,
    DAY,
    2 * DAY,
    7 * DAY,
    30 * DAY,
];

/// Picks a bucket width so that `[start, end]` renders as roughly `target_points` buckets.
///
/// The width never shrinks as the range grows. Missing or unparsable bounds fall back to
/// [`FALLBACK_BUCKET_SECONDS`]; an empty range gets the narrowest rung.
pub fn compute_bucket_seconds(start: Option<&str>, end: Option<&str>, target_points: u32) -> u32 {
    let (Some(start_ms), Some(end_ms)) = (start.and_then(parse_millis), end.and_then(parse_millis))
    else {
        debug!(?start, ?end, "bucket width falls back for unparsable range");
        return FALLBACK_BUCKET_SECONDS;
    };

    let range_ms = end_ms - start_ms;
    if range_ms <= 0 {
        return BUCKET_LADDER[0];
    }

    let target = i64::from(target_points.max(1));
    let range_secs = (range_ms + 999) / 1000;
    let raw = (range_secs + target - 1) / target;
    ladder_width(raw)
}

fn ladder_width(raw_seconds: i64) -> u32 {
    if let Some(width) = BUCKET_LADDER
        .iter()
        .copied()
        .find(|width| i64::from(*width) >= raw_seconds)
    {
        return width;
    }

    let top = i64::from(BUCKET_LADDER[BUCKET_LADDER.len() - 1]);
    let steps = (raw_seconds + top - 1) / top;
    u32::try_from(steps.saturating_mul(top)).unwrap_or(u32::MAX)
}

/// Epoch-aligned bucket starts from the bucket containing `start` through the one containing
/// `end`. Returns an empty timeline for unusable input.
pub fn build_bucket_timeline(start: &str, end: &str, bucket_seconds: u32) -> Vec<String> {
    if bucket_seconds == 0 {
        return Vec::new();
    }
    let (Some(start_ms), Some(end_ms)) = (parse_millis(start), parse_millis(end)) else {
        return Vec::new();
    };
    if end_ms <= start_ms {
        return Vec::new();
    }

    let width = i64::from(bucket_seconds) * 1000;
    let first = start_ms.div_euclid(width) * width;
    let last = end_ms.div_euclid(width) * width;
    let count = (last - first) / width + 1;

    if count > MAX_TIMELINE_BUCKETS as i64 {
        warn!(
            count,
            bucket_seconds, "bucket timeline too dense, falling back to sparse points"
        );
        return Vec::new();
    }

    (0..count)
        .filter_map(|idx| format_bucket_millis(first + idx * width))
        .collect()
}

/// Record with every key set to zero, used for buckets the backend returned nothing for.
pub fn zero_record<I, S>(keys: I) -> BTreeMap<String, f64>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    keys.into_iter().map(|key| (key.into(), 0.0)).collect()
}

/// Left-joins sparse backend points onto a dense timeline.
///
/// Matched buckets keep their values (keys missing from the point default to `zero`);
/// unmatched buckets get `zero`. With an empty timeline the raw points are returned sorted by
/// bucket.
pub fn fill_points(
    points: &[BucketPoint],
    timeline: &[String],
    zero: &BTreeMap<String, f64>,
) -> Vec<BucketPoint> {
    if timeline.is_empty() {
        let mut sorted = points.to_vec();
        sorted.sort_by(|a, b| a.bucket.cmp(&b.bucket));
        return sorted;
    }

    let mut by_bucket: HashMap<String, &BucketPoint> = HashMap::with_capacity(points.len());
    for point in points {
        by_bucket
            .entry(canonical_bucket(&point.bucket))
            .or_insert(point);
    }

    timeline
        .iter()
        .map(|slot| {
            let mut series = zero.clone();
            if let Some(point) = by_bucket.get(slot) {
                series.extend(point.series.iter().map(|(k, v)| (k.clone(), *v)));
            }
            BucketPoint {
                bucket: slot.clone(),
                series,
            }
        })
        .collect()
}

/// Bucket width in milliseconds from the first two points, if both parse and are ordered.
pub fn infer_bucket_millis(points: &[BucketPoint]) -> Option<i64> {
    let [first, second, ..] = points else {
        return None;
    };
    let width = parse_millis(&second.bucket)? - parse_millis(&first.bucket)?;
    (width > 0).then_some(width)
}

fn canonical_bucket(raw: &str) -> String {
    parse_datetime(raw)
        .map(format_bucket)
        .unwrap_or_else(|| raw.to_string())
}
