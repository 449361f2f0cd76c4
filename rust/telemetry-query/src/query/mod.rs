//! Per-source validation and compilation of chart queries, plus the engine that hands compiled
//! queries to the execution backend and normalizes what comes back.

mod draft;
mod logs;
mod metrics;
mod traces;

pub use draft::{draft_name, AddOns, OrderDirection, QueryDraft};
pub use logs::{LogBreakdown, LogFilters, LogGroupBy, LogMetric, LogTimeseries};
pub use metrics::{
    MetricAggregation, MetricBreakdown, MetricFilters, MetricGroupBy, MetricTimeseries, MetricType,
};
pub use traces::{TraceBreakdown, TraceFilters, TraceGroupBy, TraceMetric, TraceTimeseries};

use crate::{
    backend::ExecutionBackend,
    config::AppConfig,
    error::{Result, ServiceError},
    filters::FilterBag,
    series::{build_bucket_timeline, fill_points, mark_incomplete, zero_record, BucketPoint, ChartRow},
    time::TimeRange,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt, sync::Arc};
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Traces,
    Logs,
    Metrics,
}

impl DataSource {
    pub fn as_str(self) -> &'static str {
        match self {
            DataSource::Traces => "traces",
            DataSource::Logs => "logs",
            DataSource::Metrics => "metrics",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied group-by after normalization: absent, explicitly `none`, or a name.
#[derive(Debug, Clone, PartialEq, Eq)]
enum GroupByChoice {
    Unset,
    Disabled,
    Named(String),
}

impl GroupByChoice {
    fn from_input(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return GroupByChoice::Unset;
        };
        let normalized = raw.trim().to_lowercase();
        match normalized.as_str() {
            "" => GroupByChoice::Unset,
            "none" => GroupByChoice::Disabled,
            _ => GroupByChoice::Named(normalized),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("Unknown trace metric: {0}")]
    UnknownTraceMetric(String),

    #[error("Unknown log metric: {0}")]
    UnknownLogMetric(String),

    #[error("Unknown metrics aggregation: {0}")]
    UnknownMetricAggregation(String),

    #[error("Metrics breakdown does not support aggregation: {0}")]
    UnsupportedBreakdownAggregation(String),

    #[error("Unsupported {data_source} groupBy: {group_by}")]
    UnsupportedGroupBy {
        data_source: DataSource,
        group_by: String,
    },

    #[error("{data_source} breakdown requires groupBy")]
    MissingGroupBy { data_source: DataSource },

    #[error("Metrics queries require filters.metricName")]
    MissingMetricName,

    #[error("Metrics queries require filters.metricType")]
    MissingMetricType,

    #[error("Unknown metric type: {0}")]
    UnknownMetricType(String),

    #[error("bucketSeconds must be positive")]
    InvalidBucketSeconds,

    #[error("limit must be positive")]
    InvalidLimit,
}

impl From<BuildError> for ServiceError {
    fn from(err: BuildError) -> Self {
        ServiceError::InvalidRequest(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeseriesInput {
    pub source: DataSource,
    pub metric: String,
    #[serde(default)]
    pub group_by: Option<String>,
    #[serde(default)]
    pub filters: FilterBag,
    pub bucket_seconds: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownInput {
    pub source: DataSource,
    pub metric: String,
    #[serde(default)]
    pub group_by: Option<String>,
    #[serde(default)]
    pub filters: FilterBag,
    pub limit: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    #[default]
    Timeseries,
    Breakdown,
}

/// Compiled, source-scoped query. Serializes flat as
/// `{kind, source, metric, groupBy?, filters, bucketSeconds | limit}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuerySpec {
    Timeseries(TimeseriesSpec),
    Breakdown(BreakdownSpec),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum TimeseriesSpec {
    Traces(TraceTimeseries),
    Logs(LogTimeseries),
    Metrics(MetricTimeseries),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum BreakdownSpec {
    Traces(TraceBreakdown),
    Logs(LogBreakdown),
    Metrics(MetricBreakdown),
}

impl QuerySpec {
    pub fn mode(&self) -> QueryMode {
        match self {
            QuerySpec::Timeseries(_) => QueryMode::Timeseries,
            QuerySpec::Breakdown(_) => QueryMode::Breakdown,
        }
    }

    pub fn source(&self) -> DataSource {
        match self {
            QuerySpec::Timeseries(TimeseriesSpec::Traces(_))
            | QuerySpec::Breakdown(BreakdownSpec::Traces(_)) => DataSource::Traces,
            QuerySpec::Timeseries(TimeseriesSpec::Logs(_))
            | QuerySpec::Breakdown(BreakdownSpec::Logs(_)) => DataSource::Logs,
            QuerySpec::Timeseries(TimeseriesSpec::Metrics(_))
            | QuerySpec::Breakdown(BreakdownSpec::Metrics(_)) => DataSource::Metrics,
        }
    }

    pub fn bucket_seconds(&self) -> Option<u32> {
        match self {
            QuerySpec::Timeseries(TimeseriesSpec::Traces(spec)) => Some(spec.bucket_seconds),
            QuerySpec::Timeseries(TimeseriesSpec::Logs(spec)) => Some(spec.bucket_seconds),
            QuerySpec::Timeseries(TimeseriesSpec::Metrics(spec)) => Some(spec.bucket_seconds),
            QuerySpec::Breakdown(_) => None,
        }
    }

    pub fn limit(&self) -> Option<u32> {
        match self {
            QuerySpec::Breakdown(BreakdownSpec::Traces(spec)) => Some(spec.limit),
            QuerySpec::Breakdown(BreakdownSpec::Logs(spec)) => Some(spec.limit),
            QuerySpec::Breakdown(BreakdownSpec::Metrics(spec)) => Some(spec.limit),
            QuerySpec::Timeseries(_) => None,
        }
    }
}

pub fn build_timeseries_query(input: &TimeseriesInput) -> std::result::Result<QuerySpec, BuildError> {
    if input.bucket_seconds == 0 {
        return Err(BuildError::InvalidBucketSeconds);
    }

    let spec = match input.source {
        DataSource::Traces => TimeseriesSpec::Traces(traces::timeseries(input)?),
        DataSource::Logs => TimeseriesSpec::Logs(logs::timeseries(input)?),
        DataSource::Metrics => TimeseriesSpec::Metrics(metrics::timeseries(input)?),
    };
    Ok(QuerySpec::Timeseries(spec))
}

pub fn build_breakdown_query(input: &BreakdownInput) -> std::result::Result<QuerySpec, BuildError> {
    if input.limit == 0 {
        return Err(BuildError::InvalidLimit);
    }

    let spec = match input.source {
        DataSource::Traces => BreakdownSpec::Traces(traces::breakdown(input)?),
        DataSource::Logs => BreakdownSpec::Logs(logs::breakdown(input)?),
        DataSource::Metrics => BreakdownSpec::Metrics(metrics::breakdown(input)?),
    };
    Ok(QuerySpec::Breakdown(spec))
}

/// Compiled query paired with the window it runs over; the payload of the execution RPC.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    pub start_time: String,
    pub end_time: String,
    pub query: QuerySpec,
}

impl ExecutionRequest {
    pub fn new(range: &TimeRange, query: QuerySpec) -> Self {
        Self {
            start_time: range.start_time.clone(),
            end_time: range.end_time.clone(),
            query,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownRow {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ExecutionResponse {
    Timeseries(Vec<BucketPoint>),
    Breakdown(Vec<BreakdownRow>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    pub draft: QueryDraft,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub mode: QueryMode,
}

/// Dense, chart-ready result of a timeseries query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeseriesResult {
    pub bucket_seconds: u32,
    /// Series names, sorted.
    pub keys: Vec<String>,
    pub rows: Vec<ChartRow>,
    pub has_incomplete: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum QueryOutcome {
    Timeseries(TimeseriesResult),
    Breakdown(Vec<BreakdownRow>),
}

pub fn translate_request(config: &AppConfig, request: &TranslateRequest) -> Result<ExecutionRequest> {
    let range = TimeRange::parse(&request.start_time, &request.end_time)?;
    match request.mode {
        QueryMode::Timeseries => request.draft.timeseries_request(&range, config),
        QueryMode::Breakdown => request.draft.breakdown_request(&range, config),
    }
}

#[derive(Clone)]
pub struct QueryEngine {
    backend: Arc<dyn ExecutionBackend>,
    config: Arc<AppConfig>,
}

impl QueryEngine {
    pub fn new(backend: Arc<dyn ExecutionBackend>, config: Arc<AppConfig>) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn translate(&self, request: &TranslateRequest) -> Result<ExecutionRequest> {
        translate_request(self.config(), request)
    }

    /// Compiles a draft and runs it, normalizing the result for the requested mode.
    pub async fn run(&self, request: &TranslateRequest, now: DateTime<Utc>) -> Result<QueryOutcome> {
        let execution = self.translate(request)?;
        match request.mode {
            QueryMode::Timeseries => self
                .execute_timeseries(execution, now)
                .await
                .map(QueryOutcome::Timeseries),
            QueryMode::Breakdown => self
                .execute_breakdown(execution)
                .await
                .map(QueryOutcome::Breakdown),
        }
    }

    pub async fn execute_timeseries(
        &self,
        request: ExecutionRequest,
        now: DateTime<Utc>,
    ) -> Result<TimeseriesResult> {
        let bucket_seconds = request.query.bucket_seconds().ok_or_else(|| {
            ServiceError::InvalidRequest("expected a timeseries query".to_string())
        })?;
        let timeline = build_bucket_timeline(&request.start_time, &request.end_time, bucket_seconds);

        let points = match self.call_backend(request).await? {
            ExecutionResponse::Timeseries(points) => points,
            ExecutionResponse::Breakdown(_) => {
                return Err(ServiceError::Backend(
                    "expected timeseries data, got breakdown".to_string(),
                ))
            }
        };

        let keys: Vec<String> = points
            .iter()
            .flat_map(|point| point.series.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let filled = fill_points(&points, &timeline, &zero_record(keys.iter().cloned()));
        let marked = mark_incomplete(&filled, &keys, now);

        debug!(
            bucket_seconds,
            points = points.len(),
            rows = marked.rows.len(),
            has_incomplete = marked.has_incomplete,
            "normalized timeseries"
        );

        Ok(TimeseriesResult {
            bucket_seconds,
            keys,
            rows: marked.rows,
            has_incomplete: marked.has_incomplete,
        })
    }

    pub async fn execute_breakdown(&self, request: ExecutionRequest) -> Result<Vec<BreakdownRow>> {
        let limit = request
            .query
            .limit()
            .ok_or_else(|| ServiceError::InvalidRequest("expected a breakdown query".to_string()))?;

        let mut rows = match self.call_backend(request).await? {
            ExecutionResponse::Breakdown(rows) => rows,
            ExecutionResponse::Timeseries(_) => {
                return Err(ServiceError::Backend(
                    "expected breakdown data, got timeseries".to_string(),
                ))
            }
        };

        rows.sort_by(|a, b| b.value.total_cmp(&a.value));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn call_backend(&self, request: ExecutionRequest) -> Result<ExecutionResponse> {
        let source = request.query.source();
        self.backend.execute(request).await.map_err(|err| {
            error!(error = ?err, %source, "query execution failed");
            ServiceError::Backend(format!("{err:#}"))
        })
    }
}
