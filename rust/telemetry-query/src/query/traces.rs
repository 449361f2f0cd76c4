use super::{BreakdownInput, BuildError, DataSource, GroupByChoice, TimeseriesInput};
use crate::filters::{AttributeFilter, FilterBag};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceMetric {
    Count,
    AvgDuration,
    P50Duration,
    P95Duration,
    P99Duration,
    ErrorRate,
}

impl TraceMetric {
    fn parse(raw: &str) -> Result<Self, BuildError> {
        match raw.trim().to_lowercase().as_str() {
            "count" => Ok(TraceMetric::Count),
            "avg_duration" => Ok(TraceMetric::AvgDuration),
            "p50_duration" => Ok(TraceMetric::P50Duration),
            "p95_duration" => Ok(TraceMetric::P95Duration),
            "p99_duration" => Ok(TraceMetric::P99Duration),
            "error_rate" => Ok(TraceMetric::ErrorRate),
            _ => Err(BuildError::UnknownTraceMetric(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceGroupBy {
    Service,
    SpanName,
    StatusCode,
    HttpMethod,
    Attribute,
}

impl TraceGroupBy {
    fn parse(name: &str) -> Result<Self, BuildError> {
        match name {
            "service" => Ok(TraceGroupBy::Service),
            "span_name" => Ok(TraceGroupBy::SpanName),
            "status_code" => Ok(TraceGroupBy::StatusCode),
            "http_method" => Ok(TraceGroupBy::HttpMethod),
            "attribute" => Ok(TraceGroupBy::Attribute),
            other => Err(BuildError::UnsupportedGroupBy {
                data_source: DataSource::Traces,
                group_by: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_error: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_duration_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_duration_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<AttributeFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<AttributeFilter>,
}

impl TraceFilters {
    fn from_bag(bag: &FilterBag) -> Self {
        let fields = &bag.fields;
        Self {
            service: fields.service.clone(),
            span_name: fields.span_name.clone(),
            environment: fields.environment.clone(),
            commit_sha: fields.commit_sha.clone(),
            http_method: fields.http_method.clone(),
            http_status_code: fields.http_status_code.clone(),
            has_error: fields.has_error,
            root_only: fields.root_only,
            min_duration_ms: fields.min_duration_ms,
            max_duration_ms: fields.max_duration_ms,
            attribute: fields.attribute.clone(),
            resource: fields.resource.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceTimeseries {
    pub metric: TraceMetric,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_by: Option<TraceGroupBy>,
    pub filters: TraceFilters,
    pub bucket_seconds: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceBreakdown {
    pub metric: TraceMetric,
    pub group_by: TraceGroupBy,
    pub filters: TraceFilters,
    pub limit: u32,
}

pub(super) fn timeseries(input: &TimeseriesInput) -> Result<TraceTimeseries, BuildError> {
    let metric = TraceMetric::parse(&input.metric)?;
    let group_by = match GroupByChoice::from_input(input.group_by.as_deref()) {
        GroupByChoice::Unset | GroupByChoice::Disabled => None,
        GroupByChoice::Named(name) => Some(TraceGroupBy::parse(&name)?),
    };

    Ok(TraceTimeseries {
        metric,
        group_by,
        filters: TraceFilters::from_bag(&input.filters),
        bucket_seconds: input.bucket_seconds,
    })
}

pub(super) fn breakdown(input: &BreakdownInput) -> Result<TraceBreakdown, BuildError> {
    let metric = TraceMetric::parse(&input.metric)?;
    let group_by = match GroupByChoice::from_input(input.group_by.as_deref()) {
        GroupByChoice::Named(name) => TraceGroupBy::parse(&name)?,
        GroupByChoice::Unset | GroupByChoice::Disabled => {
            return Err(BuildError::MissingGroupBy {
                data_source: DataSource::Traces,
            })
        }
    };

    Ok(TraceBreakdown {
        metric,
        group_by,
        filters: TraceFilters::from_bag(&input.filters),
        limit: input.limit,
    })
}
