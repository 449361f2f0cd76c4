use super::{BreakdownInput, BuildError, DataSource, GroupByChoice, TimeseriesInput};
use crate::filters::{AttributeFilter, FilterBag};
use serde::Serialize;

/// Logs only support counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogMetric {
    Count,
}

impl LogMetric {
    fn parse(raw: &str) -> Result<Self, BuildError> {
        match raw.trim().to_lowercase().as_str() {
            "count" => Ok(LogMetric::Count),
            _ => Err(BuildError::UnknownLogMetric(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogGroupBy {
    Service,
    Severity,
}

impl LogGroupBy {
    fn parse(name: &str) -> Result<Self, BuildError> {
        match name {
            "service" => Ok(LogGroupBy::Service),
            "severity" => Ok(LogGroupBy::Severity),
            other => Err(BuildError::UnsupportedGroupBy {
                data_source: DataSource::Logs,
                group_by: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<AttributeFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<AttributeFilter>,
}

impl LogFilters {
    fn from_bag(bag: &FilterBag) -> Self {
        let fields = &bag.fields;
        Self {
            service: fields.service.clone(),
            severity: fields.severity.clone(),
            environment: fields.environment.clone(),
            commit_sha: fields.commit_sha.clone(),
            search: bag
                .search
                .as_deref()
                .map(str::trim)
                .filter(|term| !term.is_empty())
                .map(str::to_string),
            attribute: fields.attribute.clone(),
            resource: fields.resource.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogTimeseries {
    pub metric: LogMetric,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_by: Option<LogGroupBy>,
    pub filters: LogFilters,
    pub bucket_seconds: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogBreakdown {
    pub metric: LogMetric,
    pub group_by: LogGroupBy,
    pub filters: LogFilters,
    pub limit: u32,
}

pub(super) fn timeseries(input: &TimeseriesInput) -> Result<LogTimeseries, BuildError> {
    let metric = LogMetric::parse(&input.metric)?;
    let group_by = match GroupByChoice::from_input(input.group_by.as_deref()) {
        GroupByChoice::Unset | GroupByChoice::Disabled => None,
        GroupByChoice::Named(name) => Some(LogGroupBy::parse(&name)?),
    };

    Ok(LogTimeseries {
        metric,
        group_by,
        filters: LogFilters::from_bag(&input.filters),
        bucket_seconds: input.bucket_seconds,
    })
}

pub(super) fn breakdown(input: &BreakdownInput) -> Result<LogBreakdown, BuildError> {
    let metric = LogMetric::parse(&input.metric)?;
    let group_by = match GroupByChoice::from_input(input.group_by.as_deref()) {
        GroupByChoice::Named(name) => LogGroupBy::parse(&name)?,
        GroupByChoice::Unset | GroupByChoice::Disabled => {
            return Err(BuildError::MissingGroupBy {
                data_source: DataSource::Logs,
            })
        }
    };

    Ok(LogBreakdown {
        metric,
        group_by,
        filters: LogFilters::from_bag(&input.filters),
        limit: input.limit,
    })
}
