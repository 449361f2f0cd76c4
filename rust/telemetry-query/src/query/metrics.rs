use super::{BreakdownInput, BuildError, DataSource, GroupByChoice, TimeseriesInput};
use crate::filters::{AttributeFilter, FilterBag};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricAggregation {
    Avg,
    Sum,
    Min,
    Max,
    Count,
}

impl MetricAggregation {
    fn parse(raw: &str) -> Result<Self, BuildError> {
        match raw.trim().to_lowercase().as_str() {
            "avg" => Ok(MetricAggregation::Avg),
            "sum" => Ok(MetricAggregation::Sum),
            "min" => Ok(MetricAggregation::Min),
            "max" => Ok(MetricAggregation::Max),
            "count" => Ok(MetricAggregation::Count),
            _ => Err(BuildError::UnknownMetricAggregation(raw.to_string())),
        }
    }

    fn supports_breakdown(self) -> bool {
        matches!(
            self,
            MetricAggregation::Avg | MetricAggregation::Sum | MetricAggregation::Count
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    Gauge,
    Sum,
    Histogram,
    ExponentialHistogram,
    Summary,
}

impl MetricType {
    pub const ALL: [MetricType; 5] = [
        MetricType::Gauge,
        MetricType::Sum,
        MetricType::Histogram,
        MetricType::ExponentialHistogram,
        MetricType::Summary,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MetricType::Gauge => "gauge",
            MetricType::Sum => "sum",
            MetricType::Histogram => "histogram",
            MetricType::ExponentialHistogram => "exponential_histogram",
            MetricType::Summary => "summary",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricGroupBy {
    Service,
}

impl MetricGroupBy {
    fn parse(name: &str) -> Result<Self, BuildError> {
        match name {
            "service" => Ok(MetricGroupBy::Service),
            other => Err(BuildError::UnsupportedGroupBy {
                data_source: DataSource::Metrics,
                group_by: other.to_string(),
            }),
        }
    }
}

/// Metric filters always name the metric; the type is needed to pick the right storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricFilters {
    pub metric_name: String,
    pub metric_type: MetricType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<AttributeFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<AttributeFilter>,
}

impl MetricFilters {
    fn from_bag(bag: &FilterBag) -> Result<Self, BuildError> {
        let metric_name = bag
            .metric_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(BuildError::MissingMetricName)?;

        let raw_type = bag
            .metric_type
            .as_deref()
            .map(str::trim)
            .filter(|kind| !kind.is_empty())
            .ok_or(BuildError::MissingMetricType)?;
        let metric_type = MetricType::parse(raw_type)
            .ok_or_else(|| BuildError::UnknownMetricType(raw_type.to_string()))?;

        let fields = &bag.fields;
        Ok(Self {
            metric_name: metric_name.to_string(),
            metric_type,
            service: fields.service.clone(),
            environment: fields.environment.clone(),
            attribute: fields.attribute.clone(),
            resource: fields.resource.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricTimeseries {
    pub metric: MetricAggregation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_by: Option<MetricGroupBy>,
    pub filters: MetricFilters,
    pub bucket_seconds: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricBreakdown {
    pub metric: MetricAggregation,
    pub group_by: MetricGroupBy,
    pub filters: MetricFilters,
    pub limit: u32,
}

pub(super) fn timeseries(input: &TimeseriesInput) -> Result<MetricTimeseries, BuildError> {
    let metric = MetricAggregation::parse(&input.metric)?;
    let filters = MetricFilters::from_bag(&input.filters)?;
    let group_by = match GroupByChoice::from_input(input.group_by.as_deref()) {
        GroupByChoice::Unset => Some(MetricGroupBy::Service),
        GroupByChoice::Disabled => None,
        GroupByChoice::Named(name) => Some(MetricGroupBy::parse(&name)?),
    };

    Ok(MetricTimeseries {
        metric,
        group_by,
        filters,
        bucket_seconds: input.bucket_seconds,
    })
}

pub(super) fn breakdown(input: &BreakdownInput) -> Result<MetricBreakdown, BuildError> {
    let metric = MetricAggregation::parse(&input.metric)?;
    if !metric.supports_breakdown() {
        return Err(BuildError::UnsupportedBreakdownAggregation(
            input.metric.clone(),
        ));
    }
    let filters = MetricFilters::from_bag(&input.filters)?;
    let group_by = match GroupByChoice::from_input(input.group_by.as_deref()) {
        GroupByChoice::Named(name) => MetricGroupBy::parse(&name)?,
        GroupByChoice::Unset | GroupByChoice::Disabled => {
            return Err(BuildError::MissingGroupBy {
                data_source: DataSource::Metrics,
            })
        }
    };

    Ok(MetricBreakdown {
        metric,
        group_by,
        filters,
        limit: input.limit,
    })
}
