use super::{
    build_breakdown_query, build_timeseries_query, BreakdownInput, DataSource, ExecutionRequest,
    TimeseriesInput,
};
use crate::{
    config::AppConfig,
    error::{Result, ServiceError},
    filters::{apply_where_clause, serialize_where_clause, FilterBag, FilterFields},
    series::compute_bucket_seconds,
    time::{parse_step_seconds, TimeRange},
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Which optional clauses the user switched on in the query panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddOns {
    pub group_by: bool,
    pub having: bool,
    pub order_by: bool,
    pub limit: bool,
    pub legend: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    Asc,
    #[default]
    Desc,
}

/// Editable query as the UI holds it. Nothing here is validated until it is compiled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDraft {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    pub data_source: DataSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_source: Option<String>,
    #[serde(default)]
    pub where_clause: String,
    pub aggregation: String,
    #[serde(default = "default_step_interval")]
    pub step_interval: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_type: Option<String>,
    #[serde(default)]
    pub add_ons: AddOns,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub having: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    #[serde(default)]
    pub order_direction: OrderDirection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_step_interval() -> String {
    "auto".to_string()
}

const fn default_enabled() -> bool {
    true
}

/// Panel label for the draft at `index`: `A`..`Z`, then `A1`..`Z1`, `A2`, ...
pub fn draft_name(index: usize) -> String {
    let letter = char::from(b'A' + (index % 26) as u8);
    match index / 26 {
        0 => letter.to_string(),
        round => format!("{letter}{round}"),
    }
}

impl QueryDraft {
    pub fn new(data_source: DataSource, index: usize) -> Self {
        let aggregation = match data_source {
            DataSource::Traces | DataSource::Logs => "count",
            DataSource::Metrics => "avg",
        };

        Self {
            id: Uuid::new_v4(),
            name: draft_name(index),
            data_source,
            signal_source: None,
            where_clause: String::new(),
            aggregation: aggregation.to_string(),
            step_interval: default_step_interval(),
            group_by: None,
            metric_name: None,
            metric_type: None,
            add_ons: AddOns::default(),
            having: None,
            order_by: None,
            order_direction: OrderDirection::default(),
            limit: None,
            legend: None,
            enabled: true,
        }
    }

    /// Rewrites the where clause from structured fields, e.g. after a facet click.
    pub fn set_filters(&mut self, fields: &FilterFields) {
        self.where_clause = serialize_where_clause(fields).unwrap_or_default();
    }

    /// Filter state compiled from the where clause. Clauses still being typed are skipped.
    pub fn filter_bag(&self) -> FilterBag {
        let base = FilterBag {
            metric_name: self.metric_name.clone(),
            metric_type: self.metric_type.clone(),
            ..FilterBag::default()
        };
        let applied = apply_where_clause(&base, &self.where_clause);
        if applied.has_incomplete_clauses {
            debug!(draft = %self.name, where_clause = %self.where_clause, "ignoring incomplete where clauses");
        }
        applied.filters
    }

    pub fn timeseries_request(&self, range: &TimeRange, config: &AppConfig) -> Result<ExecutionRequest> {
        self.ensure_enabled()?;

        let bucket_seconds = match parse_step_seconds(&self.step_interval)? {
            Some(seconds) => seconds,
            None => compute_bucket_seconds(
                Some(&range.start_time),
                Some(&range.end_time),
                config.target_points,
            ),
        };

        let input = TimeseriesInput {
            source: self.data_source,
            metric: self.aggregation.clone(),
            group_by: if self.add_ons.group_by {
                self.group_by.clone()
            } else {
                None
            },
            filters: self.filter_bag(),
            bucket_seconds,
        };
        let query = build_timeseries_query(&input)?;
        debug!(draft = %self.name, source = %self.data_source, bucket_seconds, "compiled timeseries draft");

        Ok(ExecutionRequest::new(range, query))
    }

    pub fn breakdown_request(&self, range: &TimeRange, config: &AppConfig) -> Result<ExecutionRequest> {
        self.ensure_enabled()?;

        let limit = if self.add_ons.limit {
            config.clamp_breakdown_limit(self.limit)
        } else {
            config.default_breakdown_limit
        };

        let input = BreakdownInput {
            source: self.data_source,
            metric: self.aggregation.clone(),
            group_by: self.group_by.clone(),
            filters: self.filter_bag(),
            limit,
        };
        let query = build_breakdown_query(&input)?;
        debug!(draft = %self.name, source = %self.data_source, limit, "compiled breakdown draft");

        Ok(ExecutionRequest::new(range, query))
    }

    fn ensure_enabled(&self) -> Result<()> {
        if self.enabled {
            Ok(())
        } else {
            Err(ServiceError::InvalidRequest(format!(
                "query {} is disabled",
                self.name
            )))
        }
    }
}
