use crate::{error::ServiceError, series::DEFAULT_TARGET_POINTS};
use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_NOISY_ATTRIBUTE_PREFIXES: &[&str] =
    &["http.request.header.", "http.response.header."];

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Approximate number of points a chart should render.
    pub target_points: u32,
    pub max_suggestions: usize,
    /// Attribute key prefixes ranked after clean keys in autocomplete.
    pub noisy_attribute_prefixes: Vec<String>,
    pub default_breakdown_limit: u32,
    pub max_breakdown_limit: u32,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default = "default_target_points")]
    telemetry_query_target_points: u32,
    #[serde(default = "default_max_suggestions")]
    telemetry_query_max_suggestions: usize,
    #[serde(default)]
    telemetry_query_noisy_attribute_prefixes: Option<String>,
    #[serde(default = "default_breakdown_limit")]
    telemetry_query_default_breakdown_limit: u32,
    #[serde(default = "default_max_breakdown_limit")]
    telemetry_query_max_breakdown_limit: u32,
}

const fn default_target_points() -> u32 {
    DEFAULT_TARGET_POINTS
}

const fn default_max_suggestions() -> usize {
    8
}

const fn default_breakdown_limit() -> u32 {
    10
}

const fn default_max_breakdown_limit() -> u32 {
    100
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let raw: RawConfig = envy::from_env()
            .map_err(|err| ServiceError::Config(err.to_string()))
            .context("failed to parse TELEMETRY_QUERY_* environment variables")?;

        let noisy_attribute_prefixes = match raw.telemetry_query_noisy_attribute_prefixes {
            Some(csv) => parse_prefix_list(&csv),
            None => default_noisy_prefixes(),
        };

        let default_breakdown_limit = raw.telemetry_query_default_breakdown_limit.max(1);

        Ok(Self {
            target_points: raw.telemetry_query_target_points.max(1),
            max_suggestions: raw.telemetry_query_max_suggestions.max(1),
            noisy_attribute_prefixes,
            default_breakdown_limit,
            max_breakdown_limit: raw
                .telemetry_query_max_breakdown_limit
                .max(default_breakdown_limit),
        })
    }

    /// Defaults without consulting the environment, for embedding in other processes.
    pub fn embedded() -> Self {
        Self {
            target_points: default_target_points(),
            max_suggestions: default_max_suggestions(),
            noisy_attribute_prefixes: default_noisy_prefixes(),
            default_breakdown_limit: default_breakdown_limit(),
            max_breakdown_limit: default_max_breakdown_limit(),
        }
    }

    pub fn clamp_breakdown_limit(&self, candidate: Option<u32>) -> u32 {
        candidate
            .unwrap_or(self.default_breakdown_limit)
            .clamp(1, self.max_breakdown_limit)
    }
}

fn default_noisy_prefixes() -> Vec<String> {
    DEFAULT_NOISY_ATTRIBUTE_PREFIXES
        .iter()
        .map(|prefix| prefix.to_string())
        .collect()
}

fn parse_prefix_list(csv: &str) -> Vec<String> {
    csv.split(',')
        .filter_map(|part| {
            let entry = part.trim();
            if entry.is_empty() {
                None
            } else {
                Some(entry.to_lowercase())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    const VARS: &[&str] = &[
        "TELEMETRY_QUERY_TARGET_POINTS",
        "TELEMETRY_QUERY_MAX_SUGGESTIONS",
        "TELEMETRY_QUERY_NOISY_ATTRIBUTE_PREFIXES",
        "TELEMETRY_QUERY_DEFAULT_BREAKDOWN_LIMIT",
        "TELEMETRY_QUERY_MAX_BREAKDOWN_LIMIT",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn defaults_match_embedded() {
        clear_env();
        let config = AppConfig::from_env().unwrap();
        let embedded = AppConfig::embedded();
        assert_eq!(config.target_points, embedded.target_points);
        assert_eq!(embedded.target_points, DEFAULT_TARGET_POINTS);
        assert_eq!(config.max_suggestions, 8);
        assert_eq!(
            config.noisy_attribute_prefixes,
            vec!["http.request.header.", "http.response.header."]
        );
        assert_eq!(config.default_breakdown_limit, 10);
        assert_eq!(config.max_breakdown_limit, 100);
    }

    #[test]
    #[serial]
    fn reads_overrides_and_clamps() {
        clear_env();
        env::set_var("TELEMETRY_QUERY_TARGET_POINTS", "0");
        env::set_var("TELEMETRY_QUERY_NOISY_ATTRIBUTE_PREFIXES", " Grpc.Metadata. , ,x-");
        env::set_var("TELEMETRY_QUERY_DEFAULT_BREAKDOWN_LIMIT", "50");
        env::set_var("TELEMETRY_QUERY_MAX_BREAKDOWN_LIMIT", "20");

        let config = AppConfig::from_env().unwrap();
        clear_env();

        assert_eq!(config.target_points, 1);
        assert_eq!(config.noisy_attribute_prefixes, vec!["grpc.metadata.", "x-"]);
        assert_eq!(config.default_breakdown_limit, 50);
        assert_eq!(config.max_breakdown_limit, 50);
    }

    #[test]
    #[serial]
    fn malformed_values_are_config_errors() {
        clear_env();
        env::set_var("TELEMETRY_QUERY_TARGET_POINTS", "lots");
        let err = AppConfig::from_env().unwrap_err();
        clear_env();

        assert!(matches!(
            err.downcast_ref::<ServiceError>(),
            Some(ServiceError::Config(_))
        ));
    }

    #[test]
    fn clamps_breakdown_limit() {
        let config = AppConfig::embedded();
        assert_eq!(config.clamp_breakdown_limit(None), 10);
        assert_eq!(config.clamp_breakdown_limit(Some(0)), 1);
        assert_eq!(config.clamp_breakdown_limit(Some(5000)), 100);
    }
}
