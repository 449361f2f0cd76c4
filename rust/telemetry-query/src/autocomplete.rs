//! Suggestion ranking and splicing for the where-clause editor.

use crate::{
    config::AppConfig,
    filters::{normalize_key, quote_value, ATTRIBUTE_PREFIX, RESOURCE_PREFIX},
    parser::{clamp_cursor, parse_context, AutocompleteContext, ContextKind},
    query::{DataSource, MetricType},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const OPERATOR: &str = "=";
const CONJUNCTION: &str = "AND";

/// Which key vocabulary the editor is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VocabularyScope {
    Traces,
    Logs,
    Metrics,
    /// Full-text trace search, which also filters on HTTP fields and durations.
    TraceSearch,
}

impl From<DataSource> for VocabularyScope {
    fn from(source: DataSource) -> Self {
        match source {
            DataSource::Traces => VocabularyScope::Traces,
            DataSource::Logs => VocabularyScope::Logs,
            DataSource::Metrics => VocabularyScope::Metrics,
        }
    }
}

type KeyEntry = (&'static str, &'static str);

const SERVICE_KEY: KeyEntry = ("service.name", "Service emitting the telemetry");
const SPAN_KEY: KeyEntry = ("span.name", "Operation name of the span");
const ENVIRONMENT_KEY: KeyEntry = ("deployment.environment", "Deployment environment");
const COMMIT_KEY: KeyEntry = ("deployment.commit_sha", "Commit SHA of the deployment");
const HAS_ERROR_KEY: KeyEntry = ("has_error", "Only spans with an error status");
const ROOT_ONLY_KEY: KeyEntry = ("root_only", "Restrict to root spans (default true)");
const ATTRIBUTE_KEY: KeyEntry = ("attr.", "Filter on a span or log attribute");
const RESOURCE_KEY: KeyEntry = ("resource.", "Filter on a resource attribute");

const TRACE_KEYS: &[KeyEntry] = &[
    SERVICE_KEY,
    SPAN_KEY,
    ENVIRONMENT_KEY,
    COMMIT_KEY,
    HAS_ERROR_KEY,
    ROOT_ONLY_KEY,
    ATTRIBUTE_KEY,
    RESOURCE_KEY,
];

const LOG_KEYS: &[KeyEntry] = &[
    SERVICE_KEY,
    ("severity", "Log severity text"),
    ENVIRONMENT_KEY,
    COMMIT_KEY,
    ATTRIBUTE_KEY,
    RESOURCE_KEY,
];

const METRIC_KEYS: &[KeyEntry] = &[
    SERVICE_KEY,
    ("metric.type", "Instrument type of the metric"),
    ENVIRONMENT_KEY,
    ATTRIBUTE_KEY,
    RESOURCE_KEY,
];

const TRACE_SEARCH_KEYS: &[KeyEntry] = &[
    SERVICE_KEY,
    SPAN_KEY,
    ENVIRONMENT_KEY,
    COMMIT_KEY,
    ("http.method", "HTTP request method"),
    ("http.status_code", "HTTP response status code"),
    HAS_ERROR_KEY,
    ROOT_ONLY_KEY,
    ("min_duration_ms", "Minimum span duration in milliseconds"),
    ("max_duration_ms", "Maximum span duration in milliseconds"),
    ATTRIBUTE_KEY,
    RESOURCE_KEY,
];

impl VocabularyScope {
    fn keys(self) -> &'static [KeyEntry] {
        match self {
            VocabularyScope::Traces => TRACE_KEYS,
            VocabularyScope::Logs => LOG_KEYS,
            VocabularyScope::Metrics => METRIC_KEYS,
            VocabularyScope::TraceSearch => TRACE_SEARCH_KEYS,
        }
    }
}

/// Distinct values discovered by facet queries, supplied by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValueCatalogs {
    pub services: Vec<String>,
    pub span_names: Vec<String>,
    pub environments: Vec<String>,
    pub commit_shas: Vec<String>,
    pub severities: Vec<String>,
    pub http_methods: Vec<String>,
    pub http_status_codes: Vec<String>,
    pub attribute_keys: Vec<String>,
    pub resource_keys: Vec<String>,
    pub attribute_values: BTreeMap<String, Vec<String>>,
    pub resource_values: BTreeMap<String, Vec<String>>,
    pub metric_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: String,
    pub kind: ContextKind,
    pub label: String,
    pub insert_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Suggestion {
    fn new(kind: ContextKind, label: &str, insert_text: &str, description: Option<&str>) -> Self {
        Self {
            id: format!("{}:{insert_text}", kind.as_str()),
            kind,
            label: label.to_string(),
            insert_text: insert_text.to_string(),
            description: description.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub context: AutocompleteContext,
    pub suggestions: Vec<Suggestion>,
}

/// Expression after a suggestion was accepted, with the caret placed after the insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedSuggestion {
    pub expression: String,
    pub cursor: usize,
}

struct Candidate {
    suggestion: Suggestion,
    demoted: bool,
}

impl Candidate {
    fn plain(suggestion: Suggestion) -> Self {
        Self {
            suggestion,
            demoted: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AutocompleteEngine {
    max_suggestions: usize,
    noisy_prefixes: Vec<String>,
}

impl Default for AutocompleteEngine {
    fn default() -> Self {
        Self::new(&AppConfig::embedded())
    }
}

impl AutocompleteEngine {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            max_suggestions: config.max_suggestions.max(1),
            noisy_prefixes: config
                .noisy_attribute_prefixes
                .iter()
                .map(|prefix| prefix.to_lowercase())
                .collect(),
        }
    }

    pub fn with_max_suggestions(mut self, max_suggestions: usize) -> Self {
        self.max_suggestions = max_suggestions.max(1);
        self
    }

    /// Parses the cursor context and ranks suggestions for it in one step.
    pub fn complete(
        &self,
        scope: VocabularyScope,
        expression: &str,
        cursor: usize,
        catalogs: &ValueCatalogs,
    ) -> Completion {
        let context = parse_context(expression, cursor);
        let suggestions = self.suggest(scope, &context, catalogs);
        Completion {
            context,
            suggestions,
        }
    }

    pub fn suggest(
        &self,
        scope: VocabularyScope,
        context: &AutocompleteContext,
        catalogs: &ValueCatalogs,
    ) -> Vec<Suggestion> {
        let candidates = match context.kind {
            ContextKind::Key => self.key_candidates(scope, &context.query, catalogs),
            ContextKind::Operator => vec![Candidate::plain(Suggestion::new(
                ContextKind::Operator,
                OPERATOR,
                OPERATOR,
                Some("equals"),
            ))],
            ContextKind::Value => context
                .key
                .as_deref()
                .map(|key| value_candidates(scope, key, catalogs))
                .unwrap_or_default(),
            ContextKind::Conjunction => vec![Candidate::plain(Suggestion::new(
                ContextKind::Conjunction,
                CONJUNCTION,
                CONJUNCTION,
                Some("combine with another condition"),
            ))],
        };

        rank(candidates, &context.query, self.max_suggestions)
    }

    fn key_candidates(
        &self,
        scope: VocabularyScope,
        typed: &str,
        catalogs: &ValueCatalogs,
    ) -> Vec<Candidate> {
        let lower = typed.to_lowercase();
        if lower.starts_with(ATTRIBUTE_PREFIX) {
            return self.discovered_keys(ATTRIBUTE_PREFIX, &catalogs.attribute_keys);
        }
        if lower.starts_with(RESOURCE_PREFIX) {
            return self.discovered_keys(RESOURCE_PREFIX, &catalogs.resource_keys);
        }

        scope
            .keys()
            .iter()
            .map(|(key, description)| {
                Candidate::plain(Suggestion::new(ContextKind::Key, key, key, Some(*description)))
            })
            .collect()
    }

    fn discovered_keys(&self, prefix: &str, keys: &[String]) -> Vec<Candidate> {
        let mut seen = std::collections::BTreeSet::new();
        keys.iter()
            .filter(|key| !key.is_empty() && seen.insert(key.as_str()))
            .map(|key| {
                let full = format!("{prefix}{key}");
                Candidate {
                    suggestion: Suggestion::new(ContextKind::Key, &full, &full, None),
                    demoted: self.is_noisy(key),
                }
            })
            .collect()
    }

    fn is_noisy(&self, key: &str) -> bool {
        let lower = key.to_lowercase();
        self.noisy_prefixes
            .iter()
            .any(|prefix| lower.starts_with(prefix.as_str()))
    }
}

fn value_candidates(scope: VocabularyScope, key: &str, catalogs: &ValueCatalogs) -> Vec<Candidate> {
    let canonical = normalize_key(key);

    if let Some(name) = canonical.strip_prefix(ATTRIBUTE_PREFIX) {
        return quoted_values(catalogs.attribute_values.get(name));
    }
    if let Some(name) = canonical.strip_prefix(RESOURCE_PREFIX) {
        return quoted_values(catalogs.resource_values.get(name));
    }

    let trace_search = scope == VocabularyScope::TraceSearch;
    match canonical.as_str() {
        "has_error" | "root_only" => ["true", "false"]
            .into_iter()
            .map(|literal| literal_candidate(literal))
            .collect(),
        "metric.type" => {
            if catalogs.metric_types.is_empty() {
                MetricType::ALL
                    .into_iter()
                    .map(|kind| literal_candidate(kind.as_str()))
                    .collect()
            } else {
                catalogs
                    .metric_types
                    .iter()
                    .map(|kind| literal_candidate(kind))
                    .collect()
            }
        }
        "service.name" => quoted_values(Some(&catalogs.services)),
        "span.name" => quoted_values(Some(&catalogs.span_names)),
        "deployment.environment" => quoted_values(Some(&catalogs.environments)),
        "deployment.commit_sha" => quoted_values(Some(&catalogs.commit_shas)),
        "severity" => quoted_values(Some(&catalogs.severities)),
        "http.method" if trace_search => quoted_values(Some(&catalogs.http_methods)),
        "http.status_code" if trace_search => quoted_values(Some(&catalogs.http_status_codes)),
        _ => Vec::new(),
    }
}

fn literal_candidate(literal: &str) -> Candidate {
    Candidate::plain(Suggestion::new(ContextKind::Value, literal, literal, None))
}

fn quoted_values(values: Option<&Vec<String>>) -> Vec<Candidate> {
    let Some(values) = values else {
        return Vec::new();
    };
    let mut seen = std::collections::BTreeSet::new();
    values
        .iter()
        .filter(|value| !value.is_empty() && seen.insert(value.as_str()))
        .map(|value| {
            Candidate::plain(Suggestion::new(
                ContextKind::Value,
                value,
                &quote_value(value),
                None,
            ))
        })
        .collect()
}

/// Prefix matches first, substring matches next, non-matches dropped; demoted candidates sort
/// after clean ones within a tier. Order is otherwise stable.
fn rank(candidates: Vec<Candidate>, query: &str, max: usize) -> Vec<Suggestion> {
    let needle = query.trim().to_lowercase();

    let mut tiered: Vec<(u8, bool, Suggestion)> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let tier = match_tier(&candidate.suggestion, &needle)?;
            Some((tier, candidate.demoted, candidate.suggestion))
        })
        .collect();

    tiered.sort_by_key(|(tier, demoted, _)| (*tier, *demoted));
    tiered
        .into_iter()
        .take(max)
        .map(|(_, _, suggestion)| suggestion)
        .collect()
}

fn match_tier(suggestion: &Suggestion, needle: &str) -> Option<u8> {
    if needle.is_empty() {
        return Some(0);
    }
    let label = suggestion.label.to_lowercase();
    let insert = suggestion.insert_text.to_lowercase();

    if label.starts_with(needle) || insert.starts_with(needle) {
        Some(0)
    } else if label.contains(needle) || insert.contains(needle) {
        Some(1)
    } else {
        None
    }
}

/// Splices an accepted suggestion into the expression at the context's replace range.
pub fn apply_suggestion(
    expression: &str,
    context: &AutocompleteContext,
    suggestion: &Suggestion,
) -> AppliedSuggestion {
    let start = clamp_cursor(expression, context.replace_start);
    let end = clamp_cursor(expression, context.replace_end).max(start);
    let token = suggestion.insert_text.as_str();
    let mut out = String::with_capacity(expression.len() + token.len() + 2);

    let cursor = match suggestion.kind {
        ContextKind::Operator | ContextKind::Conjunction => {
            let before = expression[..start].trim_end();
            let after = expression[end..].trim_start();
            out.push_str(before);
            if !before.is_empty() {
                out.push(' ');
            }
            out.push_str(token);
            out.push(' ');
            let cursor = out.len();
            out.push_str(after);
            cursor
        }
        ContextKind::Key | ContextKind::Value => {
            let before = &expression[..start];
            let after = &expression[end..];
            out.push_str(before);
            if before.chars().next_back().is_some_and(|ch| !ch.is_whitespace()) {
                out.push(' ');
            }
            out.push_str(token);
            if !token.ends_with('.') && !after.starts_with(char::is_whitespace) {
                out.push(' ');
            }
            let cursor = out.len();
            out.push_str(after);
            cursor
        }
    };

    AppliedSuggestion {
        expression: out,
        cursor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn engine() -> AutocompleteEngine {
        AutocompleteEngine::default()
    }

    fn labels(suggestions: &[Suggestion]) -> Vec<&str> {
        suggestions.iter().map(|s| s.label.as_str()).collect()
    }

    #[test]
    fn empty_expression_suggests_trace_keys() {
        let completion = engine().complete(VocabularyScope::Traces, "", 0, &ValueCatalogs::default());
        assert_eq!(completion.context.kind, ContextKind::Key);
        assert!(labels(&completion.suggestions).contains(&"service.name"));
        assert_eq!(completion.suggestions.len(), 8);
    }

    #[test]
    fn operator_context_only_offers_equals() {
        let expression = "service.name ";
        let completion = engine().complete(
            VocabularyScope::Logs,
            expression,
            expression.len(),
            &ValueCatalogs::default(),
        );
        assert_eq!(completion.context.kind, ContextKind::Operator);
        assert_eq!(labels(&completion.suggestions), vec!["="]);
    }

    #[test]
    fn value_context_quotes_catalog_values() {
        let catalogs = ValueCatalogs {
            services: vec!["checkout".into(), "cart".into()],
            ..ValueCatalogs::default()
        };
        let expression = "service.name = \"chec";
        let completion =
            engine().complete(VocabularyScope::Traces, expression, expression.len(), &catalogs);

        assert_eq!(completion.context.kind, ContextKind::Value);
        let first = &completion.suggestions[0];
        assert_eq!(first.label, "checkout");
        assert_eq!(first.insert_text, "\"checkout\"");
        assert_eq!(completion.suggestions.len(), 1);
    }

    #[test]
    fn prefix_matches_rank_before_substring_matches() {
        let catalogs = ValueCatalogs {
            services: vec!["shopping-cart".into(), "cart".into(), "ledger".into()],
            ..ValueCatalogs::default()
        };
        let expression = "service = car";
        let completion =
            engine().complete(VocabularyScope::Logs, expression, expression.len(), &catalogs);
        assert_eq!(labels(&completion.suggestions), vec!["cart", "shopping-cart"]);
    }

    #[test]
    fn boolean_and_metric_type_literals() {
        let expression = "has_error = ";
        let completion = engine().complete(
            VocabularyScope::Traces,
            expression,
            expression.len(),
            &ValueCatalogs::default(),
        );
        assert_eq!(labels(&completion.suggestions), vec!["true", "false"]);
        assert_eq!(completion.suggestions[0].insert_text, "true");

        let expression = "metric.type = h";
        let completion = engine().complete(
            VocabularyScope::Metrics,
            expression,
            expression.len(),
            &ValueCatalogs::default(),
        );
        assert_eq!(labels(&completion.suggestions), vec!["histogram", "exponential_histogram"]);
    }

    #[test]
    fn http_values_only_in_trace_search_scope() {
        let catalogs = ValueCatalogs {
            http_methods: vec!["GET".into(), "POST".into()],
            ..ValueCatalogs::default()
        };
        let expression = "http.method = ";
        let traces = engine().complete(VocabularyScope::Traces, expression, expression.len(), &catalogs);
        assert!(traces.suggestions.is_empty());

        let search =
            engine().complete(VocabularyScope::TraceSearch, expression, expression.len(), &catalogs);
        assert_eq!(labels(&search.suggestions), vec!["GET", "POST"]);
    }

    #[test]
    fn attribute_keys_demote_noisy_prefixes() {
        let catalogs = ValueCatalogs {
            attribute_keys: vec![
                "http.request.header.x_trace".into(),
                "http.route".into(),
                "http.route".into(),
                "user.id".into(),
            ],
            ..ValueCatalogs::default()
        };
        let expression = "attr.http";
        let completion =
            engine().complete(VocabularyScope::Traces, expression, expression.len(), &catalogs);
        assert_eq!(
            labels(&completion.suggestions),
            vec!["attr.http.route", "attr.http.request.header.x_trace"]
        );
    }

    #[test]
    fn attribute_values_resolve_through_catalog() {
        let catalogs = ValueCatalogs {
            attribute_values: BTreeMap::from([(
                "http.route".to_string(),
                vec!["/cart".to_string(), "/checkout".to_string()],
            )]),
            ..ValueCatalogs::default()
        };
        let expression = "attr.http.route = /che";
        let completion =
            engine().complete(VocabularyScope::Traces, expression, expression.len(), &catalogs);
        assert_eq!(labels(&completion.suggestions), vec!["/checkout"]);
        assert_eq!(completion.suggestions[0].insert_text, "\"/checkout\"");
    }

    #[test]
    fn resource_prefix_switches_to_resource_keys() {
        let catalogs = ValueCatalogs {
            attribute_keys: vec!["user.id".into()],
            resource_keys: vec![
                "http.request.header.host".into(),
                "k8s.pod.name".into(),
                "host.name".into(),
            ],
            ..ValueCatalogs::default()
        };
        let expression = "resource.";
        let completion =
            engine().complete(VocabularyScope::Logs, expression, expression.len(), &catalogs);
        assert_eq!(
            labels(&completion.suggestions),
            vec![
                "resource.k8s.pod.name",
                "resource.host.name",
                "resource.http.request.header.host",
            ]
        );
    }

    #[test]
    fn resource_values_resolve_through_catalog() {
        let catalogs = ValueCatalogs {
            attribute_values: BTreeMap::from([(
                "k8s.pod.name".to_string(),
                vec!["attribute-side".to_string()],
            )]),
            resource_values: BTreeMap::from([(
                "k8s.pod.name".to_string(),
                vec!["cart-7d9f".to_string(), "checkout-5b2c".to_string()],
            )]),
            ..ValueCatalogs::default()
        };
        let expression = "resource.k8s.pod.name = ";
        let completion =
            engine().complete(VocabularyScope::Traces, expression, expression.len(), &catalogs);
        assert_eq!(labels(&completion.suggestions), vec!["cart-7d9f", "checkout-5b2c"]);
        assert_eq!(completion.suggestions[1].insert_text, "\"checkout-5b2c\"");

        let expression = "resource.unknown = ";
        let completion =
            engine().complete(VocabularyScope::Traces, expression, expression.len(), &catalogs);
        assert!(completion.suggestions.is_empty());
    }

    #[test]
    fn environment_aliases_share_the_environment_catalog() {
        let catalogs = ValueCatalogs {
            environments: vec!["prod".into(), "staging".into()],
            ..ValueCatalogs::default()
        };
        for expression in ["env = ", "environment = st", "deployment.environment = "] {
            let completion =
                engine().complete(VocabularyScope::Metrics, expression, expression.len(), &catalogs);
            let expected = if expression.ends_with("st") {
                vec!["staging"]
            } else {
                vec!["prod", "staging"]
            };
            assert_eq!(labels(&completion.suggestions), expected, "{expression}");
        }

        let expression = "env = pr";
        let completion =
            engine().complete(VocabularyScope::Traces, expression, expression.len(), &catalogs);
        let applied = apply_suggestion(expression, &completion.context, &completion.suggestions[0]);
        assert_eq!(applied.expression, "env = \"prod\" ");
    }

    #[test]
    fn span_name_and_commit_catalogs() {
        let catalogs = ValueCatalogs {
            span_names: vec!["GET /cart".into(), "POST /checkout".into()],
            commit_shas: vec!["9f2c1e0".into(), "a41b7d3".into()],
            ..ValueCatalogs::default()
        };

        let expression = "span.name = \"post";
        let completion =
            engine().complete(VocabularyScope::Traces, expression, expression.len(), &catalogs);
        assert_eq!(labels(&completion.suggestions), vec!["POST /checkout"]);
        assert_eq!(completion.suggestions[0].insert_text, "\"POST /checkout\"");

        let expression = "deployment.commit_sha = a4";
        let completion =
            engine().complete(VocabularyScope::Logs, expression, expression.len(), &catalogs);
        assert_eq!(labels(&completion.suggestions), vec!["a41b7d3"]);
        assert_eq!(completion.suggestions[0].insert_text, "\"a41b7d3\"");
    }

    #[test]
    fn caps_results() {
        let catalogs = ValueCatalogs {
            services: (0..20).map(|i| format!("svc-{i}")).collect(),
            ..ValueCatalogs::default()
        };
        let expression = "service.name = ";
        let engine = engine().with_max_suggestions(3);
        let completion = engine.complete(VocabularyScope::Traces, expression, expression.len(), &catalogs);
        assert_eq!(completion.suggestions.len(), 3);
    }

    #[test]
    fn applies_key_then_operator_then_value_then_conjunction() {
        let engine = engine();
        let catalogs = ValueCatalogs {
            services: vec!["checkout".into()],
            ..ValueCatalogs::default()
        };

        let completion = engine.complete(VocabularyScope::Traces, "serv", 4, &catalogs);
        let applied = apply_suggestion("serv", &completion.context, &completion.suggestions[0]);
        assert_eq!(applied.expression, "service.name ");
        assert_eq!(applied.cursor, 13);

        let completion = engine.complete(VocabularyScope::Traces, &applied.expression, applied.cursor, &catalogs);
        let applied = apply_suggestion(&applied.expression, &completion.context, &completion.suggestions[0]);
        assert_eq!(applied.expression, "service.name = ");
        assert_eq!(applied.cursor, 15);

        let completion = engine.complete(VocabularyScope::Traces, &applied.expression, applied.cursor, &catalogs);
        let applied = apply_suggestion(&applied.expression, &completion.context, &completion.suggestions[0]);
        assert_eq!(applied.expression, "service.name = \"checkout\" ");

        let completion = engine.complete(VocabularyScope::Traces, &applied.expression, applied.cursor, &catalogs);
        assert_eq!(completion.context.kind, ContextKind::Conjunction);
        let applied = apply_suggestion(&applied.expression, &completion.context, &completion.suggestions[0]);
        assert_eq!(applied.expression, "service.name = \"checkout\" AND ");
        assert_eq!(applied.cursor, applied.expression.len());
    }

    #[test]
    fn prefix_keys_do_not_get_trailing_space() {
        let context = parse_context("x = 1 AND at", 12);
        let suggestion = Suggestion::new(ContextKind::Key, "attr.", "attr.", None);
        let applied = apply_suggestion("x = 1 AND at", &context, &suggestion);
        assert_eq!(applied.expression, "x = 1 AND attr.");
        assert_eq!(applied.cursor, 15);
    }

    #[test]
    fn splice_in_the_middle_respects_following_whitespace() {
        let expression = "serv AND has_error = true";
        let context = parse_context(expression, 4);
        let suggestion = Suggestion::new(ContextKind::Key, "service.name", "service.name", None);
        let applied = apply_suggestion(expression, &context, &suggestion);
        assert_eq!(applied.expression, "service.name AND has_error = true");
        assert_eq!(applied.cursor, 12);
    }

    #[test]
    fn operator_splice_collapses_whitespace() {
        let expression = "service.name    \"x\"";
        let context = AutocompleteContext {
            kind: ContextKind::Operator,
            query: String::new(),
            key: Some("service.name".into()),
            replace_start: 13,
            replace_end: 13,
        };
        let suggestion = Suggestion::new(ContextKind::Operator, "=", "=", None);
        let applied = apply_suggestion(expression, &context, &suggestion);
        assert_eq!(applied.expression, "service.name = \"x\"");
        assert_eq!(applied.cursor, 15);
    }
}
