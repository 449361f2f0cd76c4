use pretty_assertions::assert_eq;
use serial_test::serial;
use std::env;
use telemetry_query::{
    autocomplete::{apply_suggestion, AutocompleteEngine, ValueCatalogs, VocabularyScope},
    config::AppConfig,
    filters::{apply_where_clause, parse_where_clause, FilterBag},
    parser::ContextKind,
    query::{DataSource, QueryDraft},
    time::TimeRange,
};

fn catalogs() -> ValueCatalogs {
    ValueCatalogs {
        services: vec!["checkout".into(), "cart".into(), "payments".into()],
        severities: vec!["ERROR".into(), "WARN".into(), "INFO".into()],
        attribute_keys: vec![
            "http.response.header.content_type".into(),
            "http.route".into(),
        ],
        ..ValueCatalogs::default()
    }
}

/// Types `typed` at the caret, then accepts the first suggestion.
fn accept_first(
    engine: &AutocompleteEngine,
    scope: VocabularyScope,
    expression: &str,
    typed: &str,
) -> (String, usize) {
    let expression = format!("{expression}{typed}");
    let completion = engine.complete(scope, &expression, expression.len(), &catalogs());
    let suggestion = completion
        .suggestions
        .first()
        .unwrap_or_else(|| panic!("no suggestion for {expression:?}"));
    let applied = apply_suggestion(&expression, &completion.context, suggestion);
    (applied.expression, applied.cursor)
}

#[test]
fn typing_a_full_log_filter() {
    let engine = AutocompleteEngine::default();
    let scope = VocabularyScope::from(DataSource::Logs);

    let (expr, _) = accept_first(&engine, scope, "", "sev");
    assert_eq!(expr, "severity ");
    let (expr, _) = accept_first(&engine, scope, &expr, "");
    assert_eq!(expr, "severity = ");
    let (expr, _) = accept_first(&engine, scope, &expr, "er");
    assert_eq!(expr, "severity = \"ERROR\" ");
    let (expr, _) = accept_first(&engine, scope, &expr, "a");
    assert_eq!(expr, "severity = \"ERROR\" AND ");
    let (expr, _) = accept_first(&engine, scope, &expr, "serv");
    let (expr, _) = accept_first(&engine, scope, &expr, "");
    let (expr, cursor) = accept_first(&engine, scope, &expr, "pay");
    assert_eq!(expr, "severity = \"ERROR\" AND service.name = \"payments\" ");
    assert_eq!(cursor, expr.len());

    let parsed = parse_where_clause(&expr);
    assert!(!parsed.has_incomplete_clauses);
    assert_eq!(parsed.fields.severity.as_deref(), Some("ERROR"));
    assert_eq!(parsed.fields.service.as_deref(), Some("payments"));
}

#[test]
fn quoted_conjunction_stays_inside_the_value() {
    let expression = "service.name = \"A AND B\"";
    let completion = AutocompleteEngine::default().complete(
        VocabularyScope::Traces,
        expression,
        expression.len(),
        &catalogs(),
    );
    assert_eq!(completion.context.kind, ContextKind::Conjunction);

    let parsed = parse_where_clause(expression);
    assert_eq!(parsed.fields.service.as_deref(), Some("A AND B"));
}

#[test]
fn attribute_prefix_switches_to_discovered_keys() {
    let engine = AutocompleteEngine::default();
    let completion = engine.complete(VocabularyScope::Traces, "attr.", 5, &catalogs());
    let labels: Vec<_> = completion
        .suggestions
        .iter()
        .map(|s| s.label.as_str())
        .collect();
    assert_eq!(
        labels,
        vec!["attr.http.route", "attr.http.response.header.content_type"]
    );
}

#[test]
fn edited_clause_compiles_through_a_draft() {
    let current = FilterBag {
        metric_name: Some("http.server.duration".into()),
        ..FilterBag::default()
    };
    let applied = apply_where_clause(&current, "service = checkout AND env = staging AND attr.");
    assert!(applied.has_incomplete_clauses);
    assert_eq!(applied.filters.metric_name.as_deref(), Some("http.server.duration"));

    let mut draft = QueryDraft::new(DataSource::Traces, 0);
    draft.set_filters(&applied.filters.fields);
    assert_eq!(
        draft.where_clause,
        "service.name = \"checkout\" AND deployment.environment = \"staging\""
    );

    let range = TimeRange::parse("2025-01-01T00:00:00Z", "2025-01-01T01:00:00Z").unwrap();
    let request = draft
        .timeseries_request(&range, &AppConfig::embedded())
        .expect("draft compiles");
    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(
        json["query"]["filters"],
        serde_json::json!({"service": "checkout", "environment": "staging"})
    );
}

#[test]
#[serial]
fn noisy_prefixes_come_from_the_environment() {
    env::set_var("TELEMETRY_QUERY_NOISY_ATTRIBUTE_PREFIXES", "http.route");
    env::set_var("TELEMETRY_QUERY_MAX_SUGGESTIONS", "1");
    let config = AppConfig::from_env();
    env::remove_var("TELEMETRY_QUERY_NOISY_ATTRIBUTE_PREFIXES");
    env::remove_var("TELEMETRY_QUERY_MAX_SUGGESTIONS");

    let engine = AutocompleteEngine::new(&config.expect("config loads"));
    let completion = engine.complete(VocabularyScope::Traces, "attr.http", 9, &catalogs());
    assert_eq!(completion.suggestions.len(), 1);
    assert_eq!(
        completion.suggestions[0].label,
        "attr.http.response.header.content_type"
    );
}
