//! Bidirectional mapping between structured filter fields and the where-clause text.

use crate::parser::{split_clauses, unescape_quoted};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const ATTRIBUTE_PREFIX: &str = "attr.";
pub const RESOURCE_PREFIX: &str = "resource.";

static CLAUSE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^([a-zA-Z0-9_.-]+)\s*=\s*(?:"((?:[^"\\]|\\.)*)"|'([^']*)'|(\S+))$"#)
        .expect("clause pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeFilter {
    pub key: String,
    pub value: String,
}

/// Filter fields owned by the where-clause codec. `None` means "not specified".
///
/// `has_error` is only ever recorded as `Some(true)` and `root_only` only as `Some(false)`;
/// the opposite literal is the default and parses as absence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_error: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_duration_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_duration_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<AttributeFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<AttributeFilter>,
}

impl FilterFields {
    pub fn is_empty(&self) -> bool {
        self == &FilterFields::default()
    }

    /// Fields specified in `patch` win; everything else keeps the value from `self`.
    pub fn merged_with(&self, patch: &FilterFields) -> FilterFields {
        FilterFields {
            service: patch.service.clone().or_else(|| self.service.clone()),
            span_name: patch.span_name.clone().or_else(|| self.span_name.clone()),
            environment: patch.environment.clone().or_else(|| self.environment.clone()),
            commit_sha: patch.commit_sha.clone().or_else(|| self.commit_sha.clone()),
            severity: patch.severity.clone().or_else(|| self.severity.clone()),
            http_method: patch.http_method.clone().or_else(|| self.http_method.clone()),
            http_status_code: patch
                .http_status_code
                .clone()
                .or_else(|| self.http_status_code.clone()),
            has_error: patch.has_error.or(self.has_error),
            root_only: patch.root_only.or(self.root_only),
            min_duration_ms: patch.min_duration_ms.or(self.min_duration_ms),
            max_duration_ms: patch.max_duration_ms.or(self.max_duration_ms),
            attribute: patch.attribute.clone().or_else(|| self.attribute.clone()),
            resource: patch.resource.clone().or_else(|| self.resource.clone()),
        }
    }
}

/// Filter state attached to a query: the codec-owned fields plus state the where clause
/// never touches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterBag {
    #[serde(flatten)]
    pub fields: FilterFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_type: Option<String>,
    /// Free-text search term (logs body search).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedWhereClause {
    pub fields: FilterFields,
    /// Set when a clause is still being typed or carries a malformed boolean/number.
    pub has_incomplete_clauses: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppliedWhereClause {
    pub filters: FilterBag,
    pub has_incomplete_clauses: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FieldKey {
    Service,
    SpanName,
    Environment,
    CommitSha,
    Severity,
    HttpMethod,
    HttpStatusCode,
    HasError,
    RootOnly,
    MinDurationMs,
    MaxDurationMs,
    Attribute(String),
    Resource(String),
}

impl FieldKey {
    fn classify(raw: &str) -> Option<FieldKey> {
        let canonical = normalize_key(raw);
        let key = match canonical.as_str() {
            "service.name" => FieldKey::Service,
            "span.name" => FieldKey::SpanName,
            "deployment.environment" => FieldKey::Environment,
            "deployment.commit_sha" => FieldKey::CommitSha,
            "severity" => FieldKey::Severity,
            "http.method" => FieldKey::HttpMethod,
            "http.status_code" => FieldKey::HttpStatusCode,
            "has_error" => FieldKey::HasError,
            "root_only" => FieldKey::RootOnly,
            "min_duration_ms" => FieldKey::MinDurationMs,
            "max_duration_ms" => FieldKey::MaxDurationMs,
            other => {
                if let Some(name) = other.strip_prefix(ATTRIBUTE_PREFIX) {
                    FieldKey::Attribute(name.to_string())
                } else if let Some(name) = other.strip_prefix(RESOURCE_PREFIX) {
                    FieldKey::Resource(name.to_string())
                } else {
                    return None;
                }
            }
        };
        Some(key)
    }
}

/// Canonical spelling of a filter key. Aliases collapse onto their canonical key; the suffix of
/// `attr.*`/`resource.*` keys keeps its original case.
pub fn normalize_key(raw: &str) -> String {
    let trimmed = raw.trim();
    let lower = trimmed.to_lowercase();

    for prefix in [ATTRIBUTE_PREFIX, RESOURCE_PREFIX] {
        if lower.starts_with(prefix) {
            return format!("{prefix}{}", &trimmed[prefix.len()..]);
        }
    }

    match lower.as_str() {
        "service" => "service.name".to_string(),
        "span_name" => "span.name".to_string(),
        "environment" | "env" => "deployment.environment".to_string(),
        "commit_sha" => "deployment.commit_sha".to_string(),
        "severity_text" => "severity".to_string(),
        _ => lower,
    }
}

/// Double-quotes a value, escaping backslashes and quotes.
pub fn quote_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        if ch == '\\' || ch == '"' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

pub fn parse_where_clause(expression: &str) -> ParsedWhereClause {
    let mut parsed = ParsedWhereClause::default();

    for clause in split_clauses(expression) {
        if !record_clause(&mut parsed.fields, clause) {
            parsed.has_incomplete_clauses = true;
        }
    }

    parsed
}

/// Records one clause; returns false when the clause must be flagged as incomplete.
fn record_clause(fields: &mut FilterFields, clause: &str) -> bool {
    let Some(caps) = CLAUSE_PATTERN.captures(clause) else {
        return false;
    };

    let value = if let Some(quoted) = caps.get(2) {
        unescape_quoted(quoted.as_str())
    } else if let Some(quoted) = caps.get(3) {
        quoted.as_str().to_string()
    } else {
        let bare = caps.get(4).map(|m| m.as_str()).unwrap_or_default();
        if bare.starts_with(['"', '\'']) {
            return false;
        }
        bare.to_string()
    };

    let Some(key) = FieldKey::classify(&caps[1]) else {
        return true;
    };

    match key {
        FieldKey::Service => set_text(&mut fields.service, value),
        FieldKey::SpanName => set_text(&mut fields.span_name, value),
        FieldKey::Environment => set_text(&mut fields.environment, value),
        FieldKey::CommitSha => set_text(&mut fields.commit_sha, value),
        FieldKey::Severity => set_text(&mut fields.severity, value),
        FieldKey::HttpMethod => set_text(&mut fields.http_method, value),
        FieldKey::HttpStatusCode => set_text(&mut fields.http_status_code, value),
        FieldKey::HasError => match parse_bool(&value) {
            Some(true) => fields.has_error = Some(true),
            Some(false) => {}
            None => return false,
        },
        FieldKey::RootOnly => match parse_bool(&value) {
            Some(false) => fields.root_only = Some(false),
            Some(true) => {}
            None => return false,
        },
        FieldKey::MinDurationMs => match parse_number(&value) {
            Some(number) => fields.min_duration_ms = Some(number),
            None => return false,
        },
        FieldKey::MaxDurationMs => match parse_number(&value) {
            Some(number) => fields.max_duration_ms = Some(number),
            None => return false,
        },
        FieldKey::Attribute(name) => return set_attribute(&mut fields.attribute, name, value),
        FieldKey::Resource(name) => return set_attribute(&mut fields.resource, name, value),
    }

    true
}

fn set_text(slot: &mut Option<String>, value: String) {
    if !value.is_empty() {
        *slot = Some(value);
    }
}

fn set_attribute(slot: &mut Option<AttributeFilter>, key: String, value: String) -> bool {
    if key.is_empty() {
        return false;
    }
    if slot.is_none() && !value.is_empty() {
        *slot = Some(AttributeFilter { key, value });
    }
    true
}

fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Renders populated fields in a fixed order; `None` when nothing is populated.
pub fn serialize_where_clause(fields: &FilterFields) -> Option<String> {
    let mut clauses = Vec::new();

    let text_fields = [
        ("service.name", &fields.service),
        ("span.name", &fields.span_name),
        ("deployment.environment", &fields.environment),
        ("deployment.commit_sha", &fields.commit_sha),
        ("severity", &fields.severity),
        ("http.method", &fields.http_method),
        ("http.status_code", &fields.http_status_code),
    ];
    for (key, value) in text_fields {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            clauses.push(format!("{key} = {}", quote_value(value)));
        }
    }

    if fields.has_error == Some(true) {
        clauses.push("has_error = true".to_string());
    }
    if fields.root_only == Some(false) {
        clauses.push("root_only = false".to_string());
    }
    if let Some(ms) = fields.min_duration_ms.filter(|n| n.is_finite()) {
        clauses.push(format!("min_duration_ms = {ms}"));
    }
    if let Some(ms) = fields.max_duration_ms.filter(|n| n.is_finite()) {
        clauses.push(format!("max_duration_ms = {ms}"));
    }
    if let Some(attr) = &fields.attribute {
        clauses.push(format!(
            "{ATTRIBUTE_PREFIX}{} = {}",
            attr.key,
            quote_value(&attr.value)
        ));
    }
    if let Some(res) = &fields.resource {
        clauses.push(format!(
            "{RESOURCE_PREFIX}{} = {}",
            res.key,
            quote_value(&res.value)
        ));
    }

    if clauses.is_empty() {
        None
    } else {
        Some(clauses.join(" AND "))
    }
}

/// Applies an edited where clause to existing filter state.
///
/// Fields the expression specifies overwrite prior values; unspecified fields are kept. An
/// empty expression clears every codec-owned field and leaves the rest of the bag alone.
pub fn apply_where_clause(current: &FilterBag, expression: &str) -> AppliedWhereClause {
    if expression.trim().is_empty() {
        return AppliedWhereClause {
            filters: FilterBag {
                fields: FilterFields::default(),
                ..current.clone()
            },
            has_incomplete_clauses: false,
        };
    }

    let parsed = parse_where_clause(expression);
    AppliedWhereClause {
        filters: FilterBag {
            fields: current.fields.merged_with(&parsed.fields),
            ..current.clone()
        },
        has_incomplete_clauses: parsed.has_incomplete_clauses,
    }
}
