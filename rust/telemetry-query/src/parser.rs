//! Cursor-aware scanner for where-clause expressions such as
//! `service.name = "checkout" AND has_error = true`.
//!
//! The scanner answers two questions for the editor: which grammatical slot the cursor sits in
//! (key, operator, value or conjunction) and which byte range a suggestion should replace.
//! It never fails; half-typed input simply maps to the slot being typed.

use serde::Serialize;

const CONJUNCTION: &str = "and";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextKind {
    Key,
    Operator,
    Value,
    Conjunction,
}

impl ContextKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ContextKind::Key => "key",
            ContextKind::Operator => "operator",
            ContextKind::Value => "value",
            ContextKind::Conjunction => "conjunction",
        }
    }
}

/// Grammatical slot under the cursor plus the byte range `[replace_start, replace_end)` a
/// suggestion replaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutocompleteContext {
    pub kind: ContextKind,
    /// Partial text already typed for the slot.
    pub query: String,
    /// Key of the active clause once one has been typed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub replace_start: usize,
    pub replace_end: usize,
}

impl AutocompleteContext {
    fn new(kind: ContextKind, query: &str, key: Option<&str>, start: usize, end: usize) -> Self {
        Self {
            kind,
            query: query.to_string(),
            key: key.map(str::to_string),
            replace_start: start,
            replace_end: end,
        }
    }
}

/// Clamps a byte offset into `[0, len]` and floors it onto a char boundary.
pub fn clamp_cursor(expression: &str, cursor: usize) -> usize {
    let mut cursor = cursor.min(expression.len());
    while !expression.is_char_boundary(cursor) {
        cursor -= 1;
    }
    cursor
}

/// Determines the autocomplete slot for `cursor` (a byte offset into `expression`).
pub fn parse_context(expression: &str, cursor: usize) -> AutocompleteContext {
    let cursor = clamp_cursor(expression, cursor);
    let text = &expression[..cursor];

    let segment_start = conjunction_positions(text)
        .last()
        .map(|pos| pos + CONJUNCTION.len())
        .unwrap_or(0);
    let segment = &text[segment_start..];
    let body_start = segment_start + (segment.len() - segment.trim_start().len());
    let body = &text[body_start..];

    if body.is_empty() {
        return AutocompleteContext::new(ContextKind::Key, "", None, cursor, cursor);
    }

    match find_unquoted(body, '=') {
        None => key_or_operator(body, body_start, cursor),
        Some(eq) => value_tail(body[..eq].trim(), &body[eq + 1..], cursor),
    }
}

/// Splits an expression on top-level `AND` conjunctions. Clauses are trimmed; an empty or
/// whitespace-only expression yields no clauses.
pub fn split_clauses(expression: &str) -> Vec<&str> {
    if expression.trim().is_empty() {
        return Vec::new();
    }

    let mut clauses = Vec::new();
    let mut start = 0usize;
    for pos in conjunction_positions(expression) {
        clauses.push(expression[start..pos].trim());
        start = pos + CONJUNCTION.len();
    }
    clauses.push(expression[start..].trim());
    clauses
}

/// Resolves backslash escapes inside a quoted literal body.
pub fn unescape_quoted(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut escape = false;
    for ch in raw.chars() {
        if escape {
            out.push(ch);
            escape = false;
        } else if ch == '\\' {
            escape = true;
        } else {
            out.push(ch);
        }
    }
    if escape {
        out.push('\\');
    }
    out
}

fn key_or_operator(body: &str, body_start: usize, cursor: usize) -> AutocompleteContext {
    match body.find(char::is_whitespace) {
        None => AutocompleteContext::new(ContextKind::Key, body, None, body_start, cursor),
        Some(split) => {
            let key = &body[..split];
            let typed = body[split..].trim_start();
            AutocompleteContext::new(
                ContextKind::Operator,
                typed,
                Some(key),
                cursor - typed.len(),
                cursor,
            )
        }
    }
}

fn value_tail(key: &str, tail: &str, cursor: usize) -> AutocompleteContext {
    let value = tail.trim_start();
    let value_start = cursor - value.len();

    let Some(first) = value.chars().next() else {
        return AutocompleteContext::new(ContextKind::Value, "", Some(key), cursor, cursor);
    };

    if first == '"' || first == '\'' {
        let inner = &value[first.len_utf8()..];
        return match closing_quote(inner, first) {
            None => AutocompleteContext {
                kind: ContextKind::Value,
                query: if first == '"' {
                    unescape_quoted(inner)
                } else {
                    inner.to_string()
                },
                key: Some(key.to_string()),
                replace_start: value_start,
                replace_end: cursor,
            },
            Some(close) => conjunction_tail(key, &inner[close + first.len_utf8()..], cursor),
        };
    }

    match value.find(char::is_whitespace) {
        None => AutocompleteContext::new(ContextKind::Value, value, Some(key), value_start, cursor),
        Some(split) => conjunction_tail(key, &value[split..], cursor),
    }
}

fn conjunction_tail(key: &str, trailing: &str, cursor: usize) -> AutocompleteContext {
    let typed = trailing.trim_start();
    AutocompleteContext::new(
        ContextKind::Conjunction,
        typed,
        Some(key),
        cursor - typed.len(),
        cursor,
    )
}

/// Tracks whether the scan is inside a quoted literal.
///
/// A quote only opens a literal at the start of a token (after whitespace, `=` or at the start
/// of the text); a quote inside a bare token such as `O'Brien` is an ordinary char. Backslash
/// escapes apply inside `"..."` only, matching the clause pattern.
#[derive(Debug, Default)]
struct QuoteScanner {
    quote: Option<char>,
    escape: bool,
    prev: Option<char>,
}

impl QuoteScanner {
    /// Feeds one char; returns true when it sits outside every quoted literal.
    fn step(&mut self, ch: char) -> bool {
        let prev = self.prev.replace(ch);

        if let Some(q) = self.quote {
            if self.escape {
                self.escape = false;
            } else if ch == '\\' && q == '"' {
                self.escape = true;
            } else if ch == q {
                self.quote = None;
            }
            return false;
        }

        if (ch == '"' || ch == '\'') && starts_token(prev) {
            self.quote = Some(ch);
            return false;
        }
        true
    }
}

fn starts_token(prev: Option<char>) -> bool {
    prev.map_or(true, |p| p.is_whitespace() || p == '=')
}

/// Byte offsets of every standalone, unquoted `AND` (any case) with whitespace on both sides.
fn conjunction_positions(text: &str) -> Vec<usize> {
    let bytes = text.as_bytes();
    let mut scanner = QuoteScanner::default();
    let mut positions = Vec::new();
    let mut prev: Option<char> = None;

    for (idx, ch) in text.char_indices() {
        let outside = scanner.step(ch);
        if outside
            && ch.eq_ignore_ascii_case(&'a')
            && prev.is_some_and(char::is_whitespace)
            && bytes.len() > idx + CONJUNCTION.len()
            && bytes[idx..idx + CONJUNCTION.len()].eq_ignore_ascii_case(CONJUNCTION.as_bytes())
            && text[idx + CONJUNCTION.len()..]
                .chars()
                .next()
                .is_some_and(char::is_whitespace)
        {
            positions.push(idx);
        }
        prev = Some(ch);
    }

    positions
}

fn find_unquoted(text: &str, target: char) -> Option<usize> {
    let mut scanner = QuoteScanner::default();
    text.char_indices()
        .find(|&(_, ch)| scanner.step(ch) && ch == target)
        .map(|(idx, _)| idx)
}

fn closing_quote(text: &str, quote: char) -> Option<usize> {
    let mut escape = false;
    for (idx, ch) in text.char_indices() {
        if escape {
            escape = false;
        } else if ch == '\\' && quote == '"' {
            escape = true;
        } else if ch == quote {
            return Some(idx);
        }
    }
    None
}
