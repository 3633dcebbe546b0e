//! Quoting, escaping and literal recognition for KQL.

use std::sync::LazyLock;

use regex::Regex;

static BARE_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

static TEMPLATE_VARIABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$(\{[A-Za-z0-9_.:]+\}|[A-Za-z_][A-Za-z0-9_]*)$").unwrap()
});

static TIMESPAN_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+(\.\d+)?(d|h|m|s|ms|microseconds?|ticks?)$").unwrap()
});

/// Words that cannot appear as bare identifiers.
const RESERVED: &[&str] = &[
    "and", "or", "not", "where", "by", "summarize", "take", "limit", "project", "extend",
    "in", "has", "contains", "between", "true", "false", "let", "datetime", "timespan",
    "dynamic", "bin", "database", "table", "with", "on", "join", "union", "sort", "order",
];

// =============================================================================
// Identifiers
// =============================================================================

/// Whether `name` can be written without brackets.
pub fn is_bare_identifier(name: &str) -> bool {
    BARE_IDENTIFIER.is_match(name) && !RESERVED.contains(&name.to_ascii_lowercase().as_str())
}

/// Quote an identifier when it is not a legal bare identifier.
///
/// `Events` stays `Events`; `my table` becomes `['my table']`.
pub fn quote_identifier(name: &str) -> String {
    if is_bare_identifier(name) {
        name.to_string()
    } else {
        format!("['{}']", name.replace('\\', "\\\\").replace('\'', "\\'"))
    }
}

// =============================================================================
// Literals
// =============================================================================

/// Quote a string literal with double quotes.
pub fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

pub fn format_bool(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

/// Format a real number. Non-finite values use KQL's `real(...)` form.
pub fn format_real(f: f64) -> String {
    if f.is_nan() {
        return "real(nan)".into();
    }
    if f.is_infinite() {
        return if f > 0.0 { "real(+inf)".into() } else { "real(-inf)".into() };
    }
    let mut buffer = ryu::Buffer::new();
    buffer.format(f).to_string()
}

/// Parse a boolean the way users type it.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

pub fn is_template_variable(s: &str) -> bool {
    TEMPLATE_VARIABLE.is_match(s.trim())
}

pub fn is_timespan_literal(s: &str) -> bool {
    TIMESPAN_LITERAL.is_match(s.trim())
}

/// Whether the text is a call to one of KQL's relative-time functions.
pub fn is_relative_time(s: &str) -> bool {
    let s = s.trim();
    s == "now()" || (s.starts_with("ago(") && s.ends_with(')') && is_timespan_literal(&s[4..s.len() - 1]))
}
