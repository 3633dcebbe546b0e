//! Integration tests for expression → KQL compilation.

use insta::assert_snapshot;
use kql_builder::catalog::PropertyType;
use kql_builder::expression::builders::*;
use kql_builder::kql::{compile, compile_with, CompileContext, CompileOptions, CompileWarning};
use kql_builder::schema::{ColumnSchema, ResolvedTableSchema};

fn events() -> ResolvedTableSchema {
    ResolvedTableSchema::new(vec![
        ColumnSchema::new("Timestamp", "datetime"),
        ColumnSchema::new("Level", "string"),
        ColumnSchema::new("Host", "string"),
        ColumnSchema::new("Duration", "real"),
        ColumnSchema::new("Props", "dynamic"),
    ])
}

fn error_counts() -> QueryExpression {
    QueryExpression::from_table("Events")
        .with_where(and(vec![or(vec![filter(string("Level"), "==", "Error")])]))
        .with_reduce(and(vec![reduce(string("*"), "count")]))
        .with_group_by(and(vec![bin(datetime("Timestamp"), "5m")]))
}

// ============================================================================
// Canonical queries
// ============================================================================

#[test]
fn test_error_count_per_bin() {
    assert_eq!(
        compile(&error_counts(), &events(), "Samples"),
        r#"Events | where (Level == "Error") | summarize count() by bin(Timestamp, 5m)"#
    );
}

#[test]
fn test_compile_is_deterministic() {
    let schema = events();
    let expr = error_counts();
    let first = compile(&expr, &schema, "Samples");
    for _ in 0..10 {
        assert_eq!(compile(&expr, &schema, "Samples"), first);
    }
}

#[test]
fn test_full_query_snapshot() {
    let expr = QueryExpression::from_table("Events")
        .with_where(and(vec![
            or(vec![
                filter(string("Level"), "==", "Error"),
                filter(string("Level"), "==", "Warning"),
            ]),
            or(vec![filter_list(string("Host"), "!in", vec!["db-1", "db-2"])]),
            or(vec![filter(number("Duration"), ">=", 1.5)]),
            or(vec![filter(string("Props.region"), "startswith", "eu")]),
        ]))
        .with_reduce(and(vec![
            reduce(number("Duration"), "avg"),
            reduce_with(
                number("Duration"),
                "percentile",
                vec![param("percentile", 99, PropertyType::Number)],
            ),
        ]))
        .with_group_by(and(vec![group(string("Host")), bin(datetime("Timestamp"), "1h")]));

    assert_snapshot!(
        compile(&expr, &events(), "Samples"),
        @r#"Events | where (Level == "Error" or Level == "Warning") and (Host !in ("db-1", "db-2")) and (Duration >= 1.5) and (tostring(Props["region"]) startswith "eu") | summarize avg(Duration), percentile(Duration, 99) by Host, bin(Timestamp, 1h)"#
    );
}

// ============================================================================
// Literal typing
// ============================================================================

#[test]
fn test_number_operands_never_quoted() {
    let expr = QueryExpression::from_table("Events")
        .with_where(and(vec![or(vec![filter(number("Duration"), "<", "250")])]));
    let kql = compile(&expr, &events(), "Samples");
    assert!(kql.ends_with("(Duration < 250)"), "{kql}");
}

#[test]
fn test_string_operands_always_quoted() {
    let expr = QueryExpression::from_table("Events")
        .with_where(and(vec![or(vec![filter(string("Host"), "==", 250)])]));
    let kql = compile(&expr, &events(), "Samples");
    assert!(kql.ends_with(r#"(Host == "250")"#), "{kql}");
}

#[test]
fn test_string_escaping() {
    let expr = QueryExpression::from_table("Events")
        .with_where(and(vec![or(vec![filter(string("Host"), "==", r#"a"b\c"#)])]));
    let kql = compile(&expr, &events(), "Samples");
    assert!(kql.ends_with(r#"(Host == "a\"b\\c")"#), "{kql}");
}

// ============================================================================
// Degraded output
// ============================================================================

#[test]
fn test_unsupported_operator_keeps_rest_of_query() {
    let schema = events();
    let expr = QueryExpression::from_table("Events")
        .with_where(and(vec![
            or(vec![filter(number("Duration"), "has", "x")]),
            or(vec![filter(string("Level"), "==", "Error")]),
        ]))
        .with_reduce(and(vec![reduce(string("*"), "count")]));

    let out = compile_with(&expr, &CompileContext::new(&schema, "Samples"));
    assert_snapshot!(
        out.query,
        @r#"Events | where (/* unsupported: has on Number column Duration */) and (Level == "Error") | summarize count()"#
    );
    assert_eq!(out.warnings.len(), 1);
    assert!(matches!(out.warnings[0], CompileWarning::UnsupportedOperator { .. }));
}

#[test]
fn test_empty_schema_still_compiles() {
    let empty = ResolvedTableSchema::default();
    let ctx = CompileContext::new(&empty, "Samples").with_options(CompileOptions::default().with_time_filter(true));
    let out = compile_with(&error_counts(), &ctx);
    assert_eq!(
        out.query,
        r#"Events | where (Level == "Error") | summarize count() by bin(Timestamp, 5m)"#
    );
    assert!(out.warnings.is_empty());
}
