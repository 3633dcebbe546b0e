//! Integration tests for stored expression and query migration.

use std::borrow::Cow;

use kql_builder::expression::builders::*;
use kql_builder::expression::QueryExpression;
use kql_builder::migration::{
    detect_shape, load_expression, migrate, migrate_query, needs_migration, ExpressionShape,
};
use kql_builder::query::{QueryDefaults, ResultFormat, PLUGIN_VERSION};
use serde_json::{json, Value};

fn legacy_expression() -> Value {
    json!({
        "from": {"expression": {"type": "field", "value": "Events", "fieldType": "string"}},
        "where": {"type": "and", "expressions": [
            {"type": "operatorRepeater", "typeToRepeat": "fieldAndOperator", "expressions": [
                {"type": "fieldAndOperator",
                 "field": {"type": "field", "value": "Level", "fieldType": "string"},
                 "operator": {"name": "==", "value": "Error"}}
            ]}
        ]},
        "reduce": {"type": "and", "expressions": [
            {"type": "reduce",
             "field": {"type": "field", "value": "Duration", "fieldType": "number"},
             "reduce": {"type": "function", "value": "avg"}}
        ]},
        "groupBy": {"type": "and", "expressions": [
            {"type": "groupBy",
             "field": {"type": "field", "value": "Timestamp", "fieldType": "dateTime"},
             "interval": {"type": "interval", "value": "5m"}}
        ]}
    })
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn test_legacy_from_only() {
    let value = json!({"from": {"expression": {"type": "field", "value": "Events"}}});
    assert!(needs_migration(&value));

    let expression = load_expression(&value);
    assert_eq!(expression, QueryExpression::from_table("Events"));
    assert!(expression.r#where.is_empty());
    assert!(expression.reduce.is_empty());
    assert!(expression.group_by.is_empty());

    assert_eq!(
        *migrate(&value),
        json!({
            "from": {"type": "property", "property": {"name": "Events", "type": "string"}},
            "where": {"type": "and", "expressions": []},
            "reduce": {"type": "and", "expressions": []},
            "groupBy": {"type": "and", "expressions": []}
        })
    );
}

#[test]
fn test_legacy_expression_upgraded() {
    let expected = QueryExpression::from_table("Events")
        .with_where(and(vec![or(vec![filter(string("Level"), "==", "Error")])]))
        .with_reduce(and(vec![reduce(number("Duration"), "avg")]))
        .with_group_by(and(vec![bin(datetime("Timestamp"), "5m")]));

    assert_eq!(detect_shape(&legacy_expression()), ExpressionShape::Legacy);
    assert_eq!(load_expression(&legacy_expression()), expected);
}

#[test]
fn test_migrate_is_idempotent() {
    let value = legacy_expression();
    let once = migrate(&value).into_owned();
    let twice = migrate(&once);

    assert_eq!(*twice, once);
    assert!(!needs_migration(&once));
    match twice {
        Cow::Borrowed(same) => assert!(std::ptr::eq(same, &once)),
        Cow::Owned(_) => panic!("current expression was copied"),
    }
}

#[test]
fn test_current_expression_returned_as_is() {
    let current = serde_json::to_value(
        QueryExpression::from_table("Events").with_where(and(vec![or(vec![check(string("Host"), "isnotempty")])])),
    )
    .unwrap();
    match migrate(&current) {
        Cow::Borrowed(same) => assert!(std::ptr::eq(same, &current)),
        Cow::Owned(_) => panic!("current expression was copied"),
    }
}

#[test]
fn test_unrecognized_fragments_dropped() {
    let value = json!({
        "from": {"expression": {"type": "field", "value": "Events"}},
        "where": {"type": "and", "expressions": [
            {"type": "fieldAndOperator", "operator": {"name": "=="}},
            {"type": "somethingElse", "value": 1}
        ]}
    });
    let expression = load_expression(&value);
    assert_eq!(expression.source_name(), Some("Events"));
    assert!(expression.r#where.is_empty());
}

#[test]
fn test_unknown_property_type_reads_as_string() {
    let value = json!({
        "from": {"type": "property", "property": {"name": "Events", "type": "string"}},
        "where": {"type": "and", "expressions": [
            {"type": "or", "expressions": [
                {"type": "operator", "property": {"name": "Level", "type": "string"},
                 "operator": {"name": "==", "value": "Error"}}
            ]},
            {"type": "or", "expressions": [
                {"type": "operator", "property": {"name": "SessionId", "type": "guid"},
                 "operator": {"name": "==", "value": "abc"}}
            ]}
        ]},
        "reduce": {"type": "and", "expressions": []},
        "groupBy": {"type": "and", "expressions": []}
    });

    let expression = load_expression(&value);
    assert_eq!(expression.r#where.len(), 2);
    assert_eq!(
        expression.r#where.expressions[1],
        or(vec![filter(string("SessionId"), "==", "abc")])
    );
}

// ============================================================================
// Stored queries
// ============================================================================

fn defaults() -> QueryDefaults {
    QueryDefaults {
        database: "Samples".into(),
        cluster_uri: "https://help.kusto.windows.net".into(),
        result_format: ResultFormat::Table,
        query: String::new(),
    }
}

#[test]
fn test_stored_query_upgraded_once() {
    let stored = json!({
        "refId": "A",
        "resultFormat": "time_series",
        "expression": legacy_expression()
    });

    let once = migrate_query(&stored, &defaults()).into_owned();
    assert_eq!(once["database"], "Samples");
    assert_eq!(once["clusterUri"], "https://help.kusto.windows.net");
    assert_eq!(once["resultFormat"], "time_series");
    assert_eq!(once["rawMode"], false);
    assert_eq!(once["querySource"], "builder");
    assert_eq!(once["pluginVersion"], PLUGIN_VERSION);
    assert_eq!(once["expression"]["from"]["property"]["name"], "Events");

    let twice = migrate_query(&once, &defaults());
    assert!(matches!(twice, Cow::Borrowed(_)));
    assert_eq!(*twice, once);
}

#[test]
fn test_old_plugin_version_restamped() {
    let stored = json!({
        "refId": "A",
        "database": "Samples",
        "clusterUri": "https://help.kusto.windows.net",
        "query": "",
        "resultFormat": "table",
        "rawMode": true,
        "querySource": "raw",
        "pluginVersion": "0.0.1",
        "expression": {}
    });
    let migrated = migrate_query(&stored, &defaults());
    assert!(matches!(migrated, Cow::Owned(_)));
    assert_eq!(migrated["pluginVersion"], PLUGIN_VERSION);
    assert_eq!(migrated["rawMode"], true);
}

#[test]
fn test_null_raw_mode_and_bad_source_repaired() {
    let mut current = migrate_query(
        &json!({"refId": "A", "expression": legacy_expression()}),
        &defaults(),
    )
    .into_owned();
    current["rawMode"] = Value::Null;
    current["querySource"] = json!(7);

    let repaired = migrate_query(&current, &defaults());
    assert!(matches!(repaired, Cow::Owned(_)));
    assert_eq!(repaired["rawMode"], false);
    assert_eq!(repaired["querySource"], "builder");

    let again = migrate_query(&repaired, &defaults());
    assert!(matches!(again, Cow::Borrowed(_)));
}
