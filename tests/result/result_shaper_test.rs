//! Integration tests for result shaping.

use kql_builder::query::ResultFormat;
use kql_builder::result::{shape, FieldValues, FormatError, Notice, RawTable};
use serde_json::json;

fn tables(value: serde_json::Value) -> Vec<RawTable> {
    serde_json::from_value(value).unwrap()
}

fn metrics() -> Vec<RawTable> {
    tables(json!([{
        "name": "PrimaryResult",
        "columns": [
            {"name": "Timestamp", "type": "datetime", "values": [
                "2024-01-01T00:00:00Z", "2024-01-01T00:05:00Z", "2024-01-01T00:10:00Z"
            ]},
            {"name": "Requests", "type": "long", "values": [10, 12, 9]},
            {"name": "Latency", "type": "real", "values": [0.25, 0.5, null]}
        ]
    }]))
}

// ============================================================================
// time_series
// ============================================================================

#[test]
fn test_two_numeric_columns_two_series() {
    let shaped = shape(&metrics(), ResultFormat::TimeSeries).unwrap();
    assert_eq!(shaped.frames.len(), 2);

    let names: Vec<_> = shaped.frames.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["Requests", "Latency"]);

    let latency = shaped.frames[1].field("Latency").unwrap();
    assert_eq!(latency.values, FieldValues::Number(vec![Some(0.25), Some(0.5), None]));
    assert!(!shaped.time_not_ascending());
}

#[test]
fn test_no_datetime_column_is_error() {
    let input = tables(json!([{
        "name": "PrimaryResult",
        "columns": [
            {"name": "Host", "type": "string", "values": ["a"]},
            {"name": "Requests", "type": "long", "values": [1]}
        ]
    }]));
    assert_eq!(shape(&input, ResultFormat::TimeSeries), Err(FormatError::NoTimeColumn));
}

#[test]
fn test_no_numeric_column_is_error() {
    let input = tables(json!([{
        "columns": [
            {"name": "Timestamp", "type": "datetime", "values": ["2024-01-01T00:00:00Z"]},
            {"name": "Host", "type": "string", "values": ["a"]}
        ]
    }]));
    assert_eq!(shape(&input, ResultFormat::TimeSeries), Err(FormatError::NoValueColumn));
}

#[test]
fn test_string_columns_become_labels() {
    let input = tables(json!([{
        "columns": [
            {"name": "Timestamp", "type": "datetime", "values": [
                "2024-01-01T00:00:00Z", "2024-01-01T00:00:00Z", "2024-01-01T00:05:00Z"
            ]},
            {"name": "Region", "type": "string", "values": ["eu", "us", "eu"]},
            {"name": "Host", "type": "string", "values": ["a", "b", "a"]},
            {"name": "Requests", "type": "long", "values": [1, 2, 3]}
        ]
    }]));
    let shaped = shape(&input, ResultFormat::TimeSeries).unwrap();
    let names: Vec<_> = shaped.frames.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["Requests { Region=eu, Host=a }", "Requests { Region=us, Host=b }"]);
}

#[test]
fn test_unsorted_time_flagged_not_failed() {
    let input = tables(json!([{
        "columns": [
            {"name": "Timestamp", "type": "datetime", "values": [
                "2024-01-01T00:05:00Z", "2024-01-01T00:00:00Z"
            ]},
            {"name": "Requests", "type": "long", "values": [1, 2]}
        ]
    }]));
    let shaped = shape(&input, ResultFormat::TimeSeries).unwrap();
    assert!(shaped.time_not_ascending());
    assert_eq!(
        shaped.frames[0].notices,
        [Notice::TimeNotAsc { field: "Timestamp".into() }]
    );
}

// ============================================================================
// table / adx_time_series
// ============================================================================

#[test]
fn test_table_one_frame_per_result_set() {
    let mut input = metrics();
    input.push(RawTable::default());
    let shaped = shape(&input, ResultFormat::Table).unwrap();
    assert_eq!(shaped.frames.len(), 2);
    assert_eq!(shaped.frames[0].fields.len(), 3);
    assert!(shaped.frames[1].fields.is_empty());
}

#[test]
fn test_adx_time_series_requires_timestamp() {
    let input = tables(json!([{
        "columns": [
            {"name": "Time", "type": "dynamic", "values": [["2024-01-01T00:00:00Z"]]},
            {"name": "Requests", "type": "dynamic", "values": [[1]]}
        ]
    }]));
    assert_eq!(
        shape(&input, ResultFormat::AdxTimeSeries),
        Err(FormatError::MissingTimestampColumn)
    );
}

#[test]
fn test_adx_time_series_from_make_series() {
    let input = tables(json!([{
        "columns": [
            {"name": "Host", "type": "string", "values": ["a", "b"]},
            {"name": "Requests", "type": "dynamic", "values": [[1, 2], [3, 4]]},
            {"name": "Timestamp", "type": "dynamic", "values": [
                ["2024-01-01T00:00:00Z", "2024-01-01T00:05:00Z"],
                ["2024-01-01T00:00:00Z", "2024-01-01T00:05:00Z"]
            ]}
        ]
    }]));
    let shaped = shape(&input, ResultFormat::AdxTimeSeries).unwrap();
    let names: Vec<_> = shaped.frames.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["Requests { Host=a }", "Requests { Host=b }"]);
    assert_eq!(
        shaped.frames[1].field("Requests").unwrap().values,
        FieldValues::Number(vec![Some(3.0), Some(4.0)])
    );
}

#[test]
fn test_adx_time_series_numeric_by_key() {
    let input = tables(json!([{
        "columns": [
            {"name": "StatusCode", "type": "int", "values": [200, 500]},
            {"name": "Timestamp", "type": "dynamic", "values": [
                ["2024-01-01T00:00:00Z", "2024-01-01T00:05:00Z"],
                ["2024-01-01T00:00:00Z", "2024-01-01T00:05:00Z"]
            ]},
            {"name": "Count", "type": "dynamic", "values": [[1, 2], [3, 4]]}
        ]
    }]));
    let shaped = shape(&input, ResultFormat::AdxTimeSeries).unwrap();
    let names: Vec<_> = shaped.frames.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["Count { StatusCode=200 }", "Count { StatusCode=500 }"]);
}

#[test]
fn test_shaped_result_serializes_typed_fields() {
    let shaped = shape(&metrics(), ResultFormat::Table).unwrap();
    let value = serde_json::to_value(&shaped).unwrap();
    assert_eq!(value["format"], "table");
    assert_eq!(value["frames"][0]["fields"][0]["type"], "time");
    assert_eq!(value["frames"][0]["fields"][1]["values"], json!([10.0, 12.0, 9.0]));
}
