//! Integration tests for schema options and the mapping layer.

use kql_builder::catalog::PropertyType;
use kql_builder::schema::{
    column_options, flatten_dynamic_schema, get_database_options, table_schema, ClusterSchema,
    ColumnSchema, RawSchemaMapping, ResolvedTableSchema, SchemaMapper,
};
use serde_json::json;

fn cluster() -> ClusterSchema {
    serde_json::from_value(json!({
        "Databases": {
            "Samples": {
                "Name": "Samples",
                "Tables": {
                    "StormEvents": {"OrderedColumns": [
                        {"Name": "StartTime", "CslType": "datetime"},
                        {"Name": "State", "CslType": "string"}
                    ]},
                    "Covid19": {"OrderedColumns": [
                        {"Name": "Timestamp", "CslType": "datetime"},
                        {"Name": "Confirmed", "CslType": "long"}
                    ]}
                },
                "MaterializedViews": {
                    "DailyStorms": {"OrderedColumns": [
                        {"Name": "Day", "CslType": "datetime"},
                        {"Name": "Count", "CslType": "long"}
                    ]}
                },
                "Functions": {
                    "StormsIn": {
                        "Body": "{ StormEvents | where State == state }",
                        "InputParameters": [{"Name": "state", "CslType": "string"}],
                        "OutputColumns": [{"Name": "State", "CslType": "string"}]
                    }
                },
                "ExternalTables": {}
            },
            "Logs": {
                "Tables": {"Traces": {"OrderedColumns": []}}
            }
        }
    }))
    .unwrap()
}

fn mapping(database: &str, name: &str, display: &str, value: &str, kind: &str) -> RawSchemaMapping {
    RawSchemaMapping {
        database: Some(database.into()),
        name: Some(name.into()),
        display_name: Some(display.into()),
        value: Some(value.into()),
        kind: Some(kind.into()),
    }
}

fn labels(options: &[kql_builder::catalog::PropertyDefinition]) -> Vec<&str> {
    options.iter().map(|o| o.label.as_str()).collect()
}

// ============================================================================
// Unmapped
// ============================================================================

#[test]
fn test_database_options_in_schema_order() {
    assert_eq!(labels(&get_database_options(&cluster())), ["Samples", "Logs"]);
}

#[test]
fn test_tables_then_materialized_views() {
    let options = SchemaMapper::disabled().get_table_options(&cluster(), "Samples");
    assert_eq!(labels(&options), ["StormEvents", "Covid19", "DailyStorms"]);
    assert!(options.iter().all(|o| o.label == o.value));
}

#[test]
fn test_unknown_database_has_no_options() {
    assert!(SchemaMapper::disabled().get_table_options(&cluster(), "Nope").is_empty());
    assert!(table_schema(&cluster(), "Nope", "StormEvents").is_empty());
}

#[test]
fn test_function_output_columns() {
    let schema = table_schema(&cluster(), "Samples", "StormsIn");
    let options = column_options(&schema);
    assert_eq!(labels(&options), ["State"]);
    assert_eq!(options[0].property_type, PropertyType::String);
}

#[test]
fn test_dynamic_paths_extend_column_options() {
    let schema = ResolvedTableSchema::new(vec![
        ColumnSchema::new("StartTime", "datetime"),
        ColumnSchema::new("StormSummary", "dynamic"),
    ]);
    let discovered = flatten_dynamic_schema(
        "StormSummary",
        &json!({"TotalDamages": "long", "Details": {"Location": "string"}}),
    );
    let schema = schema.with_columns(discovered);

    let options = column_options(&schema);
    let location = options
        .iter()
        .find(|o| o.value == "StormSummary.Details.Location")
        .unwrap();
    assert_eq!(location.property_type, PropertyType::String);
    assert_eq!(
        schema.dynamic_path("StormSummary.Details.Location"),
        Some(("StormSummary", vec!["Details", "Location"]))
    );
}

// ============================================================================
// Mapped
// ============================================================================

#[test]
fn test_mapped_options_in_declaration_order() {
    let raw = [
        mapping("Samples", "DailyStorms", "Storms per day", "daily", "materializedView"),
        mapping("Samples", "StormEvents", "Storms", "storms", "table"),
        mapping("Logs", "Traces", "Traces", "traces", "table"),
    ];
    let mapper = SchemaMapper::new(true, &raw);

    let options = mapper.get_table_options(&cluster(), "Samples");
    assert_eq!(labels(&options), ["Storms per day", "Storms"]);
    assert_eq!(options[1].value, "storms");
}

#[test]
fn test_mappings_to_missing_objects_filtered() {
    let raw = [
        mapping("Samples", "Gone", "Gone", "gone", "table"),
        mapping("Samples", "StormEvents", "Storms", "storms", "table"),
    ];
    let mapper = SchemaMapper::new(true, &raw);
    assert_eq!(labels(&mapper.get_table_options(&cluster(), "Samples")), ["Storms"]);
}

#[test]
fn test_incomplete_mappings_discarded() {
    let mut incomplete = mapping("Samples", "Covid19", "Covid", "covid", "table");
    incomplete.display_name = None;
    let raw = [incomplete, mapping("Samples", "StormEvents", "Storms", "storms", "table")];

    let mapper = SchemaMapper::new(true, &raw);
    assert_eq!(mapper.mappings().len(), 1);
    assert!(mapper.get_mapping_by_value("covid").is_none());
}

#[test]
fn test_function_mappings() {
    let raw = [
        mapping("Samples", "StormEvents", "Storms", "storms", "table"),
        mapping("Samples", "StormsIn", "Storms in state", "storms_in", "function"),
    ];
    let mapper = SchemaMapper::new(true, &raw);

    let functions = mapper.get_function_options(&cluster(), "Samples");
    assert_eq!(labels(&functions), ["Storms in state"]);
    assert_eq!(functions[0].property_type, PropertyType::Function);
}

#[test]
fn test_mapping_by_value_round_trip() {
    let raw = [mapping("Samples", "StormEvents", "Storms", "storms", "table")];

    let enabled = SchemaMapper::new(true, &raw);
    let found = enabled.get_mapping_by_value("storms").unwrap();
    assert_eq!(found.name, "StormEvents");
    assert_eq!(found.database, "Samples");

    let disabled = SchemaMapper::new(false, &raw);
    assert!(disabled.get_mapping_by_value("storms").is_none());
    assert_eq!(
        labels(&disabled.get_table_options(&cluster(), "Samples")),
        ["StormEvents", "Covid19", "DailyStorms"]
    );
}
