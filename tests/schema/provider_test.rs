//! Integration tests for schema providers.

use std::io::Write;

use kql_builder::schema::{FileSchemaProvider, SchemaError, SchemaProvider, StaticSchemaProvider};
use tempfile::NamedTempFile;

const SCHEMA: &str = r#"{
    "Databases": {
        "Samples": {
            "Name": "Samples",
            "Tables": {
                "StormEvents": {
                    "Name": "StormEvents",
                    "OrderedColumns": [
                        {"Name": "StartTime", "Type": "System.DateTime", "CslType": "datetime"},
                        {"Name": "State", "Type": "System.String", "CslType": "string"}
                    ]
                }
            },
            "MaterializedViews": null,
            "Functions": {},
            "ExternalTables": {}
        }
    }
}"#;

fn schema_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_file_provider_reads_schema() {
    let file = schema_file(SCHEMA);
    let provider = FileSchemaProvider::new(file.path());

    let schema = provider.get_schema().await.unwrap();
    assert_eq!(schema.databases.len(), 1);
    assert!(schema.databases[0].materialized_views.is_empty());

    let columns = provider.get_table_schema("Samples", "StormEvents").await.unwrap();
    let names: Vec<_> = columns.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["StartTime", "State"]);
}

#[tokio::test]
async fn test_file_provider_invalid_json() {
    let file = schema_file("{ not json");
    let err = FileSchemaProvider::new(file.path()).get_schema().await.unwrap_err();
    assert!(matches!(err, SchemaError::Parse(_)));
}

#[tokio::test]
async fn test_providers_behind_trait_object() {
    let file = schema_file(SCHEMA);
    let from_file = FileSchemaProvider::new(file.path());
    let schema = from_file.get_schema().await.unwrap();

    let providers: Vec<Box<dyn SchemaProvider>> = vec![
        Box::new(from_file),
        Box::new(StaticSchemaProvider::new(schema)),
    ];
    for provider in &providers {
        let db = provider.get_database("Samples").await.unwrap().unwrap();
        assert_eq!(db.tables[0].name, "StormEvents");
        assert!(provider.get_table_schema("Samples", "Missing").await.unwrap().is_empty());
    }
}
