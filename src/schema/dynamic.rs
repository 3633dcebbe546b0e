//! Discovering the shape of `dynamic` columns.
//!
//! A `dynamic` column has no fixed schema. The discovery query samples rows
//! and asks the backend for `buildschema(...)`; the resulting JSON is
//! flattened into typed path columns (`Props.level`) the editor can offer.

use serde_json::Value;

use super::types::ColumnSchema;
use crate::kql::expr::{binary, col, func, Expr};
use crate::kql::pipeline::{Pipeline, Source};

/// Rows sampled when discovering dynamic column shapes.
pub const SAMPLE_SIZE: u64 = 50_000;

/// Query producing one `buildschema` result per dynamic column.
///
/// Returns `None` when there are no columns to inspect.
pub fn dynamic_schema_query(table: &str, columns: &[&str]) -> Option<String> {
    if columns.is_empty() {
        return None;
    }

    let aggregates: Vec<Expr> = columns
        .iter()
        .map(|c| binary(col(c), "=", func("buildschema", vec![col(c)])))
        .collect();

    Some(
        Pipeline::new(Source::table(table))
            .take(SAMPLE_SIZE)
            .summarize(aggregates, vec![])
            .to_kql(),
    )
}

/// Flatten a `buildschema` result into path columns.
///
/// Leaves are type names (`"long"`); a union of types (`["long", "string"]`)
/// takes its first member. Nested objects produce deeper paths. Array
/// element schemas (`{"`indexer`": ...}`) are not expanded.
pub fn flatten_dynamic_schema(column: &str, schema: &Value) -> Vec<ColumnSchema> {
    let mut out = Vec::new();
    flatten_into(column, schema, &mut out);
    out
}

const INDEXER: &str = "`indexer`";

fn flatten_into(path: &str, schema: &Value, out: &mut Vec<ColumnSchema>) {
    match schema {
        Value::Object(fields) => {
            for (key, value) in fields {
                if key == INDEXER {
                    continue;
                }
                flatten_into(&format!("{path}.{key}"), value, out);
            }
        }
        Value::String(csl_type) => out.push(ColumnSchema::new(path, csl_type.as_str())),
        Value::Array(types) => {
            if let Some(first) = types.iter().find_map(Value::as_str) {
                out.push(ColumnSchema::new(path, first));
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_discovery_query() {
        assert_eq!(
            dynamic_schema_query("Events", &["Props", "Tags"]).unwrap(),
            "Events | take 50000 | summarize Props = buildschema(Props), Tags = buildschema(Tags)"
        );
        assert!(dynamic_schema_query("Events", &[]).is_none());
    }

    #[test]
    fn test_flatten() {
        let schema = json!({
            "level": "string",
            "count": ["long", "string"],
            "http": { "status": "int" },
            "items": { "`indexer`": "string" }
        });
        let mut columns = flatten_dynamic_schema("Props", &schema);
        columns.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(
            columns,
            vec![
                ColumnSchema::new("Props.count", "long"),
                ColumnSchema::new("Props.http.status", "int"),
                ColumnSchema::new("Props.level", "string"),
            ]
        );
    }
}
