//! End-to-end compilation from a stored query to KQL.
//!
//! ```text
//! stored query JSON → migrate → StoredQuery → resolve mapping → resolve columns → KQL
//! ```
//!
//! # Example
//!
//! ```ignore
//! use kql_builder::compile::QueryBuilder;
//! use kql_builder::schema::ClusterSchema;
//!
//! let schema: ClusterSchema = serde_json::from_str(schema_json)?;
//! let builder = QueryBuilder::new(schema);
//!
//! let output = builder.compile_str(r#"{
//!     "database": "Samples",
//!     "expression": { "from": { "property": { "name": "Events", "type": "string" }, "type": "property" } }
//! }"#)?;
//! println!("{}", output.text);
//! ```

use serde_json::Value;
use tracing::debug;

use crate::catalog::PropertyDefinition;
use crate::config::{Settings, SettingsError};
use crate::kql::{compile_with, CompileContext, CompileOptions, CompileWarning, Pipeline};
use crate::migration::load_query;
use crate::query::{QueryDefaults, StoredQuery};
use crate::schema::{
    column_options, table_schema, ClusterSchema, ResolvedTableSchema, SchemaMapper, SchemaMapping,
};

// ============================================================================
// Error Types
// ============================================================================

/// Errors that stop a stored query from being compiled at all.
///
/// Problems inside the expression never end up here; they become markers and
/// warnings in the output.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Invalid query JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Stored query must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

pub type CompileResult<T> = Result<T, CompileError>;

// ============================================================================
// Result Types
// ============================================================================

/// Result of compiling a stored query.
#[derive(Debug, Clone)]
pub struct QueryOutput {
    /// The migrated query the text was produced from.
    pub query: StoredQuery,

    /// KQL to run: compiled from the expression, or the raw text in raw mode.
    pub text: String,

    /// Pipeline AST; `None` in raw mode.
    pub pipeline: Option<Pipeline>,

    pub warnings: Vec<CompileWarning>,
}

// ============================================================================
// Builder
// ============================================================================

/// Everything needed to turn stored queries into KQL for one cluster.
///
/// Holds no per-query state; one builder serves any number of queries.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    schema: ClusterSchema,
    mapper: SchemaMapper,
    options: CompileOptions,
    defaults: QueryDefaults,
}

impl QueryBuilder {
    pub fn new(schema: ClusterSchema) -> Self {
        Self {
            schema,
            ..Self::default()
        }
    }

    /// Builder configured from settings: mapper, compile options and defaults.
    pub fn from_settings(settings: &Settings, schema: ClusterSchema) -> Result<Self, SettingsError> {
        Ok(Self {
            schema,
            mapper: settings.schema_mapper(),
            options: settings.compile_options(),
            defaults: settings.query_defaults()?,
        })
    }

    pub fn with_mapper(mut self, mapper: SchemaMapper) -> Self {
        self.mapper = mapper;
        self
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_defaults(mut self, defaults: QueryDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn schema(&self) -> &ClusterSchema {
        &self.schema
    }

    pub fn mapper(&self) -> &SchemaMapper {
        &self.mapper
    }

    pub fn defaults(&self) -> &QueryDefaults {
        &self.defaults
    }

    // ------------------------------------------------------------------------
    // Compilation
    // ------------------------------------------------------------------------

    /// Parse, migrate and compile a stored query given as JSON text.
    pub fn compile_str(&self, json: &str) -> CompileResult<QueryOutput> {
        let value: Value = serde_json::from_str(json)?;
        self.compile_value(&value)
    }

    /// Migrate and compile a stored query.
    pub fn compile_value(&self, value: &Value) -> CompileResult<QueryOutput> {
        if !value.is_object() {
            return Err(CompileError::NotAnObject(json_kind(value)));
        }
        Ok(self.compile_stored(load_query(value, &self.defaults)))
    }

    /// Compile an already current stored query.
    pub fn compile_stored(&self, query: StoredQuery) -> QueryOutput {
        if query.is_raw() {
            debug!(ref_id = %query.ref_id, "raw mode, using query text as is");
            return QueryOutput {
                text: query.query.clone(),
                pipeline: None,
                warnings: Vec::new(),
                query,
            };
        }

        let database = self.database_for(&query);
        let mapping = query
            .expression
            .source_name()
            .and_then(|value| self.mapper.get_mapping_by_value(value));
        let schema = self.source_schema(database, query.expression.source_name(), mapping);

        let ctx = CompileContext::new(&schema, database)
            .with_mapping(mapping)
            .with_options(self.options.clone());
        let output = compile_with(&query.expression, &ctx);

        QueryOutput {
            text: output.query,
            pipeline: Some(output.pipeline),
            warnings: output.warnings,
            query,
        }
    }

    // ------------------------------------------------------------------------
    // Editor options
    // ------------------------------------------------------------------------

    /// Source options for `database`, through the mapper.
    pub fn table_options(&self, database: &str) -> Vec<PropertyDefinition> {
        self.mapper.get_table_options(&self.schema, database)
    }

    pub fn function_options(&self, database: &str) -> Vec<PropertyDefinition> {
        self.mapper.get_function_options(&self.schema, database)
    }

    /// Column options for the source a `from` value selects.
    pub fn column_options(&self, database: &str, from: &str) -> Vec<PropertyDefinition> {
        let mapping = self.mapper.get_mapping_by_value(from);
        column_options(&self.source_schema(database, Some(from), mapping))
    }

    fn database_for<'q>(&'q self, query: &'q StoredQuery) -> &'q str {
        if query.database.is_empty() {
            &self.defaults.database
        } else {
            &query.database
        }
    }

    fn source_schema(
        &self,
        database: &str,
        from: Option<&str>,
        mapping: Option<&SchemaMapping>,
    ) -> ResolvedTableSchema {
        match (mapping, from) {
            (Some(mapping), _) => table_schema(&self.schema, &mapping.database, &mapping.name),
            (None, Some(name)) => table_schema(&self.schema, database, name),
            (None, None) => ResolvedTableSchema::default(),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RawSchemaMapping;
    use serde_json::json;

    fn schema() -> ClusterSchema {
        serde_json::from_value(json!({
            "Databases": {
                "Samples": {
                    "Name": "Samples",
                    "Tables": {
                        "StormEvents": {
                            "Name": "StormEvents",
                            "OrderedColumns": [
                                { "Name": "StartTime", "CslType": "datetime" },
                                { "Name": "State", "CslType": "string" },
                                { "Name": "DamageProperty", "CslType": "long" }
                            ]
                        }
                    }
                }
            }
        }))
        .unwrap()
    }

    fn mapper() -> SchemaMapper {
        let raw = RawSchemaMapping {
            database: Some("Samples".into()),
            name: Some("StormEvents".into()),
            display_name: Some("Storms".into()),
            value: Some("storms".into()),
            kind: Some("table".into()),
        };
        SchemaMapper::new(true, [&raw])
    }

    #[test]
    fn test_compile_builder_query() {
        let builder = QueryBuilder::new(schema());
        let output = builder
            .compile_value(&json!({
                "database": "Samples",
                "expression": {
                    "from": { "type": "property", "property": { "name": "StormEvents", "type": "string" } },
                    "where": { "type": "and", "expressions": [
                        { "type": "or", "expressions": [{
                            "type": "operator",
                            "property": { "name": "State", "type": "string" },
                            "operator": { "name": "==", "value": "TEXAS" }
                        }]}
                    ]}
                }
            }))
            .unwrap();

        assert_eq!(output.text, r#"StormEvents | where (State == "TEXAS")"#);
        assert!(output.pipeline.is_some());
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_raw_mode_returns_text() {
        let builder = QueryBuilder::new(schema());
        let output = builder
            .compile_value(&json!({ "rawMode": true, "query": "StormEvents | count" }))
            .unwrap();
        assert_eq!(output.text, "StormEvents | count");
        assert!(output.pipeline.is_none());
    }

    #[test]
    fn test_legacy_query_is_migrated_first() {
        let builder = QueryBuilder::new(schema());
        let output = builder
            .compile_value(&json!({
                "database": "Samples",
                "expression": { "from": { "expression": { "type": "field", "value": "StormEvents" } } }
            }))
            .unwrap();
        assert_eq!(output.text, "StormEvents");
        assert_eq!(output.query.plugin_version, crate::query::PLUGIN_VERSION);
    }

    #[test]
    fn test_mapped_source_resolves_columns() {
        let builder = QueryBuilder::new(schema()).with_mapper(mapper());

        let options = builder.column_options("Samples", "storms");
        let names: Vec<_> = options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(names, ["StartTime", "State", "DamageProperty"]);

        let output = builder
            .compile_value(&json!({
                "database": "Samples",
                "expression": {
                    "from": { "type": "property", "property": { "name": "storms", "type": "string" } }
                }
            }))
            .unwrap();
        assert_eq!(output.text, "StormEvents");
    }

    #[test]
    fn test_options_applied() {
        let builder = QueryBuilder::new(schema())
            .with_options(CompileOptions::default().with_time_filter(true));
        let output = builder
            .compile_value(&json!({
                "database": "Samples",
                "expression": {
                    "from": { "type": "property", "property": { "name": "StormEvents", "type": "string" } }
                }
            }))
            .unwrap();
        assert_eq!(output.text, "StormEvents | where $__timeFilter(StartTime)");
    }

    #[test]
    fn test_not_an_object() {
        let builder = QueryBuilder::default();
        assert!(matches!(
            builder.compile_value(&json!([1, 2])),
            Err(CompileError::NotAnObject("an array"))
        ));
        assert!(matches!(builder.compile_str("{"), Err(CompileError::Json(_))));
    }

    #[test]
    fn test_table_options_through_mapper() {
        let builder = QueryBuilder::new(schema()).with_mapper(mapper());
        let options = builder.table_options("Samples");
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].label, "Storms");
        assert_eq!(options[0].value, "storms");
    }
}
