//! Resolving the columns of a single source.

use tracing::debug;

use super::types::{ClusterSchema, ColumnSchema};
use crate::catalog::{PropertyDefinition, PropertyType};

/// The columns of one table, view or function output.
///
/// Empty when the source could not be resolved; the compiler still works
/// against an empty schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedTableSchema {
    pub columns: Vec<ColumnSchema>,
}

impl ResolvedTableSchema {
    pub fn new(columns: Vec<ColumnSchema>) -> Self {
        Self { columns }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// First column typed `datetime`, in declared order.
    pub fn first_datetime_column(&self) -> Option<&ColumnSchema> {
        self.columns
            .iter()
            .find(|c| PropertyType::from_csl_type(&c.csl_type) == PropertyType::DateTime)
    }

    /// Split `Column.a.b` into a dynamic root column and its path.
    ///
    /// Returns `None` unless the first segment names a `dynamic` column.
    pub fn dynamic_path<'a>(&self, name: &'a str) -> Option<(&'a str, Vec<&'a str>)> {
        let mut segments = name.split('.');
        let root = segments.next()?;
        let path: Vec<&str> = segments.collect();
        if path.is_empty() || path.iter().any(|s| s.is_empty()) {
            return None;
        }
        self.column(root)
            .filter(|c| c.is_dynamic())
            .map(|_| (root, path))
    }

    /// Add columns discovered inside dynamic columns.
    pub fn with_columns(mut self, columns: impl IntoIterator<Item = ColumnSchema>) -> Self {
        for column in columns {
            if self.column(&column.name).is_none() {
                self.columns.push(column);
            }
        }
        self
    }
}

/// A requested object that is not in the schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaResolutionError {
    #[error("database not found: {0}")]
    DatabaseNotFound(String),

    #[error("no table, view or function named {table} in database {database}")]
    TableNotFound { database: String, table: String },
}

/// Look up the columns of `table` in `database`.
///
/// Tables are searched first, then materialized views, external tables and
/// finally function output columns.
pub fn resolve_table(
    schema: &ClusterSchema,
    database: &str,
    table: &str,
) -> Result<ResolvedTableSchema, SchemaResolutionError> {
    let db = schema
        .database(database)
        .ok_or_else(|| SchemaResolutionError::DatabaseNotFound(database.to_string()))?;

    let columns = db
        .table(table)
        .or_else(|| db.materialized_view(table))
        .or_else(|| db.external_table(table))
        .map(|t| t.ordered_columns.clone())
        .or_else(|| db.function(table).map(|f| f.output_columns.clone()))
        .ok_or_else(|| SchemaResolutionError::TableNotFound {
            database: database.to_string(),
            table: table.to_string(),
        })?;

    Ok(ResolvedTableSchema::new(columns))
}

/// Like [`resolve_table`], but an unresolvable source yields an empty schema.
pub fn table_schema(schema: &ClusterSchema, database: &str, table: &str) -> ResolvedTableSchema {
    resolve_table(schema, database, table).unwrap_or_else(|err| {
        debug!(database, table, error = %err, "schema not resolved, using empty column list");
        ResolvedTableSchema::default()
    })
}

/// Column options for the editor, typed from each column's Kusto type.
pub fn column_options(schema: &ResolvedTableSchema) -> Vec<PropertyDefinition> {
    schema
        .columns
        .iter()
        .map(|c| PropertyDefinition::new(&c.name, &c.name, PropertyType::from_csl_type(&c.csl_type)))
        .collect()
}
