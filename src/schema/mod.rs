//! Cluster schema, name resolution and mapping.
//!
//! ```text
//! SchemaProvider ──▶ ClusterSchema ──┬──▶ SchemaMapper ──▶ table / function options
//!                                    │
//!                                    └──▶ table_schema ──▶ ResolvedTableSchema ──▶ compiler
//!                                                               ▲
//!                                          flatten_dynamic_schema (dynamic columns)
//! ```

pub mod dynamic;
pub mod mapper;
pub mod provider;
pub mod resolve;
pub mod types;

pub use dynamic::{dynamic_schema_query, flatten_dynamic_schema};
pub use mapper::{get_database_options, MappingKind, RawSchemaMapping, SchemaMapper, SchemaMapping};
pub use provider::{FileSchemaProvider, SchemaError, SchemaProvider, SchemaResult, StaticSchemaProvider};
pub use resolve::{column_options, resolve_table, table_schema, ResolvedTableSchema, SchemaResolutionError};
pub use types::{ClusterSchema, ColumnSchema, DatabaseSchema, FunctionSchema, TableSchema};
