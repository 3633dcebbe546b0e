//! SchemaProvider trait definition.
//!
//! The provider abstracts over where the cluster schema comes from. The core
//! only reads the schema it is handed; fetching it is the only async step on
//! the query-build path.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::resolve::{table_schema, ResolvedTableSchema};
use super::types::{ClusterSchema, DatabaseSchema};

/// Errors fetching or decoding a schema.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("failed to read schema from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid schema JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Source of cluster schemas.
///
/// ```ignore
/// async fn columns(provider: &impl SchemaProvider) -> SchemaResult<()> {
///     let schema = provider.get_schema().await?;
///     let events = provider.get_table_schema("Samples", "Events").await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SchemaProvider: Send + Sync {
    /// Fetch the full cluster schema.
    async fn get_schema(&self) -> SchemaResult<ClusterSchema>;

    /// One database, if present.
    async fn get_database(&self, name: &str) -> SchemaResult<Option<DatabaseSchema>> {
        let schema = self.get_schema().await?;
        Ok(schema.databases.into_iter().find(|db| db.name == name))
    }

    /// Columns of one source; empty when it does not exist.
    async fn get_table_schema(&self, database: &str, table: &str) -> SchemaResult<ResolvedTableSchema> {
        let schema = self.get_schema().await?;
        Ok(table_schema(&schema, database, table))
    }
}

/// A schema held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticSchemaProvider {
    schema: ClusterSchema,
}

impl StaticSchemaProvider {
    pub fn new(schema: ClusterSchema) -> Self {
        Self { schema }
    }
}

#[async_trait]
impl SchemaProvider for StaticSchemaProvider {
    async fn get_schema(&self) -> SchemaResult<ClusterSchema> {
        Ok(self.schema.clone())
    }
}

/// A schema read from a JSON file on every call.
#[derive(Debug, Clone)]
pub struct FileSchemaProvider {
    path: PathBuf,
}

impl FileSchemaProvider {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl SchemaProvider for FileSchemaProvider {
    async fn get_schema(&self) -> SchemaResult<ClusterSchema> {
        debug!(path = %self.path.display(), "reading schema file");
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SchemaError::Io {
                path: self.path.clone(),
                source,
            })?;
        Ok(serde_json::from_str(&content)?)
    }
}
