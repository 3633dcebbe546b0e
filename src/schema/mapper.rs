//! Name mapping: friendly aliases for tables, views and functions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{ClusterSchema, DatabaseSchema};
use crate::catalog::{PropertyDefinition, PropertyType};

/// Kind of object a mapping points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MappingKind {
    Table,
    MaterializedView,
    Function,
}

impl MappingKind {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "table" => Some(MappingKind::Table),
            "materializedView" | "materialized_view" => Some(MappingKind::MaterializedView),
            "function" => Some(MappingKind::Function),
            _ => None,
        }
    }

    fn property_type(&self) -> PropertyType {
        match self {
            MappingKind::Function => PropertyType::Function,
            MappingKind::Table | MappingKind::MaterializedView => PropertyType::String,
        }
    }

    fn exists_in(&self, db: &DatabaseSchema, name: &str) -> bool {
        match self {
            MappingKind::Table => db.table(name).is_some(),
            MappingKind::MaterializedView => db.materialized_view(name).is_some(),
            MappingKind::Function => db.function(name).is_some(),
        }
    }
}

/// A mapping entry as configured; any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSchemaMapping {
    pub database: Option<String>,
    pub name: Option<String>,
    #[serde(alias = "display_name")]
    pub display_name: Option<String>,
    pub value: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// A complete, validated mapping entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaMapping {
    pub database: String,
    pub name: String,
    pub display_name: String,
    pub value: String,
    #[serde(rename = "type")]
    pub kind: MappingKind,
}

impl SchemaMapping {
    /// Validate a configured entry. Every field must be present and non-empty.
    pub fn validate(raw: &RawSchemaMapping) -> Option<Self> {
        fn field(f: &Option<String>) -> Option<String> {
            f.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }

        Some(Self {
            database: field(&raw.database)?,
            name: field(&raw.name)?,
            display_name: field(&raw.display_name)?,
            value: field(&raw.value)?,
            kind: MappingKind::parse(raw.kind.as_deref()?.trim())?,
        })
    }

    pub fn to_definition(&self) -> PropertyDefinition {
        PropertyDefinition::new(&self.display_name, &self.value, self.kind.property_type())
    }
}

/// Read-only index over the configured mappings.
///
/// Built once from configuration; reconfiguring builds a new mapper.
#[derive(Debug, Clone, Default)]
pub struct SchemaMapper {
    enabled: bool,
    mappings: Vec<SchemaMapping>,
    by_value: HashMap<String, usize>,
}

impl SchemaMapper {
    /// A mapper that passes schema names through unchanged.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Build the index. Incomplete entries are discarded.
    pub fn new<'a>(enabled: bool, raw: impl IntoIterator<Item = &'a RawSchemaMapping>) -> Self {
        let mut mappings = Vec::new();
        let mut by_value = HashMap::new();

        for entry in raw {
            match SchemaMapping::validate(entry) {
                Some(mapping) => {
                    if by_value.contains_key(&mapping.value) {
                        debug!(value = %mapping.value, "duplicate schema mapping value ignored");
                        continue;
                    }
                    by_value.insert(mapping.value.clone(), mappings.len());
                    mappings.push(mapping);
                }
                None => debug!(?entry, "incomplete schema mapping discarded"),
            }
        }

        Self {
            enabled,
            mappings,
            by_value,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn mappings(&self) -> &[SchemaMapping] {
        &self.mappings
    }

    /// Source options for `database`.
    ///
    /// Unmapped: tables then materialized views, in schema order. Mapped: the
    /// mappings for `database` in declaration order whose object still exists.
    pub fn get_table_options(&self, schema: &ClusterSchema, database: &str) -> Vec<PropertyDefinition> {
        let Some(db) = schema.database(database) else {
            debug!(database, "database not in schema, no table options");
            return Vec::new();
        };

        if !self.enabled {
            return db
                .tables
                .iter()
                .chain(&db.materialized_views)
                .map(|t| PropertyDefinition::new(&t.name, &t.name, PropertyType::String))
                .collect();
        }

        self.mapped_options(db, database, |_| true)
    }

    /// Function options for `database`.
    pub fn get_function_options(&self, schema: &ClusterSchema, database: &str) -> Vec<PropertyDefinition> {
        let Some(db) = schema.database(database) else {
            return Vec::new();
        };

        if !self.enabled {
            return db
                .functions
                .iter()
                .map(|f| PropertyDefinition::new(&f.name, &f.name, PropertyType::Function))
                .collect();
        }

        self.mapped_options(db, database, |m| m.kind == MappingKind::Function)
    }

    fn mapped_options(
        &self,
        db: &DatabaseSchema,
        database: &str,
        keep: impl Fn(&SchemaMapping) -> bool,
    ) -> Vec<PropertyDefinition> {
        self.mappings
            .iter()
            .filter(|m| m.database == database && keep(m))
            .filter(|m| {
                let exists = m.kind.exists_in(db, &m.name);
                if !exists {
                    debug!(database, name = %m.name, kind = ?m.kind, "mapped object missing from schema");
                }
                exists
            })
            .map(SchemaMapping::to_definition)
            .collect()
    }

    /// Resolve an alias back to its mapping. `None` when disabled or unmapped.
    pub fn get_mapping_by_value(&self, value: &str) -> Option<&SchemaMapping> {
        if !self.enabled {
            return None;
        }
        self.by_value.get(value).map(|&i| &self.mappings[i])
    }
}

/// Database options, in schema order.
pub fn get_database_options(schema: &ClusterSchema) -> Vec<PropertyDefinition> {
    schema
        .databases
        .iter()
        .map(|db| PropertyDefinition::new(&db.name, &db.name, PropertyType::String))
        .collect()
}
