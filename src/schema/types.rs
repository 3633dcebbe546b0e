//! Cluster schema as returned by the backend's schema endpoint.
//!
//! The wire form keys every collection by object name (`{"Tables": {"T": {...}}}`).
//! Those maps are read into vectors in document order, since option order
//! drives default selection in the editor.

use serde::{Deserialize, Serialize};

/// All databases of a cluster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClusterSchema {
    #[serde(default, with = "ordered")]
    pub databases: Vec<DatabaseSchema>,
}

impl ClusterSchema {
    pub fn database(&self, name: &str) -> Option<&DatabaseSchema> {
        self.databases.iter().find(|db| db.name == name)
    }
}

/// One database and the objects it exposes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DatabaseSchema {
    #[serde(default)]
    pub name: String,
    #[serde(default, with = "ordered")]
    pub tables: Vec<TableSchema>,
    #[serde(default, with = "ordered")]
    pub materialized_views: Vec<TableSchema>,
    #[serde(default, with = "ordered")]
    pub functions: Vec<FunctionSchema>,
    #[serde(default, with = "ordered")]
    pub external_tables: Vec<TableSchema>,
}

impl DatabaseSchema {
    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn materialized_view(&self, name: &str) -> Option<&TableSchema> {
        self.materialized_views.iter().find(|t| t.name == name)
    }

    pub fn external_table(&self, name: &str) -> Option<&TableSchema> {
        self.external_tables.iter().find(|t| t.name == name)
    }

    pub fn function(&self, name: &str) -> Option<&FunctionSchema> {
        self.functions.iter().find(|f| f.name == name)
    }
}

/// Table, materialized view or external table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableSchema {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ordered_columns: Vec<ColumnSchema>,
}

/// Stored function.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FunctionSchema {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub input_parameters: Vec<ColumnSchema>,
    #[serde(default)]
    pub output_columns: Vec<ColumnSchema>,
}

/// A column (or function parameter) and its Kusto type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ColumnSchema {
    pub name: String,
    #[serde(default)]
    pub csl_type: String,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, csl_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            csl_type: csl_type.into(),
        }
    }

    pub fn is_dynamic(&self) -> bool {
        self.csl_type.eq_ignore_ascii_case("dynamic")
    }
}

/// Objects stored in a name-keyed map.
pub(crate) trait Named {
    fn name(&self) -> &str;
    fn set_name(&mut self, name: String);
}

macro_rules! named {
    ($($ty:ty),*) => {
        $(impl Named for $ty {
            fn name(&self) -> &str {
                &self.name
            }
            fn set_name(&mut self, name: String) {
                self.name = name;
            }
        })*
    };
}

named!(DatabaseSchema, TableSchema, FunctionSchema);

/// `{ "Key": { ... } }` maps read as vectors in document order.
///
/// An object whose `Name` is missing takes its map key.
mod ordered {
    use std::fmt;
    use std::marker::PhantomData;

    use serde::de::{MapAccess, Visitor};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::Named;

    pub fn serialize<S, T>(items: &[T], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Named + Serialize,
    {
        serializer.collect_map(items.iter().map(|item| (item.name(), item)))
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Named + Deserialize<'de>,
    {
        struct OrderedVisitor<T>(PhantomData<T>);

        impl<'de, T: Named + Deserialize<'de>> Visitor<'de> for OrderedVisitor<T> {
            type Value = Vec<T>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of named schema objects")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut items = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, mut item)) = map.next_entry::<String, T>()? {
                    if item.name().is_empty() {
                        item.set_name(key);
                    }
                    items.push(item);
                }
                Ok(items)
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E> {
                Ok(Vec::new())
            }
        }

        deserializer.deserialize_any(OrderedVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"{
        "Databases": {
            "Samples": {
                "Name": "Samples",
                "Tables": {
                    "Zeta": { "Name": "Zeta", "OrderedColumns": [] },
                    "Alpha": {
                        "Name": "Alpha",
                        "OrderedColumns": [
                            { "Name": "Timestamp", "Type": "System.DateTime", "CslType": "datetime" }
                        ]
                    }
                },
                "MaterializedViews": {},
                "Functions": {
                    "Recent": { "Body": "{ Alpha | take 10 }", "InputParameters": [], "OutputColumns": [] }
                }
            }
        }
    }"#;

    #[test]
    fn test_document_order_is_kept() {
        let schema: ClusterSchema = serde_json::from_str(SCHEMA).unwrap();
        let db = schema.database("Samples").unwrap();
        let names: Vec<_> = db.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Zeta", "Alpha"]);
        assert!(db.external_tables.is_empty());
    }

    #[test]
    fn test_missing_name_taken_from_key() {
        let schema: ClusterSchema = serde_json::from_str(SCHEMA).unwrap();
        let db = schema.database("Samples").unwrap();
        assert_eq!(db.function("Recent").unwrap().body, "{ Alpha | take 10 }");
    }

    #[test]
    fn test_column_types() {
        let schema: ClusterSchema = serde_json::from_str(SCHEMA).unwrap();
        let table = schema.database("Samples").unwrap().table("Alpha").unwrap();
        assert_eq!(table.ordered_columns[0], ColumnSchema::new("Timestamp", "datetime"));
    }

    #[test]
    fn test_null_collection_is_empty() {
        let db: DatabaseSchema = serde_json::from_str(r#"{"Name": "x", "Tables": null}"#).unwrap();
        assert!(db.tables.is_empty());
    }
}
