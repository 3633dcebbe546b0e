//! Raw result tables in, typed frames out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::PropertyType;
use crate::query::ResultFormat;

// ============================================================================
// Input
// ============================================================================

/// One result set, column-oriented, as the backend returns it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    #[serde(default)]
    pub name: String,
    pub columns: Vec<RawColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawColumn {
    pub name: String,
    /// Kusto column type (`datetime`, `long`, `dynamic`, ...).
    #[serde(rename = "type")]
    pub column_type: String,
    #[serde(default)]
    pub values: Vec<Value>,
}

impl RawColumn {
    pub fn new(name: &str, column_type: &str, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            values,
        }
    }

    pub fn kind(&self) -> PropertyType {
        PropertyType::from_csl_type(&self.column_type)
    }

    pub fn is_dynamic(&self) -> bool {
        self.column_type.eq_ignore_ascii_case("dynamic")
    }
}

impl RawTable {
    pub fn new(name: &str, columns: Vec<RawColumn>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Number of rows, taken from the first column.
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn column(&self, name: &str) -> Option<&RawColumn> {
        self.columns.iter().find(|c| c.name == name)
    }
}

// ============================================================================
// Output
// ============================================================================

/// Typed values of one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "values", rename_all = "camelCase")]
pub enum FieldValues {
    Time(Vec<Option<DateTime<Utc>>>),
    Number(Vec<Option<f64>>),
    Boolean(Vec<Option<bool>>),
    String(Vec<Option<String>>),
}

impl FieldValues {
    pub fn len(&self) -> usize {
        match self {
            FieldValues::Time(v) => v.len(),
            FieldValues::Number(v) => v.len(),
            FieldValues::Boolean(v) => v.len(),
            FieldValues::String(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A `name=value` tag identifying a series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Label {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
    #[serde(flatten)]
    pub values: FieldValues,
}

impl Field {
    pub fn new(name: &str, values: FieldValues) -> Self {
        Self {
            name: name.into(),
            labels: Vec::new(),
            values,
        }
    }
}

/// Something the UI should warn about; the data is still usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Notice {
    /// The time field is not in non-decreasing order.
    TimeNotAsc { field: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub name: String,
    pub fields: Vec<Field>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<Notice>,
}

impl Frame {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Shaped output of a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapedResult {
    pub format: ResultFormat,
    pub frames: Vec<Frame>,
}

impl ShapedResult {
    /// Whether any frame carries a [`Notice::TimeNotAsc`].
    pub fn time_not_ascending(&self) -> bool {
        self.frames
            .iter()
            .flat_map(|f| &f.notices)
            .any(|n| matches!(n, Notice::TimeNotAsc { .. }))
    }
}
