//! Property & operator catalog.
//!
//! Static definitions of the value types a query property can carry and
//! the operators / reduce functions that are legal for each of them.
//!
//! - [`PropertyType`] - closed set of value types
//! - [`operators`] - filter operators and how they render
//! - [`reduce`] - aggregation functions
//! - [`interval_options`] - bin widths offered for DateTime grouping

pub mod operators;
pub mod reduce;

use serde::{Deserialize, Deserializer, Serialize};

pub use operators::{operator, operators_for, OperatorDef, OperatorForm};
pub use reduce::{reduce_function, reduce_functions_for, ReduceDef};

/// Value type of a property (column, literal, function or interval).
///
/// Adding a variant here is a compile error everywhere the type drives
/// formatting.
///
/// Unknown type names read as [`PropertyType::String`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyType {
    Number,
    #[default]
    String,
    Boolean,
    DateTime,
    TimeSpan,
    Function,
    Interval,
}

impl PropertyType {
    /// Map a Kusto column type (`CslType`) to a property type.
    ///
    /// Anything unrecognized is treated as a string.
    pub fn from_csl_type(csl_type: &str) -> Self {
        match csl_type.trim().to_ascii_lowercase().as_str() {
            "int" | "long" | "real" | "double" | "decimal" | "float" => PropertyType::Number,
            "bool" | "boolean" => PropertyType::Boolean,
            "datetime" | "date" => PropertyType::DateTime,
            "timespan" | "time" => PropertyType::TimeSpan,
            _ => PropertyType::String,
        }
    }

    /// The KQL conversion function producing this type from a `dynamic` value.
    pub fn conversion_function(&self) -> &'static str {
        match self {
            PropertyType::Number => "todouble",
            PropertyType::Boolean => "tobool",
            PropertyType::DateTime => "todatetime",
            PropertyType::TimeSpan => "totimespan",
            PropertyType::String
            | PropertyType::Function
            | PropertyType::Interval => "tostring",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, PropertyType::Number)
    }

    /// Parse the stored name (`dateTime`, `timeSpan`, ...).
    pub fn from_name(name: &str) -> Self {
        match name {
            "number" => PropertyType::Number,
            "boolean" => PropertyType::Boolean,
            "dateTime" => PropertyType::DateTime,
            "timeSpan" => PropertyType::TimeSpan,
            "function" => PropertyType::Function,
            "interval" => PropertyType::Interval,
            _ => PropertyType::String,
        }
    }
}

impl<'de> Deserialize<'de> for PropertyType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = Option::<String>::deserialize(deserializer)?;
        Ok(name.as_deref().map(Self::from_name).unwrap_or_default())
    }
}

/// A named, typed reference: column, table, function or interval.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(rename = "type", default)]
    pub property_type: PropertyType,
}

impl Property {
    pub fn new(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            name: name.into(),
            property_type,
        }
    }
}

/// An option offered to the editor: label shown, value stored, type carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub label: String,
    pub value: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
}

impl PropertyDefinition {
    pub fn new(label: impl Into<String>, value: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            property_type,
        }
    }

    /// Turn the option into the property the IR stores.
    pub fn to_property(&self) -> Property {
        Property::new(self.value.clone(), self.property_type)
    }
}

const INTERVALS: &[&str] = &["1m", "5m", "15m", "30m", "1h", "6h", "12h", "1d"];

/// Bin widths offered for DateTime group-by keys, in display order.
pub fn interval_options() -> Vec<PropertyDefinition> {
    INTERVALS
        .iter()
        .map(|i| PropertyDefinition::new(*i, *i, PropertyType::Interval))
        .collect()
}

/// The interval used when a DateTime group-by has none selected.
pub fn default_interval() -> &'static str {
    INTERVALS[0]
}
