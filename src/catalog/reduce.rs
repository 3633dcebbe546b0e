//! Reduce (aggregation) functions.

use super::PropertyType;

/// An aggregation function definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReduceDef {
    pub name: &'static str,
    /// Only meaningful on numeric columns.
    pub numeric_only: bool,
    /// Renders with an empty argument list (`count()`).
    pub takes_column: bool,
    /// Names of positional parameters following the column.
    pub parameters: &'static [&'static str],
}

const fn def(name: &'static str, numeric_only: bool) -> ReduceDef {
    ReduceDef {
        name,
        numeric_only,
        takes_column: true,
        parameters: &[],
    }
}

static REDUCE_FUNCTIONS: &[ReduceDef] = &[
    ReduceDef {
        name: "count",
        numeric_only: false,
        takes_column: false,
        parameters: &[],
    },
    def("dcount", false),
    def("sum", true),
    def("avg", true),
    def("min", false),
    def("max", false),
    def("stdev", true),
    def("variance", true),
    ReduceDef {
        name: "percentile",
        numeric_only: true,
        takes_column: true,
        parameters: &["percentile"],
    },
    def("make_list", false),
    def("make_set", false),
    def("take_any", false),
];

/// Look up a reduce function by name.
pub fn reduce_function(name: &str) -> Option<&'static ReduceDef> {
    REDUCE_FUNCTIONS.iter().find(|r| r.name == name.trim())
}

/// Reduce functions legal for a property type, in catalog order.
pub fn reduce_functions_for(property_type: PropertyType) -> Vec<&'static ReduceDef> {
    REDUCE_FUNCTIONS
        .iter()
        .filter(|r| !r.numeric_only || property_type.is_numeric())
        .collect()
}
