//! Constructors for building expressions in code.
//!
//! ```ignore
//! use kql_builder::expression::builders::*;
//! use kql_builder::catalog::PropertyType;
//!
//! let expr = QueryExpression::from_table("Events")
//!     .with_where(and(vec![or(vec![filter(string("Level"), "==", "Error")])]))
//!     .with_reduce(and(vec![reduce(string("*"), "count")]))
//!     .with_group_by(and(vec![bin(datetime("Timestamp"), "5m")]));
//! ```

pub use super::types::QueryExpression;
use super::types::{
    ArrayExpression, FunctionParameterExpression, GroupByExpression, Operator,
    OperatorExpression, OperatorValue, PropertyExpression, ReduceExpression, ScalarValue,
};
use crate::catalog::{Property, PropertyType};

pub fn number(name: &str) -> Property {
    Property::new(name, PropertyType::Number)
}

pub fn string(name: &str) -> Property {
    Property::new(name, PropertyType::String)
}

pub fn boolean(name: &str) -> Property {
    Property::new(name, PropertyType::Boolean)
}

pub fn datetime(name: &str) -> Property {
    Property::new(name, PropertyType::DateTime)
}

pub fn timespan(name: &str) -> Property {
    Property::new(name, PropertyType::TimeSpan)
}

pub fn source(property: Property) -> PropertyExpression {
    PropertyExpression { property }
}

/// `property op value`
pub fn filter(property: Property, op: &str, value: impl Into<OperatorValue>) -> OperatorExpression {
    OperatorExpression {
        property,
        operator: Operator {
            name: op.into(),
            value: Some(value.into()),
            label_value: None,
        },
    }
}

/// `property op (values...)`
pub fn filter_list<V: Into<ScalarValue>>(
    property: Property,
    op: &str,
    values: Vec<V>,
) -> OperatorExpression {
    OperatorExpression {
        property,
        operator: Operator {
            name: op.into(),
            value: Some(OperatorValue::List(values.into_iter().map(Into::into).collect())),
            label_value: None,
        },
    }
}

/// An operator with no operand (`isnotempty`).
pub fn check(property: Property, op: &str) -> OperatorExpression {
    OperatorExpression {
        property,
        operator: Operator {
            name: op.into(),
            value: None,
            label_value: None,
        },
    }
}

pub fn reduce(property: Property, function: &str) -> ReduceExpression {
    ReduceExpression {
        property,
        reduce: Property::new(function, PropertyType::Function),
        parameters: Vec::new(),
    }
}

pub fn reduce_with(
    property: Property,
    function: &str,
    parameters: Vec<FunctionParameterExpression>,
) -> ReduceExpression {
    ReduceExpression {
        parameters,
        ..reduce(property, function)
    }
}

pub fn param(name: &str, value: impl Into<ScalarValue>, field_type: PropertyType) -> FunctionParameterExpression {
    FunctionParameterExpression {
        name: name.into(),
        value: value.into(),
        field_type,
    }
}

pub fn group(property: Property) -> GroupByExpression {
    GroupByExpression {
        property,
        interval: None,
    }
}

pub fn bin(property: Property, interval: &str) -> GroupByExpression {
    GroupByExpression {
        property,
        interval: Some(Property::new(interval, PropertyType::Interval)),
    }
}

pub fn and<T>(expressions: Vec<T>) -> ArrayExpression<T> {
    ArrayExpression::and(expressions)
}

pub fn or<T>(expressions: Vec<T>) -> ArrayExpression<T> {
    ArrayExpression::or(expressions)
}
