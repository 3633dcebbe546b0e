//! Query expression intermediate representation.
//!
//! A query built in the visual editor is a tree of typed nodes:
//!
//! ```text
//! QueryExpression
//! ├── from:    property            (table / view / function)
//! ├── where:   and ─┬─ or ── operator, operator, ...
//! │                 └─ or ── operator
//! ├── reduce:  and ── reduce(property, fn, parameters...)
//! └── groupBy: and ── groupBy(property, interval?)
//! ```
//!
//! The tree is replaced subtree-by-subtree by its editor; nothing in here
//! mutates shared state.

pub mod builders;
mod types;

pub use types::{
    ArrayExpression, ArrayItem, ArrayKind, Expression, ExpressionError, FunctionParameterExpression,
    GroupByExpression, Operator, OperatorExpression, OperatorValue, OrGroup, PropertyExpression,
    QueryExpression, ReduceExpression, ScalarValue, WhereExpression,
};
